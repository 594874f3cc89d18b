fn main() {
    if let Err(err) = brain::run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
