//! Console rendering helpers for the text output format.

use colored::Colorize;

pub fn heading(title: &str) {
    println!();
    println!("  {}", title.bold());
}

pub fn pass(message: &str) {
    println!("    {} {}", "●".bright_green(), message.bright_white());
}

pub fn warn(message: &str) {
    println!("    {} {}", "●".bright_yellow(), message.bright_white());
}

pub fn fail(message: &str) {
    eprintln!("    {} {}", "●".bright_red(), message.bright_white());
}

pub fn info(message: &str) {
    println!("    {} {}", "ℹ".bright_cyan(), message.bright_black());
}

pub fn print_summary(errors: usize, warnings: usize) {
    println!();
    if errors == 0 {
        println!(
            "  {} {} error(s), {} warning(s)",
            "✓".bright_green(),
            errors,
            warnings
        );
    } else {
        eprintln!(
            "  {} {} error(s), {} warning(s)",
            "✗".bright_red(),
            errors,
            warnings
        );
    }
}
