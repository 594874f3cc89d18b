//! Newline-delimited JSON: whole-file reads, full-rewrite writes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::error::BrainError;

pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, BrainError> {
    let content = fs::read_to_string(path)?;
    parse_jsonl(&content, path)
}

/// Blank lines are skipped; a malformed line fails with its 1-based number.
pub fn parse_jsonl<T: DeserializeOwned>(content: &str, path: &Path) -> Result<Vec<T>, BrainError> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(line).map_err(|err| {
            BrainError::schema(format!("{} line {}: {}", path.display(), idx + 1, err))
        })?;
        out.push(value);
    }
    Ok(out)
}

/// Rewrites the whole file from the sequence; callers never append. A
/// trailing newline is emitted only when the sequence is non-empty.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<(), BrainError> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        lines.push(serde_json::to_string(item)?);
    }
    let mut content = lines.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: String,
        n: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: "a".into(),
                n: 1,
            },
            Row {
                id: "b".into(),
                n: 2,
            },
        ]
    }

    #[test]
    fn write_read_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rows.jsonl");
        write_jsonl(&path, &rows()).unwrap();
        let back: Vec<Row> = read_jsonl(&path).unwrap();
        assert_eq!(back, rows());
    }

    #[test]
    fn trailing_newline_only_when_non_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rows.jsonl");
        write_jsonl::<Row>(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        write_jsonl(&path, &rows()).unwrap();
        assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let path = Path::new("rows.jsonl");
        let parsed: Vec<Row> =
            parse_jsonl("{\"id\":\"a\",\"n\":1}\n\n{\"id\":\"b\",\"n\":2}\n", path).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn parse_error_names_the_line() {
        let path = Path::new("rows.jsonl");
        let err = parse_jsonl::<Row>("{\"id\":\"a\",\"n\":1}\nnot-json\n", path).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }
}
