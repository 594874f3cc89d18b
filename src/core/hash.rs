//! SHA-256 helpers shared by the write path, validator, and boot drift check.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::core::error::BrainError;

pub const HASH_PREFIX: &str = "sha256:";

pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}{:x}", HASH_PREFIX, hasher.finalize())
}

/// Hash of a string's UTF-8 bytes. Agrees with [`hash_file`] for identical
/// content.
pub fn hash_text(text: &str) -> String {
    hash_bytes(text.as_bytes())
}

pub fn hash_file(path: &Path) -> Result<String, BrainError> {
    let bytes = fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

/// Shape check for stored hash values: `sha256:` + 64 lowercase hex digits.
pub fn is_hash_shaped(value: &str) -> bool {
    match value.strip_prefix(HASH_PREFIX) {
        Some(hex) => hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
        None => false,
    }
}
