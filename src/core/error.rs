//! Error types for Brain operations.
//!
//! This module defines the canonical error type used throughout Brain.
//! All subsystems return `Result<T, BrainError>` for error handling.
//!
//! # For AI Agents
//!
//! - **Every engine failure triggers rollback**: a `success=false` write
//!   response means the store was restored from backups
//! - **`Residue` is actionable**: remove the stale `.tmp` files (or let
//!   `brain validate` list them) before retrying the write
//! - **Error propagation**: use the `?` operator; io and JSON errors
//!   auto-convert via `From` traits

use std::io;
use thiserror::Error;

/// Canonical error type for all Brain operations.
///
/// The variants mirror the store's error kinds one-to-one, so the
/// request/response adapter can report a stable `kind` string alongside the
/// human-readable message.
#[derive(Error, Debug)]
pub enum BrainError {
    /// Malformed write intent; rejected before any file was touched.
    #[error("invalid intent: {}", .reasons.join("; "))]
    IntentInvalid { reasons: Vec<String> },

    /// Leftover `.tmp` files from an unfinished transaction block the write.
    #[error("stale transaction residue: {0}")]
    Residue(String),

    /// Folder auto-creation outside the permitted subtree.
    #[error("scope violation: {0}")]
    ScopeViolation(String),

    /// Unknown record id, or a required file is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record or staged artifact failed schema validation.
    #[error("schema violation: {}", .reasons.join("; "))]
    SchemaViolation { reasons: Vec<String> },

    /// I/O error (auto-converts from `std::io::Error`).
    #[error("I/O fault: {0}")]
    IoFault(#[from] io::Error),

    /// JSON (de)serialization error (auto-converts from `serde_json::Error`).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A lifecycle gate rejected the request. Raised by the gates and the
    /// CLI that runs them, never by the write engine itself.
    #[error("lifecycle denied: {}", .reasons.join("; "))]
    LifecycleDenied { reasons: Vec<String> },

    /// CLI-level failure wrapper used to set the exit code after a report
    /// has already been rendered.
    #[error("{0}")]
    OperationFailed(String),
}

impl BrainError {
    /// Stable kind string for the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            BrainError::IntentInvalid { .. } => "IntentInvalid",
            BrainError::Residue(_) => "Residue",
            BrainError::ScopeViolation(_) => "ScopeViolation",
            BrainError::NotFound(_) => "NotFound",
            BrainError::SchemaViolation { .. } => "SchemaViolation",
            BrainError::IoFault(_) => "IOFault",
            BrainError::Json(_) => "SchemaViolation",
            BrainError::LifecycleDenied { .. } => "LifecycleDenied",
            BrainError::OperationFailed(_) => "OperationFailed",
        }
    }

    /// Per-field reasons carried by the list-bearing variants; other
    /// variants report their single message.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            BrainError::IntentInvalid { reasons }
            | BrainError::SchemaViolation { reasons }
            | BrainError::LifecycleDenied { reasons } => reasons.clone(),
            other => vec![other.to_string()],
        }
    }

    pub fn schema(reason: impl Into<String>) -> Self {
        BrainError::SchemaViolation {
            reasons: vec![reason.into()],
        }
    }
}
