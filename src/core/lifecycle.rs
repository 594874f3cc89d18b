//! Lifecycle gates: pure predicates over records.
//!
//! Gates never mutate state and never raise; they return reasons the caller
//! surfaces (and acts on) before submitting an intent to the write engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::schemas::{Record, RecordStatus, RecordType, SourceType};
use crate::core::time;

/// Allowed transitions: `active -> deprecated`, `active -> archived`, and
/// the restore path `deprecated -> active`. Nothing leaves `archived`.
pub fn check_transition(from: RecordStatus, to: RecordStatus) -> Result<(), String> {
    use RecordStatus::*;
    match (from, to) {
        (Active, Deprecated) | (Active, Archived) | (Deprecated, Active) => Ok(()),
        (Archived, other) => Err(format!(
            "no transitions out of archived (requested archived -> {})",
            other
        )),
        (a, b) => Err(format!("transition {} -> {} is not allowed", a, b)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGate {
    pub allowed: bool,
    pub failures: Vec<String>,
}

/// The three-gate delete precondition check. Every unmet precondition is
/// reported individually so the caller can show all of them at once.
pub fn check_delete(
    record: &Record,
    current_session_start: DateTime<Utc>,
    user_confirmed: bool,
) -> DeleteGate {
    let mut failures = Vec::new();

    if record.status != RecordStatus::Deprecated {
        failures.push(format!(
            "record is not deprecated (status: {})",
            record.status
        ));
    }

    match time::parse_iso(&record.updated_at) {
        Some(updated) if updated < current_session_start => {}
        Some(_) => failures.push(
            "record was touched in the current session; deprecation and deletion \
             must happen in different sessions"
                .to_string(),
        ),
        None => failures.push(format!(
            "updatedAt '{}' is not a parseable timestamp",
            record.updated_at
        )),
    }

    if record.replaced_by.is_none() {
        failures.push("replacedBy is not set".to_string());
    }

    if !user_confirmed {
        failures.push("user confirmation missing".to_string());
    }

    DeleteGate {
        allowed: failures.is_empty(),
        failures,
    }
}

/// Promotion to an SSOT type requires user-confirmed provenance.
pub fn check_promotion(target: RecordType, source_type: SourceType) -> Result<(), String> {
    if target.is_ssot() && source_type != SourceType::UserConfirmed {
        Err(format!(
            "promotion to {} requires user_confirmed provenance (found {})",
            target, source_type
        ))
    } else {
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contaminant {
    pub record_id: String,
    pub record_type: RecordType,
    pub source_type: SourceType,
}

/// Flags active SSOT records with inferred or candidate provenance. Advisory
/// only; the recommended remediation is to deprecate the offenders.
pub fn find_contamination(records: &[Record]) -> Vec<Contaminant> {
    records
        .iter()
        .filter(|record| {
            record.status == RecordStatus::Active
                && record.record_type.is_ssot()
                && matches!(
                    record.source_type,
                    SourceType::Inference | SourceType::Candidate
                )
        })
        .map(|record| Contaminant {
            record_id: record.record_id.clone(),
            record_type: record.record_type,
            source_type: record.source_type,
        })
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackReference {
    pub active_id: String,
    pub deprecated_id: String,
    pub field: &'static str,
}

/// Finds active records still referring to deprecated ones: a deprecated
/// record's id appearing inside an active record's `sourceRef` or `summary`.
pub fn find_back_references(records: &[Record]) -> Vec<BackReference> {
    let deprecated: Vec<&Record> = records
        .iter()
        .filter(|record| record.status == RecordStatus::Deprecated)
        .collect();
    let mut pairs = Vec::new();
    for active in records
        .iter()
        .filter(|record| record.status == RecordStatus::Active)
    {
        for dep in &deprecated {
            if active.source_ref.contains(&dep.record_id) {
                pairs.push(BackReference {
                    active_id: active.record_id.clone(),
                    deprecated_id: dep.record_id.clone(),
                    field: "sourceRef",
                });
            } else if active.summary.contains(&dep.record_id) {
                pairs.push(BackReference {
                    active_id: active.record_id.clone(),
                    deprecated_id: dep.record_id.clone(),
                    field: "summary",
                });
            }
        }
    }
    pairs
}

/// Folder auto-creation is permitted only for topic documents.
pub fn folder_auto_create_allowed(source_ref: &str) -> bool {
    source_ref.starts_with("30_topics/")
}
