//! Boot loader: policy and manifest load, drift check, scope declaration.
//!
//! Boot never writes. Drift is collected and reported for the caller to
//! reconcile; only a missing policy or an unreadable manifest is fatal.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::core::error::BrainError;
use crate::core::hash;
use crate::core::jsonl;
use crate::core::lifecycle;
use crate::core::schemas::{Manifest, Record, ScopeType};
use crate::core::store::{Store, POLICY_PATH};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BootRequest {
    pub scope_type: Option<ScopeType>,
    pub scope_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftMismatch {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootReport {
    pub success: bool,
    pub policy: String,
    pub mismatches: Vec<DriftMismatch>,
    pub scope_type: Option<ScopeType>,
    pub scope_id: Option<String>,
    pub user_profile: Option<String>,
    pub advisories: Vec<String>,
}

pub fn boot(store: &Store, request: &BootRequest) -> Result<BootReport, BrainError> {
    // Step 1: policy. Boot cannot proceed without it.
    let policy_path = store.policy_path();
    if !policy_path.exists() {
        return Err(BrainError::NotFound(format!(
            "{} is missing; run init before booting",
            POLICY_PATH
        )));
    }
    let policy = fs::read_to_string(&policy_path)?;

    // Step 2: manifest. Unreadable or malformed is fatal.
    let manifest_content = fs::read_to_string(store.manifest_path()).map_err(|err| {
        BrainError::NotFound(format!("90_index/manifest.json unreadable: {}", err))
    })?;
    let manifest: Manifest = serde_json::from_str(&manifest_content)
        .map_err(|err| BrainError::schema(format!("90_index/manifest.json malformed: {}", err)))?;

    // Step 3: drift. Every mismatch is collected; none is fatal.
    let mut mismatches = Vec::new();
    for entry in &manifest.files {
        let on_disk = store.resolve(&entry.path);
        if !on_disk.exists() {
            mismatches.push(DriftMismatch {
                path: entry.path.clone(),
                reason: "missing".to_string(),
            });
            continue;
        }
        let actual = hash::hash_file(&on_disk)?;
        if actual != entry.hash {
            mismatches.push(DriftMismatch {
                path: entry.path.clone(),
                reason: "hash mismatch".to_string(),
            });
        }
    }

    // Step 4: scope. Caller-provided scope is echoed verbatim; otherwise the
    // optional user profile is loaded instead.
    let mut user_profile = None;
    if request.scope_type.is_none() && request.scope_id.is_none() {
        let profile_path = store.user_profile_path();
        if profile_path.exists() {
            user_profile = Some(fs::read_to_string(&profile_path)?);
        }
    }

    let mut advisories = Vec::new();
    let records_path = store.records_path();
    if records_path.exists() {
        match jsonl::read_jsonl::<Record>(&records_path) {
            Ok(records) => {
                for offender in lifecycle::find_contamination(&records) {
                    advisories.push(format!(
                        "contamination: {} is {} with {} provenance; deprecate it",
                        offender.record_id, offender.record_type, offender.source_type
                    ));
                }
            }
            Err(err) => advisories.push(format!("records.jsonl unreadable: {}", err)),
        }
    }

    Ok(BootReport {
        success: true,
        policy,
        mismatches,
        scope_type: request.scope_type,
        scope_id: request.scope_id.clone(),
        user_profile,
        advisories,
    })
}
