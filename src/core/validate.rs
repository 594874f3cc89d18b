//! Store validation: committed and staged (`.tmp`) modes.
//!
//! The same checks back two surfaces: `brain validate` inspects the
//! committed artifacts, and the write engine's pre-commit step re-reads the
//! staged `.tmp` variants before any rename happens. Every finding carries a
//! specific message.
//!
//! # Validation categories
//!
//! - Required files present (policy, manifest, tags, folder registry, records)
//! - Per-record field rules, id uniqueness, deprecation consistency, tag axes
//! - Growth signal when the record count passes the advisory ceiling
//! - Manifest entries resolve on disk with matching hashes (error when
//!   staged, "manual-edit suspected" warning when committed)
//! - Digest is the exact projection of the records sequence
//! - Residue scan for leftover `.tmp`/`.bak` files (committed mode)
//! - `--full`: contamination and back-reference detectors

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::core::error::BrainError;
use crate::core::hash;
use crate::core::intent;
use crate::core::jsonl;
use crate::core::lifecycle;
use crate::core::schemas::{
    render_digest, Manifest, Record, RecordStatus, OBSOLETE_SENTINEL, RECORD_GROWTH_THRESHOLD,
};
use crate::core::store::{with_suffix, Store, BAK_SUFFIX, TMP_SUFFIX};
use crate::core::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateMode {
    Committed,
    Tmp,
}

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub mode: ValidateMode,
    pub full: bool,
    /// Root-relative path of a document staged as `<path>.tmp`; manifest
    /// resolution redirects to the staged bytes for this entry.
    pub staged_doc: Option<String>,
}

impl ValidateOptions {
    pub fn committed() -> Self {
        ValidateOptions {
            mode: ValidateMode::Committed,
            full: false,
            staged_doc: None,
        }
    }

    pub fn full() -> Self {
        ValidateOptions {
            mode: ValidateMode::Committed,
            full: true,
            staged_doc: None,
        }
    }

    pub fn tmp(staged_doc: Option<String>) -> Self {
        ValidateOptions {
            mode: ValidateMode::Tmp,
            full: false,
            staged_doc,
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate_store(
    store: &Store,
    opts: &ValidateOptions,
) -> Result<ValidationReport, BrainError> {
    let mut report = ValidationReport::default();

    check_required_files(store, opts, &mut report);

    let records = load_records(store, opts, &mut report);
    for record in &records {
        report.errors.extend(validate_record(record));
    }
    check_uniqueness(&records, &mut report);

    if records.len() > RECORD_GROWTH_THRESHOLD {
        report.warnings.push(format!(
            "record count {} exceeds {} (growth signal; consider archiving)",
            records.len(),
            RECORD_GROWTH_THRESHOLD
        ));
    }

    check_manifest(store, opts, &records, &mut report);
    check_digest_projection(store, opts, &records, &mut report);

    if opts.mode == ValidateMode::Committed {
        scan_residue(store, &mut report);
    }

    if opts.full {
        run_detectors(&records, &mut report);
    }

    Ok(report)
}

/// Per-field rules for one record. Shared between the two modes.
pub fn validate_record(record: &Record) -> Vec<String> {
    let mut errors = Vec::new();
    let id = &record.record_id;

    let id_re = Regex::new(r"^rec_(proj|agent|user|topic)_[a-z0-9_-]+_\d{8}_\d{4}$").unwrap();
    if !id_re.is_match(id) {
        errors.push(format!(
            "{}: recordId does not match rec_{{scope}}_{{scopeId}}_{{YYYYMMDD}}_{{NNNN}}",
            id
        ));
    } else {
        let expected_prefix = format!("rec_{}_", record.scope_type.abbrev());
        if !id.starts_with(&expected_prefix) {
            errors.push(format!(
                "{}: recordId prefix does not match scopeType {}",
                id, record.scope_type
            ));
        }
    }

    if !intent::is_valid_slug(&record.scope_id) {
        errors.push(format!("{}: scopeId '{}' is not a slug", id, record.scope_id));
    }
    if record.title.trim().is_empty() {
        errors.push(format!("{}: title is empty", id));
    }
    if record.summary.trim().is_empty() {
        errors.push(format!("{}: summary is empty", id));
    }
    for tag in &record.tags {
        if !intent::is_valid_tag(tag) {
            errors.push(format!(
                "{}: tag '{}' is outside the domain/intent axes",
                id, tag
            ));
        }
    }

    if !record.source_ref.is_empty() {
        if !intent::is_relative_doc_path(&record.source_ref) {
            errors.push(format!(
                "{}: sourceRef '{}' is not a root-relative path",
                id, record.source_ref
            ));
        }
        if !hash::is_hash_shaped(&record.content_hash) {
            errors.push(format!(
                "{}: contentHash '{}' is not sha256-shaped",
                id, record.content_hash
            ));
        }
    } else if !record.content_hash.is_empty() && !hash::is_hash_shaped(&record.content_hash) {
        errors.push(format!(
            "{}: contentHash '{}' is not sha256-shaped",
            id, record.content_hash
        ));
    }

    if record.status == RecordStatus::Deprecated {
        match record.replaced_by.as_deref() {
            None => errors.push(format!("{}: deprecated record must set replacedBy", id)),
            Some("") => errors.push(format!("{}: replacedBy is empty", id)),
            Some(OBSOLETE_SENTINEL) => {
                if record
                    .deprecation_reason
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or("")
                    .is_empty()
                {
                    errors.push(format!(
                        "{}: replacedBy 'obsolete' requires a deprecationReason",
                        id
                    ));
                }
            }
            Some(_) => {}
        }
    }

    if time::parse_iso(&record.updated_at).is_none() {
        errors.push(format!(
            "{}: updatedAt '{}' is not an ISO-8601 timestamp",
            id, record.updated_at
        ));
    }

    errors
}

fn check_required_files(store: &Store, opts: &ValidateOptions, report: &mut ValidationReport) {
    let mut required: Vec<(String, PathBuf)> = vec![
        ("99_policy/brainPolicy.md".to_string(), store.policy_path()),
        ("90_index/tags.json".to_string(), store.tags_path()),
        (
            "90_index/folderRegistry.json".to_string(),
            store.folder_registry_path(),
        ),
    ];
    match opts.mode {
        ValidateMode::Committed => {
            required.push(("90_index/manifest.json".to_string(), store.manifest_path()));
            required.push(("90_index/records.jsonl".to_string(), store.records_path()));
        }
        ValidateMode::Tmp => {
            for path in [
                store.records_path(),
                store.manifest_path(),
                store.digest_path(),
            ] {
                let tmp = with_suffix(&path, TMP_SUFFIX);
                required.push((tmp.to_string_lossy().to_string(), tmp));
            }
        }
    }
    for (label, path) in required {
        if !path.exists() {
            report.errors.push(format!("required file missing: {}", label));
        }
    }
}

fn load_records(store: &Store, opts: &ValidateOptions, report: &mut ValidationReport) -> Vec<Record> {
    let path = match opts.mode {
        ValidateMode::Committed => store.records_path(),
        ValidateMode::Tmp => with_suffix(&store.records_path(), TMP_SUFFIX),
    };
    if !path.exists() {
        return Vec::new();
    }
    match jsonl::read_jsonl(&path) {
        Ok(records) => records,
        Err(err) => {
            report.errors.push(err.to_string());
            Vec::new()
        }
    }
}

fn check_uniqueness(records: &[Record], report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for record in records {
        if !seen.insert(record.record_id.as_str()) {
            report
                .errors
                .push(format!("duplicate recordId: {}", record.record_id));
        }
    }
}

fn check_manifest(
    store: &Store,
    opts: &ValidateOptions,
    records: &[Record],
    report: &mut ValidationReport,
) {
    let path = match opts.mode {
        ValidateMode::Committed => store.manifest_path(),
        ValidateMode::Tmp => with_suffix(&store.manifest_path(), TMP_SUFFIX),
    };
    if !path.exists() {
        return;
    }
    let manifest: Manifest = match fs::read_to_string(&path)
        .map_err(BrainError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(BrainError::from))
    {
        Ok(manifest) => manifest,
        Err(err) => {
            report
                .errors
                .push(format!("manifest unreadable: {}", err));
            return;
        }
    };

    for entry in &manifest.files {
        let on_disk = match (&opts.staged_doc, opts.mode) {
            (Some(staged), ValidateMode::Tmp) if *staged == entry.path => {
                with_suffix(&store.resolve(&entry.path), TMP_SUFFIX)
            }
            _ => store.resolve(&entry.path),
        };
        if !on_disk.exists() {
            match opts.mode {
                ValidateMode::Tmp => report
                    .errors
                    .push(format!("manifest entry missing on disk: {}", entry.path)),
                ValidateMode::Committed => report.warnings.push(format!(
                    "manifest entry missing on disk: {} (manual-edit suspected)",
                    entry.path
                )),
            }
            continue;
        }
        match hash::hash_file(&on_disk) {
            Ok(actual) if actual == entry.hash => {}
            Ok(actual) => match opts.mode {
                ValidateMode::Tmp => report.errors.push(format!(
                    "manifest hash mismatch for {}: recorded {}, actual {}",
                    entry.path, entry.hash, actual
                )),
                ValidateMode::Committed => report.warnings.push(format!(
                    "manifest hash mismatch for {} (manual-edit suspected)",
                    entry.path
                )),
            },
            Err(err) => report
                .errors
                .push(format!("cannot hash {}: {}", entry.path, err)),
        }
    }

    // The record <-> manifest binding: every indexed document's manifest hash
    // must equal the record's contentHash.
    for record in records {
        if record.source_ref.is_empty() {
            continue;
        }
        match manifest.entry(&record.source_ref) {
            None => {
                let message = format!(
                    "{}: no manifest entry for sourceRef {}",
                    record.record_id, record.source_ref
                );
                match opts.mode {
                    ValidateMode::Tmp => report.errors.push(message),
                    ValidateMode::Committed => report.warnings.push(message),
                }
            }
            Some(entry) if entry.hash != record.content_hash => {
                let message = format!(
                    "{}: manifest hash for {} differs from contentHash",
                    record.record_id, record.source_ref
                );
                match opts.mode {
                    ValidateMode::Tmp => report.errors.push(message),
                    ValidateMode::Committed => report.warnings.push(message),
                }
            }
            Some(_) => {}
        }
    }
}

fn check_digest_projection(
    store: &Store,
    opts: &ValidateOptions,
    records: &[Record],
    report: &mut ValidationReport,
) {
    let path = match opts.mode {
        ValidateMode::Committed => store.digest_path(),
        ValidateMode::Tmp => with_suffix(&store.digest_path(), TMP_SUFFIX),
    };
    if !path.exists() {
        return;
    }
    let on_disk = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            report.errors.push(format!("digest unreadable: {}", err));
            return;
        }
    };
    if on_disk != render_digest(records) {
        let message = "digest does not match the records projection".to_string();
        match opts.mode {
            ValidateMode::Tmp => report.errors.push(message),
            ValidateMode::Committed => report
                .warnings
                .push(format!("{} (manual-edit suspected)", message)),
        }
    }
}

fn scan_residue(store: &Store, report: &mut ValidationReport) {
    let Ok(entries) = fs::read_dir(store.index_dir()) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(TMP_SUFFIX) || name.ends_with(BAK_SUFFIX) {
            report
                .warnings
                .push(format!("residue in 90_index: {}", name));
        }
    }
}

fn run_detectors(records: &[Record], report: &mut ValidationReport) {
    for offender in lifecycle::find_contamination(records) {
        report.warnings.push(format!(
            "contamination: {} is {} with {} provenance; deprecate it",
            offender.record_id, offender.record_type, offender.source_type
        ));
    }
    for pair in lifecycle::find_back_references(records) {
        report.warnings.push(format!(
            "active record {} references deprecated record {} in {}",
            pair.active_id, pair.deprecated_id, pair.field
        ));
    }
}
