//! The Brain Write Transaction (BWT) engine.
//!
//! Every mutation of the store flows through this nine-step protocol:
//!
//! 1. Intent validation (no files touched on failure)
//! 2. Residue check: leftover `.tmp` in the index folder blocks the write
//! 3. Backups: every file the intent may touch is copied to `<file>.bak`
//! 4. Directory preparation (auto-create only under `30_topics/`)
//! 5. Document staging to `<sourceRef>.tmp`
//! 6. Records staging to `records.jsonl.tmp`
//! 7. Manifest staging to `manifest.json.tmp`
//! 8. Digest staging to `records_digest.txt.tmp`
//! 9. Pre-commit validation of the staged artifacts
//!
//! Commit renames the staged files onto their final names in fixed order
//! (document, records, manifest, digest); any failure un-renames what was
//! already committed and falls into rollback. Rollback restores the `.bak`
//! copies and never raises.
//!
//! # For AI Agents
//!
//! - **One transaction at a time**: the residue check is the only overlap
//!   detector; this engine does not serialize concurrent writers
//! - **`success=false` means restored**: on any failure the store is rolled
//!   back to its pre-transaction bytes
//! - **Run the lifecycle gates first**: the engine does not re-check the
//!   delete gate or the transition table

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::core::error::BrainError;
use crate::core::hash;
use crate::core::ids;
use crate::core::intent::{self, WriteIntent};
use crate::core::jsonl;
use crate::core::lifecycle;
use crate::core::schemas::{
    category_for_path, render_digest, Manifest, ManifestEntry, Record, RecordStatus,
};
use crate::core::store::{with_suffix, Store, BAK_SUFFIX, TMP_SUFFIX};
use crate::core::time;
use crate::core::validate::{self, ValidateOptions};

/// Response envelope for one write transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    pub success: bool,
    pub record_id: Option<String>,
    pub report: WriteReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReport {
    pub txn_id: String,
    pub step: Option<u8>,
    pub kind: Option<String>,
    pub message: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub fn execute(store: &Store, intent: &WriteIntent) -> WriteResponse {
    execute_at(store, intent, time::now_utc())
}

/// Clock-injected variant; tests pin `now` to make minted ids and
/// timestamps deterministic.
pub fn execute_at(store: &Store, intent: &WriteIntent, now: DateTime<Utc>) -> WriteResponse {
    let mut txn = Txn::new(store, now);
    match txn.run(intent) {
        Ok(record_id) => {
            txn.cleanup_backups();
            WriteResponse {
                success: true,
                record_id: Some(record_id),
                report: WriteReport {
                    txn_id: txn.txn_id,
                    step: None,
                    kind: None,
                    message: format!("{} committed", intent.action()),
                    errors: Vec::new(),
                    warnings: txn.warnings,
                },
            }
        }
        Err(err) => {
            txn.rollback();
            WriteResponse {
                success: false,
                record_id: None,
                report: WriteReport {
                    txn_id: txn.txn_id,
                    step: txn.step,
                    kind: Some(err.kind().to_string()),
                    message: err.to_string(),
                    errors: err.reasons(),
                    warnings: txn.warnings,
                },
            }
        }
    }
}

struct StagedDoc {
    rel: String,
    content: String,
    hash: String,
}

struct Txn<'a> {
    store: &'a Store,
    now: DateTime<Utc>,
    txn_id: String,
    step: Option<u8>,
    /// (original, bak) pairs created in step 3.
    backups: Vec<(PathBuf, PathBuf)>,
    /// (tmp, destination) pairs, in commit order.
    staged: Vec<(PathBuf, PathBuf)>,
    warnings: Vec<String>,
}

impl<'a> Txn<'a> {
    fn new(store: &'a Store, now: DateTime<Utc>) -> Self {
        Txn {
            store,
            now,
            txn_id: time::new_txn_id(),
            step: None,
            backups: Vec::new(),
            staged: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn run(&mut self, intent: &WriteIntent) -> Result<String, BrainError> {
        // Step 1: intent validation.
        self.step = Some(1);
        let violations = intent::validate_intent(intent);
        if !violations.is_empty() {
            return Err(BrainError::IntentInvalid {
                reasons: violations,
            });
        }

        // Step 2: residue check.
        self.step = Some(2);
        self.check_residue()?;

        let records = self.load_records()?;

        // Step 3: backups. Resolving the target record for mutating actions
        // happens here, since the document to back up comes from it.
        self.step = Some(3);
        let existing = self.resolve_existing(intent, &records)?;
        self.back_up(intent, existing.as_ref())?;

        // Step 4: directory preparation.
        self.step = Some(4);
        if let WriteIntent::Create(create) = intent {
            self.prepare_directory(&create.source_ref, create.allow_new_folder)?;
        }

        // Step 5: document staging.
        self.step = Some(5);
        let staged_doc = self.stage_document(intent, existing.as_ref())?;

        // Step 6: records staging.
        self.step = Some(6);
        let (staged_records, record_id) =
            self.stage_records(intent, records, staged_doc.as_ref())?;

        // Step 7: manifest staging.
        self.step = Some(7);
        self.stage_manifest(intent, staged_doc.as_ref(), existing.as_ref())?;

        // Step 8: digest staging.
        self.step = Some(8);
        self.stage_digest(&staged_records)?;

        // Step 9: pre-commit validation of the staged artifacts.
        self.step = Some(9);
        self.validate_staged(staged_doc.as_ref().map(|doc| doc.rel.clone()))?;

        self.commit(intent, existing.as_ref())?;
        Ok(record_id)
    }

    fn check_residue(&self) -> Result<(), BrainError> {
        let index_dir = self.store.index_dir();
        if !index_dir.is_dir() {
            return Err(BrainError::NotFound(
                "90_index is missing; run init first".to_string(),
            ));
        }
        let mut residue = Vec::new();
        for entry in fs::read_dir(&index_dir)? {
            let name = entry?.file_name().to_string_lossy().to_string();
            if name.ends_with(TMP_SUFFIX) {
                residue.push(name);
            }
        }
        if residue.is_empty() {
            Ok(())
        } else {
            residue.sort();
            Err(BrainError::Residue(format!(
                "a prior transaction did not finish; remove {} from 90_index before writing",
                residue.join(", ")
            )))
        }
    }

    fn load_records(&self) -> Result<Vec<Record>, BrainError> {
        let path = self.store.records_path();
        if !path.exists() {
            return Err(BrainError::NotFound(
                "90_index/records.jsonl is missing; run init first".to_string(),
            ));
        }
        jsonl::read_jsonl(&path)
    }

    fn resolve_existing(
        &self,
        intent: &WriteIntent,
        records: &[Record],
    ) -> Result<Option<Record>, BrainError> {
        let record_id = match intent {
            WriteIntent::Create(_) => return Ok(None),
            WriteIntent::Update(update) => &update.record_id,
            WriteIntent::Deprecate(deprecate) => &deprecate.record_id,
            WriteIntent::Delete(delete) => &delete.record_id,
        };
        records
            .iter()
            .find(|record| &record.record_id == record_id)
            .cloned()
            .map(Some)
            .ok_or_else(|| BrainError::NotFound(format!("unknown recordId: {}", record_id)))
    }

    /// Copies every file this intent may touch to `<file>.bak`: the three
    /// index artifacts always, plus the target document on updates and
    /// deletes.
    fn back_up(
        &mut self,
        intent: &WriteIntent,
        existing: Option<&Record>,
    ) -> Result<(), BrainError> {
        let mut candidates = vec![
            self.store.records_path(),
            self.store.manifest_path(),
            self.store.digest_path(),
        ];
        let doc_touched = matches!(intent, WriteIntent::Update(_) | WriteIntent::Delete(_));
        if doc_touched {
            if let Some(record) = existing {
                if !record.source_ref.is_empty() {
                    candidates.push(self.store.resolve(&record.source_ref));
                }
            }
        }
        for original in candidates {
            if original.exists() {
                let bak = with_suffix(&original, BAK_SUFFIX);
                fs::copy(&original, &bak)?;
                self.backups.push((original, bak));
            }
        }
        Ok(())
    }

    fn prepare_directory(&self, source_ref: &str, allow_new_folder: bool) -> Result<(), BrainError> {
        let target = self.store.resolve(source_ref);
        let Some(parent) = target.parent() else {
            return Ok(());
        };
        if parent.is_dir() {
            return Ok(());
        }
        if lifecycle::folder_auto_create_allowed(source_ref) || allow_new_folder {
            fs::create_dir_all(parent)?;
            Ok(())
        } else {
            Err(BrainError::ScopeViolation(format!(
                "'{}' needs a folder that does not exist; only 30_topics/ is auto-created \
                 (pass allowNewFolder to override)",
                source_ref
            )))
        }
    }

    fn stage_document(
        &mut self,
        intent: &WriteIntent,
        existing: Option<&Record>,
    ) -> Result<Option<StagedDoc>, BrainError> {
        let (rel, content) = match intent {
            WriteIntent::Create(create) => (create.source_ref.clone(), create.content.clone()),
            WriteIntent::Update(update) => match &update.content {
                Some(content) => {
                    let record = existing.expect("update target resolved in step 3");
                    if record.source_ref.is_empty() {
                        return Err(BrainError::IntentInvalid {
                            reasons: vec![format!(
                                "{} has no sourceRef; there is no document to rewrite",
                                record.record_id
                            )],
                        });
                    }
                    (record.source_ref.clone(), content.clone())
                }
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        let dest = self.store.resolve(&rel);
        let tmp = with_suffix(&dest, TMP_SUFFIX);
        fs::write(&tmp, &content)?;
        self.staged.push((tmp, dest));

        // The hash is computed once, here, from the same bytes written to
        // the tmp file, and reused by the records and manifest stages.
        let hash = hash::hash_text(&content);
        Ok(Some(StagedDoc { rel, content, hash }))
    }

    fn stage_records(
        &mut self,
        intent: &WriteIntent,
        mut records: Vec<Record>,
        staged_doc: Option<&StagedDoc>,
    ) -> Result<(Vec<Record>, String), BrainError> {
        let updated_at = time::to_iso_millis(self.now);
        let record_id = match intent {
            WriteIntent::Create(create) => {
                let doc = staged_doc.expect("create always stages a document");
                let record_id = ids::mint_record_id(
                    create.record.scope_type,
                    &create.record.scope_id,
                    &records,
                    self.now,
                );
                records.push(Record {
                    record_id: record_id.clone(),
                    scope_type: create.record.scope_type,
                    scope_id: create.record.scope_id.clone(),
                    record_type: create.record.record_type,
                    title: create.record.title.clone(),
                    summary: create.record.summary.clone(),
                    tags: create.record.tags.clone(),
                    source_type: create.record.source_type,
                    source_ref: create.source_ref.clone(),
                    status: RecordStatus::Active,
                    replaced_by: None,
                    deprecation_reason: None,
                    updated_at,
                    content_hash: doc.hash.clone(),
                });
                record_id
            }
            WriteIntent::Update(update) => {
                let record = find_mut(&mut records, &update.record_id)?;
                if let Some(title) = &update.patch.title {
                    record.title = title.clone();
                }
                if let Some(summary) = &update.patch.summary {
                    record.summary = summary.clone();
                }
                if let Some(tags) = &update.patch.tags {
                    record.tags = tags.clone();
                }
                if let Some(record_type) = update.patch.record_type {
                    record.record_type = record_type;
                }
                if let Some(source_type) = update.patch.source_type {
                    record.source_type = source_type;
                }
                if let Some(doc) = staged_doc {
                    record.content_hash = doc.hash.clone();
                }
                record.updated_at = updated_at;
                record.record_id.clone()
            }
            WriteIntent::Deprecate(deprecate) => {
                let record = find_mut(&mut records, &deprecate.record_id)?;
                record.status = RecordStatus::Deprecated;
                record.replaced_by = Some(deprecate.replaced_by.clone());
                record.deprecation_reason = deprecate.deprecation_reason.clone();
                record.updated_at = updated_at;
                record.record_id.clone()
            }
            WriteIntent::Delete(delete) => {
                let before = records.len();
                records.retain(|record| record.record_id != delete.record_id);
                if records.len() == before {
                    return Err(BrainError::NotFound(format!(
                        "unknown recordId: {}",
                        delete.record_id
                    )));
                }
                delete.record_id.clone()
            }
        };

        let dest = self.store.records_path();
        let tmp = with_suffix(&dest, TMP_SUFFIX);
        jsonl::write_jsonl(&tmp, &records)?;
        self.staged.push((tmp, dest));
        Ok((records, record_id))
    }

    fn stage_manifest(
        &mut self,
        intent: &WriteIntent,
        staged_doc: Option<&StagedDoc>,
        existing: Option<&Record>,
    ) -> Result<(), BrainError> {
        let dest = self.store.manifest_path();
        let mut manifest: Manifest = if dest.exists() {
            serde_json::from_str(&fs::read_to_string(&dest)?)?
        } else {
            Manifest::empty(time::to_iso_millis(self.now))
        };

        if let Some(doc) = staged_doc {
            manifest.upsert(ManifestEntry {
                path: doc.rel.clone(),
                hash: doc.hash.clone(),
                size: doc.content.len() as u64,
                updated_at: time::to_iso_millis(self.now),
                category: category_for_path(&doc.rel),
            });
        }
        if let WriteIntent::Delete(_) = intent {
            if let Some(record) = existing {
                if !record.source_ref.is_empty() {
                    manifest.remove(&record.source_ref);
                }
            }
        }

        manifest.updated_at = time::to_iso_millis(self.now);
        manifest.recompute_summary();

        let tmp = with_suffix(&dest, TMP_SUFFIX);
        let mut content = serde_json::to_string_pretty(&manifest)?;
        content.push('\n');
        fs::write(&tmp, content)?;
        self.staged.push((tmp, dest));
        Ok(())
    }

    fn stage_digest(&mut self, records: &[Record]) -> Result<(), BrainError> {
        let dest = self.store.digest_path();
        let tmp = with_suffix(&dest, TMP_SUFFIX);
        fs::write(&tmp, render_digest(records))?;
        self.staged.push((tmp, dest));
        Ok(())
    }

    fn validate_staged(&mut self, staged_doc: Option<String>) -> Result<(), BrainError> {
        let report = validate::validate_store(self.store, &ValidateOptions::tmp(staged_doc))?;
        self.warnings.extend(report.warnings);
        if report.errors.is_empty() {
            Ok(())
        } else {
            Err(BrainError::SchemaViolation {
                reasons: report.errors,
            })
        }
    }

    /// Fixed commit order: document, records, manifest, digest. The staging
    /// order matches, so renaming in insertion order is the contract. A
    /// rename failure un-renames the committed prefix and surfaces the
    /// original fault; the caller then rolls back from the backups.
    fn commit(
        &mut self,
        intent: &WriteIntent,
        existing: Option<&Record>,
    ) -> Result<(), BrainError> {
        if let WriteIntent::Delete(_) = intent {
            if let Some(record) = existing {
                if !record.source_ref.is_empty() {
                    let doc = self.store.resolve(&record.source_ref);
                    if doc.exists() {
                        fs::remove_file(&doc)?;
                    }
                }
            }
        }

        let mut renamed: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (tmp, dest) in &self.staged {
            if let Err(err) = fs::rename(tmp, dest) {
                for (tmp_done, dest_done) in renamed.iter().rev() {
                    let _ = fs::rename(dest_done, tmp_done);
                }
                return Err(BrainError::IoFault(err));
            }
            renamed.push((tmp.clone(), dest.clone()));
        }
        self.staged.clear();
        Ok(())
    }

    /// Post-commit: drop the backups. A surviving `.bak` is non-fatal; the
    /// residue scan flags it on the next validate.
    fn cleanup_backups(&mut self) {
        for (_, bak) in self.backups.drain(..) {
            if fs::remove_file(&bak).is_err() {
                self.warnings
                    .push(format!("backup not removed: {}", bak.display()));
            }
        }
    }

    /// Best-effort restoration; never raises. Remaining `.tmp` files are
    /// unlinked, then every backup is copied over its original.
    fn rollback(&mut self) {
        for (tmp, _) in self.staged.drain(..) {
            let _ = fs::remove_file(&tmp);
        }
        for (original, bak) in self.backups.drain(..) {
            if fs::copy(&bak, &original).is_ok() {
                let _ = fs::remove_file(&bak);
            }
        }
    }
}

fn find_mut<'r>(records: &'r mut [Record], record_id: &str) -> Result<&'r mut Record, BrainError> {
    records
        .iter_mut()
        .find(|record| record.record_id == record_id)
        .ok_or_else(|| BrainError::NotFound(format!("unknown recordId: {}", record_id)))
}
