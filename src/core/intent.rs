//! Write-intent shapes and their structural validation.
//!
//! An intent is the caller-supplied request the BWT engine executes. The
//! validation here is the first engine step: it collects every violation in
//! one pass and rejects before any file is touched.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::schemas::{RecordType, ScopeType, SourceType, OBSOLETE_SENTINEL, TAG_AXES};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WriteIntent {
    Create(CreateIntent),
    Update(UpdateIntent),
    Deprecate(DeprecateIntent),
    Delete(DeleteIntent),
}

impl WriteIntent {
    pub fn action(&self) -> &'static str {
        match self {
            WriteIntent::Create(_) => "create",
            WriteIntent::Update(_) => "update",
            WriteIntent::Deprecate(_) => "deprecate",
            WriteIntent::Delete(_) => "delete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntent {
    pub source_ref: String,
    pub content: String,
    pub record: RecordDraft,
    /// Explicit permission to create a folder outside `30_topics/`.
    #[serde(default)]
    pub allow_new_folder: bool,
}

/// The caller's half of a new record; the engine supplies id, status,
/// timestamps, and the content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDraft {
    pub scope_type: ScopeType,
    pub scope_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source_type: SourceType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIntent {
    pub record_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub patch: RecordPatch,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub record_type: Option<RecordType>,
    pub source_type: Option<SourceType>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.tags.is_none()
            && self.record_type.is_none()
            && self.source_type.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecateIntent {
    pub record_id: String,
    pub replaced_by: String,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteIntent {
    pub record_id: String,
}

pub fn is_valid_slug(value: &str) -> bool {
    let re = Regex::new(r"^[a-z0-9_-]+$").unwrap();
    re.is_match(value)
}

/// Tags are `axis/value` with the axis restricted to `domain` or `intent`.
pub fn is_valid_tag(tag: &str) -> bool {
    match tag.split_once('/') {
        Some((axis, value)) => TAG_AXES.contains(&axis) && !value.is_empty(),
        None => false,
    }
}

/// Document paths are root-relative: non-empty, not absolute, no parent
/// traversal.
pub fn is_relative_doc_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.split('/').any(|segment| segment == ".." || segment.is_empty())
}

/// Structural validation of an intent. Returns every violation found;
/// an empty list means the intent may proceed.
pub fn validate_intent(intent: &WriteIntent) -> Vec<String> {
    let mut violations = Vec::new();
    match intent {
        WriteIntent::Create(create) => {
            if !is_relative_doc_path(&create.source_ref) {
                violations.push(format!(
                    "sourceRef '{}' must be a root-relative path",
                    create.source_ref
                ));
            }
            if create.content.is_empty() {
                violations.push("content must not be empty".to_string());
            }
            validate_draft(&create.record, &mut violations);
        }
        WriteIntent::Update(update) => {
            validate_record_id_field(&update.record_id, &mut violations);
            if update.content.is_none() && update.patch.is_empty() {
                violations.push("update carries neither content nor record fields".to_string());
            }
            if let Some(content) = &update.content {
                if content.is_empty() {
                    violations.push("content must not be empty".to_string());
                }
            }
            if let Some(title) = &update.patch.title {
                if title.trim().is_empty() {
                    violations.push("title must not be empty".to_string());
                }
            }
            if let Some(summary) = &update.patch.summary {
                if summary.trim().is_empty() {
                    violations.push("summary must not be empty".to_string());
                }
            }
            if let Some(tags) = &update.patch.tags {
                for tag in tags {
                    if !is_valid_tag(tag) {
                        violations.push(bad_tag(tag));
                    }
                }
            }
        }
        WriteIntent::Deprecate(deprecate) => {
            validate_record_id_field(&deprecate.record_id, &mut violations);
            if deprecate.replaced_by.trim().is_empty() {
                violations.push("replacedBy is required for deprecate".to_string());
            }
            if deprecate.replaced_by == OBSOLETE_SENTINEL
                && deprecate
                    .deprecation_reason
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or("")
                    .is_empty()
            {
                violations
                    .push("deprecationReason is required when replacedBy is 'obsolete'".to_string());
            }
        }
        WriteIntent::Delete(delete) => {
            validate_record_id_field(&delete.record_id, &mut violations);
        }
    }
    violations
}

fn validate_draft(draft: &RecordDraft, violations: &mut Vec<String>) {
    if !is_valid_slug(&draft.scope_id) {
        violations.push(format!(
            "scopeId '{}' must be a lowercase slug (a-z, 0-9, '_', '-')",
            draft.scope_id
        ));
    }
    if draft.title.trim().is_empty() {
        violations.push("title must not be empty".to_string());
    }
    if draft.summary.trim().is_empty() {
        violations.push("summary must not be empty".to_string());
    }
    for tag in &draft.tags {
        if !is_valid_tag(tag) {
            violations.push(bad_tag(tag));
        }
    }
}

fn validate_record_id_field(record_id: &str, violations: &mut Vec<String>) {
    if record_id.trim().is_empty() {
        violations.push("recordId is required".to_string());
    }
}

fn bad_tag(tag: &str) -> String {
    format!(
        "tag '{}' must be axis/value with axis in {{domain, intent}}",
        tag
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RecordDraft {
        RecordDraft {
            scope_type: ScopeType::Topic,
            scope_id: "demo".to_string(),
            record_type: RecordType::Note,
            title: "Title".to_string(),
            summary: "Summary".to_string(),
            tags: vec!["domain/memory".to_string()],
            source_type: SourceType::Candidate,
        }
    }

    #[test]
    fn valid_create_passes() {
        let intent = WriteIntent::Create(CreateIntent {
            source_ref: "30_topics/demo/notes.md".to_string(),
            content: "# hi".to_string(),
            record: draft(),
            allow_new_folder: false,
        });
        assert!(validate_intent(&intent).is_empty());
    }

    #[test]
    fn create_violations_are_collected_not_short_circuited() {
        let mut record = draft();
        record.scope_id = "Bad Slug".to_string();
        record.title = " ".to_string();
        record.tags = vec!["color/red".to_string()];
        let intent = WriteIntent::Create(CreateIntent {
            source_ref: "/absolute.md".to_string(),
            content: String::new(),
            record,
            allow_new_folder: false,
        });
        let violations = validate_intent(&intent);
        assert_eq!(violations.len(), 5, "{:?}", violations);
    }

    #[test]
    fn update_requires_content_or_patch() {
        let intent = WriteIntent::Update(UpdateIntent {
            record_id: "rec_topic_demo_20260801_0001".to_string(),
            content: None,
            patch: RecordPatch::default(),
        });
        let violations = validate_intent(&intent);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("neither content nor record fields"));
    }

    #[test]
    fn obsolete_deprecation_requires_reason() {
        let intent = WriteIntent::Deprecate(DeprecateIntent {
            record_id: "rec_topic_demo_20260801_0001".to_string(),
            replaced_by: OBSOLETE_SENTINEL.to_string(),
            deprecation_reason: None,
        });
        let violations = validate_intent(&intent);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("deprecationReason"));
    }

    #[test]
    fn path_rules_reject_traversal_and_absolute() {
        assert!(is_relative_doc_path("30_topics/x/notes.md"));
        assert!(!is_relative_doc_path("/etc/passwd"));
        assert!(!is_relative_doc_path("30_topics/../99_policy/x.md"));
        assert!(!is_relative_doc_path(""));
    }
}
