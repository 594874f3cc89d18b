//! Serde models for the record index and its sidecar artifacts.
//!
//! A record is the unit the index tracks: fourteen mandatory fields binding
//! a Markdown document to its provenance, lifecycle state, and content hash.
//! The digest is a pure projection of the records sequence; it is always
//! rendered from records, never maintained as independent state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MANIFEST_VERSION: &str = "1.0.0";

/// The only two tag axes the store accepts.
pub const TAG_AXES: [&str; 2] = ["domain", "intent"];

/// Sentinel `replacedBy` value for records deprecated without a successor.
pub const OBSOLETE_SENTINEL: &str = "obsolete";

/// Advisory ceiling before the validator emits a growth warning.
pub const RECORD_GROWTH_THRESHOLD: usize = 100;

pub const DIGEST_HEADER: [&str; 3] = [
    "# Brain records digest",
    "# recordId | title | summary | tags | status",
    "# derived from 90_index/records.jsonl",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    Project,
    Agent,
    User,
    Topic,
}

impl ScopeType {
    /// Fixed abbreviation embedded in record ids; load-bearing for the
    /// digest-first scope filter, so it must never change.
    pub fn abbrev(self) -> &'static str {
        match self {
            ScopeType::Project => "proj",
            ScopeType::Agent => "agent",
            ScopeType::User => "user",
            ScopeType::Topic => "topic",
        }
    }

    pub fn folder(self) -> &'static str {
        match self {
            ScopeType::Project => "10_projects",
            ScopeType::Agent => "20_agents",
            ScopeType::User => "00_user",
            ScopeType::Topic => "30_topics",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeType::Project => "project",
            ScopeType::Agent => "agent",
            ScopeType::User => "user",
            ScopeType::Topic => "topic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ScopeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(ScopeType::Project),
            "agent" => Ok(ScopeType::Agent),
            "user" => Ok(ScopeType::User),
            "topic" => Ok(ScopeType::Topic),
            other => Err(format!(
                "unknown scopeType '{}' (expected project|agent|user|topic)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Rule,
    Decision,
    Profile,
    Log,
    Ref,
    Note,
    Candidate,
    Reminder,
    ProjectState,
}

impl RecordType {
    /// SSOT types demand user-confirmed provenance.
    pub fn is_ssot(self) -> bool {
        matches!(self, RecordType::Rule | RecordType::Decision)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordType::Rule => "rule",
            RecordType::Decision => "decision",
            RecordType::Profile => "profile",
            RecordType::Log => "log",
            RecordType::Ref => "ref",
            RecordType::Note => "note",
            RecordType::Candidate => "candidate",
            RecordType::Reminder => "reminder",
            RecordType::ProjectState => "project_state",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rule" => Ok(RecordType::Rule),
            "decision" => Ok(RecordType::Decision),
            "profile" => Ok(RecordType::Profile),
            "log" => Ok(RecordType::Log),
            "ref" => Ok(RecordType::Ref),
            "note" => Ok(RecordType::Note),
            "candidate" => Ok(RecordType::Candidate),
            "reminder" => Ok(RecordType::Reminder),
            "project_state" => Ok(RecordType::ProjectState),
            other => Err(format!("unknown record type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    UserConfirmed,
    Candidate,
    ChatLog,
    ExternalDoc,
    Inference,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::UserConfirmed => "user_confirmed",
            SourceType::Candidate => "candidate",
            SourceType::ChatLog => "chat_log",
            SourceType::ExternalDoc => "external_doc",
            SourceType::Inference => "inference",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_confirmed" => Ok(SourceType::UserConfirmed),
            "candidate" => Ok(SourceType::Candidate),
            "chat_log" => Ok(SourceType::ChatLog),
            "external_doc" => Ok(SourceType::ExternalDoc),
            "inference" => Ok(SourceType::Inference),
            other => Err(format!("unknown sourceType '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Deprecated,
    Archived,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordStatus::Active => "active",
            RecordStatus::Deprecated => "deprecated",
            RecordStatus::Archived => "archived",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecordStatus::Active),
            "deprecated" => Ok(RecordStatus::Deprecated),
            "archived" => Ok(RecordStatus::Archived),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// One index record. All fields are serialized; nullable fields carry an
/// explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_id: String,
    pub scope_type: ScopeType,
    pub scope_id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub source_type: SourceType,
    pub source_ref: String,
    pub status: RecordStatus,
    pub replaced_by: Option<String>,
    pub deprecation_reason: Option<String>,
    pub updated_at: String,
    pub content_hash: String,
}

impl Record {
    pub fn digest_line(&self) -> String {
        format!(
            "{} | {} | {} | {} | {}",
            self.record_id,
            self.title,
            self.summary,
            self.tags.join(","),
            self.status
        )
    }
}

/// Renders the digest text: the fixed three-line header, then one line per
/// record in sequence order.
pub fn render_digest(records: &[Record]) -> String {
    let mut out = String::new();
    for line in DIGEST_HEADER {
        out.push_str(line);
        out.push('\n');
    }
    for record in records {
        out.push_str(&record.digest_line());
        out.push('\n');
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    User,
    Project,
    Agent,
    Topic,
    Index,
    Policy,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::User => "user",
            Category::Project => "project",
            Category::Agent => "agent",
            Category::Topic => "topic",
            Category::Index => "index",
            Category::Policy => "policy",
            Category::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Category is derived from the leading path segment.
pub fn category_for_path(path: &str) -> Category {
    match path.split('/').next().unwrap_or("") {
        "00_user" => Category::User,
        "10_projects" => Category::Project,
        "20_agents" => Category::Agent,
        "30_topics" => Category::Topic,
        "90_index" => Category::Index,
        "99_policy" => Category::Policy,
        _ => Category::Other,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub path: String,
    pub hash: String,
    pub size: u64,
    pub updated_at: String,
    pub category: Category,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub total_files: usize,
    pub by_category: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub updated_at: String,
    pub summary: ManifestSummary,
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn empty(updated_at: String) -> Self {
        Manifest {
            version: MANIFEST_VERSION.to_string(),
            updated_at,
            summary: ManifestSummary::default(),
            files: Vec::new(),
        }
    }

    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        self.files.iter().find(|entry| entry.path == path)
    }

    pub fn upsert(&mut self, entry: ManifestEntry) {
        match self.files.iter_mut().find(|e| e.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.files.push(entry),
        }
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|entry| entry.path != path);
        self.files.len() != before
    }

    pub fn recompute_summary(&mut self) {
        let mut by_category = BTreeMap::new();
        for entry in &self.files {
            *by_category.entry(entry.category.to_string()).or_insert(0) += 1;
        }
        self.summary = ManifestSummary {
            total_files: self.files.len(),
            by_category,
        };
    }
}

/// Declares the two allowed tag axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagsConfig {
    pub axes: Vec<String>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        TagsConfig {
            axes: TAG_AXES.iter().map(|axis| axis.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDecl {
    pub name: String,
    pub category: Category,
}

/// Declares the fixed category folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRegistry {
    pub version: String,
    pub folders: Vec<FolderDecl>,
}

impl Default for FolderRegistry {
    fn default() -> Self {
        FolderRegistry {
            version: MANIFEST_VERSION.to_string(),
            folders: crate::core::store::CATEGORY_FOLDERS
                .iter()
                .map(|name| FolderDecl {
                    name: name.to_string(),
                    category: category_for_path(name),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record {
        Record {
            record_id: "rec_topic_demo_20260801_0001".to_string(),
            scope_type: ScopeType::Topic,
            scope_id: "demo".to_string(),
            record_type: RecordType::Note,
            title: "Demo".to_string(),
            summary: "A demo record".to_string(),
            tags: vec!["domain/memory".to_string(), "intent/debug".to_string()],
            source_type: SourceType::Candidate,
            source_ref: "30_topics/demo/notes.md".to_string(),
            status: RecordStatus::Active,
            replaced_by: None,
            deprecation_reason: None,
            updated_at: "2026-08-01T00:00:00.000Z".to_string(),
            content_hash: format!("sha256:{}", "0".repeat(64)),
        }
    }

    #[test]
    fn digest_line_uses_pipe_fields_and_status() {
        let line = sample_record().digest_line();
        assert_eq!(
            line,
            "rec_topic_demo_20260801_0001 | Demo | A demo record | domain/memory,intent/debug | active"
        );
    }

    #[test]
    fn digest_render_has_three_header_lines() {
        let digest = render_digest(&[sample_record()]);
        let lines: Vec<&str> = digest.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[..3].iter().all(|l| l.starts_with('#')));
        assert!(lines[3].ends_with(" | active"));
    }

    #[test]
    fn record_serializes_nullable_fields_explicitly() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"replacedBy\":null"));
        assert!(json.contains("\"deprecationReason\":null"));
        assert!(json.contains("\"type\":\"note\""));
        assert!(json.contains("\"sourceType\":\"candidate\""));
    }

    #[test]
    fn category_derivation_follows_leading_segment() {
        assert_eq!(category_for_path("30_topics/x/notes.md"), Category::Topic);
        assert_eq!(category_for_path("99_policy/brainPolicy.md"), Category::Policy);
        assert_eq!(category_for_path("elsewhere/file.md"), Category::Other);
    }

    #[test]
    fn manifest_summary_counts_by_category() {
        let mut manifest = Manifest::empty("2026-08-01T00:00:00.000Z".to_string());
        for path in ["30_topics/a/x.md", "30_topics/b/y.md", "00_user/profile.md"] {
            manifest.upsert(ManifestEntry {
                path: path.to_string(),
                hash: format!("sha256:{}", "0".repeat(64)),
                size: 1,
                updated_at: "2026-08-01T00:00:00.000Z".to_string(),
                category: category_for_path(path),
            });
        }
        manifest.recompute_summary();
        assert_eq!(manifest.summary.total_files, 3);
        assert_eq!(manifest.summary.by_category.get("topic"), Some(&2));
        assert_eq!(manifest.summary.by_category.get("user"), Some(&1));
    }
}
