//! Idempotent store initialization.
//!
//! Creates the six category folders and seeds the index artifacts and the
//! policy document. Every file is written only if absent; re-running never
//! overwrites existing data.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::error::BrainError;
use crate::core::schemas::{render_digest, FolderRegistry, Manifest, TagsConfig};
use crate::core::store::{Store, CATEGORY_FOLDERS};
use crate::core::time;

const POLICY_TEMPLATE: &str = "# Brain Policy\n\n\
Ground rules for this memory store.\n\n\
## Mutation\n\n\
- All writes go through the transactional write path. Never edit\n\
  `90_index/` artifacts or indexed documents by hand; manual edits surface\n\
  as drift at the next boot.\n\
- New folders are created automatically only under `30_topics/`.\n\n\
## Provenance\n\n\
- `rule` and `decision` records are single-source-of-truth: they require\n\
  `user_confirmed` provenance. Inferred or candidate content must be\n\
  promoted, never written as SSOT directly.\n\n\
## Lifecycle\n\n\
- Records move `active -> deprecated -> deleted`, or `active -> archived`.\n\
- Physical deletion requires a prior-session deprecation, a successor (or\n\
  the `obsolete` sentinel with a reason), and user confirmation.\n";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub created: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn initialize(store: &Store) -> Result<InitReport, BrainError> {
    let mut report = InitReport {
        created: Vec::new(),
        skipped: Vec::new(),
    };

    for folder in CATEGORY_FOLDERS {
        let path = store.root.join(folder);
        if path.is_dir() {
            report.skipped.push(folder.to_string());
        } else {
            fs::create_dir_all(&path)?;
            report.created.push(folder.to_string());
        }
    }

    let manifest = Manifest::empty(time::now_iso_millis());
    let seeds: [(std::path::PathBuf, String); 6] = [
        (store.records_path(), String::new()),
        (store.manifest_path(), pretty(&manifest)?),
        (store.digest_path(), render_digest(&[])),
        (store.tags_path(), pretty(&TagsConfig::default())?),
        (
            store.folder_registry_path(),
            pretty(&FolderRegistry::default())?,
        ),
        (store.policy_path(), POLICY_TEMPLATE.to_string()),
    ];

    for (path, content) in seeds {
        write_if_absent(store, &path, &content, &mut report)?;
    }

    Ok(report)
}

fn pretty<T: Serialize>(value: &T) -> Result<String, BrainError> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

fn write_if_absent(
    store: &Store,
    path: &Path,
    content: &str,
    report: &mut InitReport,
) -> Result<(), BrainError> {
    let label = path
        .strip_prefix(&store.root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    if path.exists() {
        report.skipped.push(label);
    } else {
        fs::write(path, content)?;
        report.created.push(label);
    }
    Ok(())
}
