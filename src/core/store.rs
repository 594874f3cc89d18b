use std::env;
use std::path::{Path, PathBuf};

use crate::core::error::BrainError;

/// Category folders beneath the root, in on-disk order.
pub const CATEGORY_FOLDERS: [&str; 6] = [
    "00_user",
    "10_projects",
    "20_agents",
    "30_topics",
    "90_index",
    "99_policy",
];

pub const INDEX_DIR: &str = "90_index";
pub const TOPICS_DIR: &str = "30_topics";

pub const RECORDS_FILE: &str = "records.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const DIGEST_FILE: &str = "records_digest.txt";
pub const TAGS_FILE: &str = "tags.json";
pub const FOLDER_REGISTRY_FILE: &str = "folderRegistry.json";

pub const POLICY_PATH: &str = "99_policy/brainPolicy.md";
pub const USER_PROFILE_PATH: &str = "00_user/profile.md";

/// Suffixes for transaction side files living next to their targets.
pub const TMP_SUFFIX: &str = ".tmp";
pub const BAK_SUFFIX: &str = ".bak";

/// Appends a side-file suffix to a full path (`manifest.json` ->
/// `manifest.json.tmp`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// A Brain store rooted at one directory. Threaded explicitly into every
/// component; nothing below this type consults the environment.
#[derive(Debug, Clone)]
pub struct Store {
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Store { root: root.into() }
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join(INDEX_DIR)
    }

    pub fn records_path(&self) -> PathBuf {
        self.index_dir().join(RECORDS_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.index_dir().join(MANIFEST_FILE)
    }

    pub fn digest_path(&self) -> PathBuf {
        self.index_dir().join(DIGEST_FILE)
    }

    pub fn tags_path(&self) -> PathBuf {
        self.index_dir().join(TAGS_FILE)
    }

    pub fn folder_registry_path(&self) -> PathBuf {
        self.index_dir().join(FOLDER_REGISTRY_FILE)
    }

    pub fn policy_path(&self) -> PathBuf {
        self.root.join(POLICY_PATH)
    }

    pub fn user_profile_path(&self) -> PathBuf {
        self.root.join(USER_PROFILE_PATH)
    }

    /// Resolves a root-relative document path (a record's `sourceRef`).
    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

/// Root discovery, in priority order: explicit argument, `BRAIN_ROOT`,
/// `~/Brain`, then the first ancestor of the working directory containing
/// `Brain/90_index`. The one place that consults the environment.
pub fn discover_root(explicit: Option<&Path>) -> Result<PathBuf, BrainError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(value) = env::var("BRAIN_ROOT") {
        if !value.is_empty() {
            return Ok(PathBuf::from(value));
        }
    }

    if let Ok(home) = env::var("HOME") {
        let candidate = Path::new(&home).join("Brain");
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    let mut dir = env::current_dir()?;
    loop {
        let candidate = dir.join("Brain");
        if candidate.join(INDEX_DIR).is_dir() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(BrainError::NotFound(
        "no Brain root found: pass --root, set BRAIN_ROOT, or create ~/Brain".to_string(),
    ))
}
