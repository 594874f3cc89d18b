//! CLI struct definitions for the brain command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "brain",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local-first persistent memory for AI agents: content-addressed Markdown documents behind a transactional write path."
)]
pub struct Cli {
    /// Store root; overrides BRAIN_ROOT and discovery.
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,
    /// Output format for this invocation.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the folder skeleton and empty index artifacts (idempotent).
    Init,

    /// Write a new document and its index record.
    Create {
        /// Scope: project | agent | user | topic.
        #[clap(long)]
        scope_type: String,
        /// Subject slug inside the scope.
        #[clap(long)]
        scope_id: String,
        /// Record type (rule, decision, profile, log, ref, note, candidate,
        /// reminder, project_state).
        #[clap(long = "type")]
        record_type: String,
        #[clap(long)]
        title: String,
        #[clap(long)]
        summary: String,
        /// Comma-separated axis/value tags; axes are domain and intent.
        #[clap(long, default_value = "")]
        tags: String,
        /// Provenance: user_confirmed | candidate | chat_log | external_doc | inference.
        #[clap(long)]
        source_type: String,
        /// Root-relative document path, e.g. 30_topics/api/notes.md.
        #[clap(long)]
        source_ref: String,
        /// Document body; use --content-file to read it from disk instead.
        #[clap(long, conflicts_with = "content_file")]
        content: Option<String>,
        #[clap(long)]
        content_file: Option<PathBuf>,
        /// Permit creating a folder outside 30_topics/.
        #[clap(long)]
        allow_new_folder: bool,
    },

    /// Patch a record and optionally rewrite its document.
    Update {
        #[clap(long)]
        id: String,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        summary: Option<String>,
        /// Comma-separated tags replacing the current set.
        #[clap(long)]
        tags: Option<String>,
        /// New record type; promotion to rule/decision is gated on
        /// user_confirmed provenance.
        #[clap(long = "type")]
        record_type: Option<String>,
        #[clap(long)]
        source_type: Option<String>,
        #[clap(long, conflicts_with = "content_file")]
        content: Option<String>,
        #[clap(long)]
        content_file: Option<PathBuf>,
    },

    /// Deprecate a record in favor of a successor (or the obsolete sentinel).
    Deprecate {
        #[clap(long)]
        id: String,
        /// Successor recordId, or the literal 'obsolete'.
        #[clap(long)]
        replaced_by: String,
        /// Required when --replaced-by is 'obsolete'.
        #[clap(long)]
        reason: Option<String>,
    },

    /// Physically remove a deprecated record and its document.
    Delete {
        #[clap(long)]
        id: String,
        /// Confirm the removal (the third delete gate).
        #[clap(long)]
        yes: bool,
    },

    /// Rank active records against a goal, digest-first.
    Query {
        #[clap(long)]
        scope_type: Option<String>,
        #[clap(long)]
        scope_id: Option<String>,
        #[clap(long)]
        goal: Option<String>,
        #[clap(long, default_value = "10")]
        top_k: usize,
    },

    /// Print the full record for an id.
    Get {
        #[clap(long)]
        id: String,
    },

    /// Load policy and manifest, verify on-disk hashes, report drift.
    Boot {
        #[clap(long)]
        scope_type: Option<String>,
        #[clap(long)]
        scope_id: Option<String>,
    },

    /// Check index invariants and store health.
    Validate {
        /// Also run the contamination and back-reference detectors.
        #[clap(long)]
        full: bool,
    },
}
