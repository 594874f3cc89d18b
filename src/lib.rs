//! Brain: local-first persistent memory for AI agents.
//!
//! **Brain is a single-user, content-addressed memory store that agents call
//! on demand.** Markdown documents live under six category folders; a
//! four-artifact sidecar index binds each document to its hash, provenance,
//! and lifecycle state. Every mutation flows through one transactional write
//! path with backups, staged files, pre-commit validation, and rollback.
//!
//! # Core Principles
//!
//! - **Local-first**: all state is a directory tree; nothing leaves the host
//! - **Write-path-only mutation**: manual edits are tolerated but surface as
//!   drift at the next boot
//! - **Content-addressed**: records carry the SHA-256 of the document bytes;
//!   the manifest re-asserts it; boot verifies it
//! - **Provenance-gated**: `rule` and `decision` records require
//!   user-confirmed sources; everything else is advisory memory
//!
//! # For AI Agents
//!
//! **You MUST:**
//! 1. Boot before reading: `brain boot` verifies the store and reports drift
//! 2. Write through the CLI (or the typed intents); never edit `90_index/`
//! 3. Deprecate before deleting: physical removal is gated on a
//!    prior-session deprecation, a successor, and user confirmation
//! 4. Validate after manual surgery: `brain validate --full`
//!
//! # Architecture
//!
//! - [`core::bwt`]: the nine-step transactional writer
//! - [`core::validate`]: committed/staged store validation
//! - [`core::lifecycle`]: pure gate predicates (transitions, delete, SSOT)
//! - [`core::boot`]: policy + manifest load and the drift check
//! - [`core::query`]: digest-first goal scoring
//!
//! The CLI in this file is a thin adapter: it runs the lifecycle gates,
//! builds typed intents, and renders the engine's reports.

mod cli;
pub mod core;

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::cli::{Cli, Command, OutputFormat};
use crate::core::boot::{self, BootRequest};
use crate::core::bwt::{self, WriteResponse};
use crate::core::error::BrainError;
use crate::core::intent::{
    CreateIntent, DeleteIntent, DeprecateIntent, RecordDraft, RecordPatch, UpdateIntent,
    WriteIntent,
};
use crate::core::lifecycle;
use crate::core::query::{self, QueryRequest};
use crate::core::schemas::{RecordStatus, RecordType, ScopeType, SourceType};
use crate::core::store::{self, Store};
use crate::core::validate::{self, ValidateOptions};
use crate::core::{init, time, tui};

pub fn run() -> Result<(), BrainError> {
    let cli = Cli::parse();
    // Captured once; the delete gate compares record timestamps against it.
    let session_start = time::now_utc();
    let format = cli.format;

    let root = store::discover_root(cli.root.as_deref())?;
    let store = Store::new(root);

    match cli.command {
        Command::Init => {
            let report = init::initialize(&store)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report).unwrap());
                }
                OutputFormat::Text => {
                    tui::heading(&format!("Initialized {}", store.root.display()));
                    for path in &report.created {
                        tui::pass(&format!("created {}", path));
                    }
                    for path in &report.skipped {
                        tui::info(&format!("preserved {}", path));
                    }
                }
            }
            Ok(())
        }

        Command::Create {
            scope_type,
            scope_id,
            record_type,
            title,
            summary,
            tags,
            source_type,
            source_ref,
            content,
            content_file,
            allow_new_folder,
        } => {
            let content = read_content(content, content_file)?;
            let intent = WriteIntent::Create(CreateIntent {
                source_ref,
                content,
                record: RecordDraft {
                    scope_type: parse_enum::<ScopeType>(&scope_type)?,
                    scope_id,
                    record_type: parse_enum::<RecordType>(&record_type)?,
                    title,
                    summary,
                    tags: split_tags(&tags),
                    source_type: parse_enum::<SourceType>(&source_type)?,
                },
                allow_new_folder,
            });
            submit(&store, &intent, format)
        }

        Command::Update {
            id,
            title,
            summary,
            tags,
            record_type,
            source_type,
            content,
            content_file,
        } => {
            let record_type = record_type
                .as_deref()
                .map(parse_enum::<RecordType>)
                .transpose()?;
            let source_type = source_type
                .as_deref()
                .map(parse_enum::<SourceType>)
                .transpose()?;

            // SSOT promotion gate, run before the engine sees the intent.
            if let Some(target) = record_type {
                let record = query::get_record(&store, &id)?
                    .ok_or_else(|| BrainError::NotFound(format!("unknown recordId: {}", id)))?;
                let effective_source = source_type.unwrap_or(record.source_type);
                if let Err(reason) = lifecycle::check_promotion(target, effective_source) {
                    return Err(BrainError::LifecycleDenied {
                        reasons: vec![reason],
                    });
                }
            }

            let content = match (content, content_file) {
                (None, None) => None,
                (content, content_file) => Some(read_content(content, content_file)?),
            };
            let intent = WriteIntent::Update(UpdateIntent {
                record_id: id,
                content,
                patch: RecordPatch {
                    title,
                    summary,
                    tags: tags.as_deref().map(split_tags),
                    record_type,
                    source_type,
                },
            });
            submit(&store, &intent, format)
        }

        Command::Deprecate {
            id,
            replaced_by,
            reason,
        } => {
            let record = query::get_record(&store, &id)?
                .ok_or_else(|| BrainError::NotFound(format!("unknown recordId: {}", id)))?;
            if let Err(denial) = lifecycle::check_transition(record.status, RecordStatus::Deprecated)
            {
                return Err(BrainError::LifecycleDenied {
                    reasons: vec![denial],
                });
            }
            let intent = WriteIntent::Deprecate(DeprecateIntent {
                record_id: id,
                replaced_by,
                deprecation_reason: reason,
            });
            submit(&store, &intent, format)
        }

        Command::Delete { id, yes } => {
            let record = query::get_record(&store, &id)?
                .ok_or_else(|| BrainError::NotFound(format!("unknown recordId: {}", id)))?;
            let gate = lifecycle::check_delete(&record, session_start, yes);
            if !gate.allowed {
                if format == OutputFormat::Text {
                    tui::heading(&format!("Delete blocked for {}", id));
                    for failure in &gate.failures {
                        tui::fail(failure);
                    }
                }
                return Err(BrainError::LifecycleDenied {
                    reasons: gate.failures,
                });
            }
            let intent = WriteIntent::Delete(DeleteIntent { record_id: id });
            submit(&store, &intent, format)
        }

        Command::Query {
            scope_type,
            scope_id,
            goal,
            top_k,
        } => {
            let request = QueryRequest {
                scope_type: scope_type.as_deref().map(parse_enum::<ScopeType>).transpose()?,
                scope_id,
                goal,
                top_k: Some(top_k),
            };
            let response = query::query(&store, &request)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&response).unwrap());
                }
                OutputFormat::Text => {
                    for candidate in &response.candidates {
                        println!(
                            "{:>4}  {}  {}",
                            candidate.score, candidate.record_id, candidate.title
                        );
                    }
                    tui::info(&format!(
                        "{} candidate(s) of {} active",
                        response.candidates.len(),
                        response.total
                    ));
                }
            }
            Ok(())
        }

        Command::Get { id } => {
            let record = query::get_record(&store, &id)?;
            match (format, record) {
                (OutputFormat::Json, Some(record)) => {
                    println!("{}", serde_json::to_string_pretty(&record).unwrap());
                }
                (OutputFormat::Json, None) => println!("null"),
                (OutputFormat::Text, Some(record)) => {
                    println!("{}", serde_json::to_string_pretty(&record).unwrap());
                }
                (OutputFormat::Text, None) => tui::info(&format!("no record with id {}", id)),
            }
            Ok(())
        }

        Command::Boot {
            scope_type,
            scope_id,
        } => {
            let request = BootRequest {
                scope_type: scope_type.as_deref().map(parse_enum::<ScopeType>).transpose()?,
                scope_id,
            };
            let report = boot::boot(&store, &request)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report).unwrap());
                }
                OutputFormat::Text => {
                    tui::heading("Boot");
                    tui::pass("policy loaded");
                    if report.mismatches.is_empty() {
                        tui::pass("manifest matches the document tree");
                    }
                    for mismatch in &report.mismatches {
                        tui::warn(&format!("drift: {} ({})", mismatch.path, mismatch.reason));
                    }
                    for advisory in &report.advisories {
                        tui::warn(advisory);
                    }
                    if let (Some(scope_type), Some(scope_id)) =
                        (report.scope_type, report.scope_id.as_deref())
                    {
                        tui::info(&format!("scope: {}/{}", scope_type, scope_id));
                    } else if report.user_profile.is_some() {
                        tui::info("scope: user profile loaded");
                    }
                }
            }
            Ok(())
        }

        Command::Validate { full } => {
            let opts = if full {
                ValidateOptions::full()
            } else {
                ValidateOptions::committed()
            };
            let report = validate::validate_store(&store, &opts)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report).unwrap());
                }
                OutputFormat::Text => {
                    tui::heading(&format!("Validate {}", store.root.display()));
                    for error in &report.errors {
                        tui::fail(error);
                    }
                    for warning in &report.warnings {
                        tui::warn(warning);
                    }
                    tui::print_summary(report.errors.len(), report.warnings.len());
                }
            }
            if report.ok() {
                Ok(())
            } else {
                Err(BrainError::OperationFailed(format!(
                    "{} validation error(s)",
                    report.errors.len()
                )))
            }
        }
    }
}

fn submit(store: &Store, intent: &WriteIntent, format: OutputFormat) -> Result<(), BrainError> {
    let response = bwt::execute(store, intent);
    render_write(&response, format);
    if response.success {
        Ok(())
    } else {
        Err(BrainError::OperationFailed(response.report.message))
    }
}

fn render_write(response: &WriteResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(response).unwrap());
        }
        OutputFormat::Text => {
            if response.success {
                match &response.record_id {
                    Some(id) => tui::pass(&format!("{} ({})", response.report.message, id)),
                    None => tui::pass(&response.report.message),
                }
            } else {
                for error in &response.report.errors {
                    tui::fail(error);
                }
            }
            for warning in &response.report.warnings {
                tui::warn(warning);
            }
        }
    }
}

fn parse_enum<T: FromStr<Err = String>>(value: &str) -> Result<T, BrainError> {
    value.parse().map_err(|reason| BrainError::IntentInvalid {
        reasons: vec![reason],
    })
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_content(
    content: Option<String>,
    content_file: Option<PathBuf>,
) -> Result<String, BrainError> {
    match (content, content_file) {
        (Some(content), _) => Ok(content),
        (None, Some(path)) => Ok(fs::read_to_string(path)?),
        (None, None) => Err(BrainError::IntentInvalid {
            reasons: vec!["content is required: pass --content or --content-file".to_string()],
        }),
    }
}
