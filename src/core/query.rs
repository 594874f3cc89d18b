//! Digest-first query pipeline.
//!
//! Queries never open `records.jsonl`: the digest is the fast-scan surface.
//! Scope filtering leans on the fixed abbreviation embedded in record ids,
//! goal scoring is a token count (+3 title, +2 summary, +1 tags), and ties
//! keep the digest's insertion order. Detail lookup by id is the one read
//! that goes to the full records file.

use serde::{Deserialize, Serialize};
use std::fs;

use crate::core::error::BrainError;
use crate::core::jsonl;
use crate::core::schemas::{Record, ScopeType};
use crate::core::store::Store;

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    pub scope_type: Option<ScopeType>,
    pub scope_id: Option<String>,
    pub goal: Option<String>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub record_id: String,
    pub title: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub status: String,
    pub score: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub candidates: Vec<Candidate>,
    pub total: usize,
}

struct DigestRow {
    record_id: String,
    title: String,
    summary: String,
    tags: Vec<String>,
    status: String,
}

pub fn query(store: &Store, request: &QueryRequest) -> Result<QueryResponse, BrainError> {
    let content = fs::read_to_string(store.digest_path())?;
    let mut rows = parse_digest(&content);

    if let Some(scope_type) = request.scope_type {
        let needle = format!("_{}_", scope_type.abbrev());
        rows.retain(|row| row.record_id.contains(&needle));
        if let Some(scope_id) = &request.scope_id {
            let needle = format!("_{}_", scope_id);
            rows.retain(|row| row.record_id.contains(&needle));
        }
    }

    rows.retain(|row| row.status == "active");
    let total = rows.len();

    let tokens = goal_tokens(request.goal.as_deref());
    let mut candidates: Vec<Candidate> = rows
        .into_iter()
        .map(|row| {
            let score = score_row(&row, &tokens);
            Candidate {
                record_id: row.record_id,
                title: row.title,
                summary: row.summary,
                tags: row.tags,
                status: row.status,
                score,
            }
        })
        .collect();

    // Stable sort: equal scores keep the digest's insertion order.
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    candidates.truncate(request.top_k.unwrap_or(DEFAULT_TOP_K));

    Ok(QueryResponse { candidates, total })
}

/// Full-record detail lookup; `None` when the id is unknown.
pub fn get_record(store: &Store, record_id: &str) -> Result<Option<Record>, BrainError> {
    let records: Vec<Record> = jsonl::read_jsonl(&store.records_path())?;
    Ok(records
        .into_iter()
        .find(|record| record.record_id == record_id))
}

fn parse_digest(content: &str) -> Vec<DigestRow> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.splitn(5, " | ");
            let record_id = parts.next()?.to_string();
            let title = parts.next()?.to_string();
            let summary = parts.next()?.to_string();
            let tags_field = parts.next()?;
            let status = parts.next()?.to_string();
            let tags = tags_field
                .split(',')
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
            Some(DigestRow {
                record_id,
                title,
                summary,
                tags,
                status,
            })
        })
        .collect()
}

/// Lowercased whitespace tokens; single-character tokens carry no signal and
/// are dropped.
fn goal_tokens(goal: Option<&str>) -> Vec<String> {
    match goal {
        Some(goal) => goal
            .to_lowercase()
            .split_whitespace()
            .filter(|token| token.chars().count() > 1)
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

fn score_row(row: &DigestRow, tokens: &[String]) -> u32 {
    if tokens.is_empty() {
        return 0;
    }
    let title = row.title.to_lowercase();
    let summary = row.summary.to_lowercase();
    let tags = row.tags.join(",").to_lowercase();
    let mut score = 0;
    for token in tokens {
        if title.contains(token.as_str()) {
            score += 3;
        }
        if summary.contains(token.as_str()) {
            score += 2;
        }
        if tags.contains(token.as_str()) {
            score += 1;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_character_tokens_are_dropped() {
        let tokens = goal_tokens(Some("a API 설계 b 엔드포인트"));
        assert_eq!(tokens, vec!["api", "설계", "엔드포인트"]);
    }

    #[test]
    fn scoring_weights_title_over_summary_over_tags() {
        let row = DigestRow {
            record_id: "rec_topic_demo_20260801_0001".to_string(),
            title: "API design".to_string(),
            summary: "api endpoints".to_string(),
            tags: vec!["domain/api".to_string()],
            status: "active".to_string(),
        };
        let tokens = goal_tokens(Some("api"));
        assert_eq!(score_row(&row, &tokens), 6);
        assert_eq!(score_row(&row, &[]), 0);
    }

    #[test]
    fn digest_parse_skips_headers_and_blanks() {
        let content = "# header\n# fields\n# provenance\n\n\
                       rec_topic_demo_20260801_0001 | T | S | domain/x | active\n";
        let rows = parse_digest(content);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record_id, "rec_topic_demo_20260801_0001");
        assert_eq!(rows[0].tags, vec!["domain/x"]);
        assert_eq!(rows[0].status, "active");
    }
}
