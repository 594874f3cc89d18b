//! Record-id minting.

use chrono::{DateTime, Utc};

use crate::core::schemas::{Record, ScopeType};

/// Mints the next `rec_{abbrev}_{scopeId}_{YYYYMMDD}_{NNNN}` id: scan the
/// existing sequence for ids sharing the scope-day prefix, take the highest
/// numeric suffix, and add one. The first record of a scope-day is `0001`.
pub fn mint_record_id(
    scope_type: ScopeType,
    scope_id: &str,
    existing: &[Record],
    now: DateTime<Utc>,
) -> String {
    let prefix = format!(
        "rec_{}_{}_{}_",
        scope_type.abbrev(),
        scope_id,
        now.format("%Y%m%d")
    );
    let max = existing
        .iter()
        .filter_map(|record| record.record_id.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:04}", prefix, max + 1)
}
