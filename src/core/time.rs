//! Shared clock helpers for timestamps and transaction ids.

use chrono::{DateTime, SecondsFormat, Utc};
use ulid::Ulid;

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-08-02T09:15:42.123Z`.
pub fn to_iso_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_iso_millis() -> String {
    to_iso_millis(now_utc())
}

pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

pub fn new_txn_id() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_millis_round_trips() {
        let now = now_utc();
        let formatted = to_iso_millis(now);
        assert!(formatted.ends_with('Z'));
        let parsed = parse_iso(&formatted).unwrap();
        assert_eq!(to_iso_millis(parsed), formatted);
    }

    #[test]
    fn rejects_non_iso_values() {
        assert!(parse_iso("yesterday").is_none());
        assert!(parse_iso("20260101").is_none());
    }
}
