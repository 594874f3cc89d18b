use brain::core::bwt;
use brain::core::init;
use brain::core::intent::{CreateIntent, DeprecateIntent, RecordDraft, WriteIntent};
use brain::core::lifecycle;
use brain::core::schemas::{Record, RecordStatus, RecordType, ScopeType, SourceType};
use brain::core::store::Store;
use brain::core::validate::{self, ValidateOptions};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

fn fixture_record(status: RecordStatus, updated_at: &str) -> Record {
    Record {
        record_id: "rec_topic_demo_20260801_0001".to_string(),
        scope_type: ScopeType::Topic,
        scope_id: "demo".to_string(),
        record_type: RecordType::Note,
        title: "Demo".to_string(),
        summary: "A demo record".to_string(),
        tags: vec!["domain/memory".to_string()],
        source_type: SourceType::Candidate,
        source_ref: "30_topics/demo/notes.md".to_string(),
        status,
        replaced_by: None,
        deprecation_reason: None,
        updated_at: updated_at.to_string(),
        content_hash: format!("sha256:{}", "0".repeat(64)),
    }
}

#[test]
fn transition_table_matches_the_lifecycle() {
    use RecordStatus::*;
    assert!(lifecycle::check_transition(Active, Deprecated).is_ok());
    assert!(lifecycle::check_transition(Active, Archived).is_ok());
    assert!(lifecycle::check_transition(Deprecated, Active).is_ok());

    assert!(lifecycle::check_transition(Deprecated, Archived).is_err());
    assert!(lifecycle::check_transition(Archived, Active).is_err());
    assert!(lifecycle::check_transition(Archived, Deprecated).is_err());
    let reason = lifecycle::check_transition(Archived, Active).unwrap_err();
    assert!(reason.contains("archived"), "{}", reason);
}

#[test]
fn delete_gate_reports_every_unmet_precondition() {
    let session_start = Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap();
    // Active, touched after session start, no successor, no confirmation.
    let record = fixture_record(RecordStatus::Active, "2026-08-02T10:00:00.000Z");

    let gate = lifecycle::check_delete(&record, session_start, false);
    assert!(!gate.allowed);
    assert_eq!(gate.failures.len(), 4, "{:?}", gate.failures);
}

#[test]
fn delete_gate_passes_when_all_preconditions_hold() {
    let session_start = Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap();
    let mut record = fixture_record(RecordStatus::Deprecated, "2026-08-01T12:00:00.000Z");
    record.replaced_by = Some("rec_topic_demo_20260801_0002".to_string());

    let gate = lifecycle::check_delete(&record, session_start, true);
    assert!(gate.allowed, "{:?}", gate.failures);
}

#[test]
fn same_session_deprecation_always_blocks_deletion() {
    let session_start = Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap();
    let mut record = fixture_record(RecordStatus::Deprecated, "2026-08-02T09:30:00.000Z");
    record.replaced_by = Some("obsolete".to_string());
    record.deprecation_reason = Some("테스트".to_string());

    let gate = lifecycle::check_delete(&record, session_start, true);
    assert!(!gate.allowed);
    assert_eq!(gate.failures.len(), 1);
    assert!(gate.failures[0].contains("current session"), "{:?}", gate.failures);
}

#[test]
fn promotion_to_ssot_requires_user_confirmation() {
    assert!(lifecycle::check_promotion(RecordType::Rule, SourceType::UserConfirmed).is_ok());
    assert!(lifecycle::check_promotion(RecordType::Note, SourceType::Inference).is_ok());

    let denial =
        lifecycle::check_promotion(RecordType::Decision, SourceType::Candidate).unwrap_err();
    assert!(denial.contains("user_confirmed"), "{}", denial);
}

#[test]
fn contamination_flags_active_ssot_with_weak_provenance() {
    let mut rule = fixture_record(RecordStatus::Active, "2026-08-01T00:00:00.000Z");
    rule.record_type = RecordType::Rule;
    rule.source_type = SourceType::Inference;

    let mut confirmed = fixture_record(RecordStatus::Active, "2026-08-01T00:00:00.000Z");
    confirmed.record_id = "rec_topic_demo_20260801_0002".to_string();
    confirmed.record_type = RecordType::Decision;
    confirmed.source_type = SourceType::UserConfirmed;

    let mut deprecated = fixture_record(RecordStatus::Deprecated, "2026-08-01T00:00:00.000Z");
    deprecated.record_id = "rec_topic_demo_20260801_0003".to_string();
    deprecated.record_type = RecordType::Rule;
    deprecated.source_type = SourceType::Candidate;
    deprecated.replaced_by = Some("obsolete".to_string());
    deprecated.deprecation_reason = Some("정리".to_string());

    let offenders = lifecycle::find_contamination(&[rule.clone(), confirmed, deprecated]);
    assert_eq!(offenders.len(), 1);
    assert_eq!(offenders[0].record_id, rule.record_id);
}

#[test]
fn back_reference_detector_pairs_active_with_deprecated() {
    let mut old = fixture_record(RecordStatus::Deprecated, "2026-08-01T00:00:00.000Z");
    old.replaced_by = Some("obsolete".to_string());
    old.deprecation_reason = Some("정리".to_string());

    let mut referencing = fixture_record(RecordStatus::Active, "2026-08-01T00:00:00.000Z");
    referencing.record_id = "rec_topic_demo_20260801_0002".to_string();
    referencing.summary = format!("{} 참고", old.record_id);

    let pairs = lifecycle::find_back_references(&[old.clone(), referencing.clone()]);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].active_id, referencing.record_id);
    assert_eq!(pairs[0].deprecated_id, old.record_id);
    assert_eq!(pairs[0].field, "summary");
}

/// End-to-end: deprecate a record, leave an active record pointing at it,
/// and expect `validate --full` to name the pair.
#[test]
fn full_validation_flags_deprecated_back_references() {
    let tmp = TempDir::new().unwrap();
    let store = Store::new(tmp.path());
    init::initialize(&store).unwrap();

    let target = bwt::execute(
        &store,
        &WriteIntent::Create(CreateIntent {
            source_ref: "30_topics/v7-target/notes.md".to_string(),
            content: "# 대상 문서".to_string(),
            record: RecordDraft {
                scope_type: ScopeType::Topic,
                scope_id: "v7-target".to_string(),
                record_type: RecordType::Note,
                title: "대상 노트".to_string(),
                summary: "곧 폐기될 노트".to_string(),
                tags: vec!["domain/memory".to_string()],
                source_type: SourceType::Candidate,
            },
            allow_new_folder: false,
        }),
    );
    let target_id = target.record_id.unwrap();

    let referencing = bwt::execute(
        &store,
        &WriteIntent::Create(CreateIntent {
            source_ref: "30_topics/v7-target/follow-up.md".to_string(),
            content: "# 후속 문서".to_string(),
            record: RecordDraft {
                scope_type: ScopeType::Topic,
                scope_id: "v7-target".to_string(),
                record_type: RecordType::Note,
                title: "후속 노트".to_string(),
                summary: format!("{} 내용을 이어받음", target_id),
                tags: vec!["domain/memory".to_string()],
                source_type: SourceType::Candidate,
            },
            allow_new_folder: false,
        }),
    );
    let referencing_id = referencing.record_id.unwrap();

    let deprecated = bwt::execute(
        &store,
        &WriteIntent::Deprecate(DeprecateIntent {
            record_id: target_id.clone(),
            replaced_by: "obsolete".to_string(),
            deprecation_reason: Some("테스트".to_string()),
        }),
    );
    assert!(deprecated.success, "{:?}", deprecated.report.errors);

    let report = validate::validate_store(&store, &ValidateOptions::full()).unwrap();
    assert!(report.ok(), "{:?}", report.errors);
    let warning = report
        .warnings
        .iter()
        .find(|warning| warning.contains(&referencing_id) && warning.contains(&target_id))
        .expect("back-reference warning not found");
    assert!(warning.contains("deprecated"), "{}", warning);
}
