use brain::core::bwt;
use brain::core::hash;
use brain::core::init;
use brain::core::intent::{
    CreateIntent, DeleteIntent, DeprecateIntent, RecordDraft, RecordPatch, UpdateIntent,
    WriteIntent,
};
use brain::core::jsonl;
use brain::core::schemas::{Manifest, Record, RecordStatus, RecordType, ScopeType, SourceType};
use brain::core::store::Store;
use std::fs;
use tempfile::TempDir;

fn test_store() -> (TempDir, Store) {
    let tmp = TempDir::new().unwrap();
    let store = Store::new(tmp.path());
    init::initialize(&store).unwrap();
    (tmp, store)
}

fn topic_create(scope_id: &str, source_ref: &str, title: &str, summary: &str, content: &str) -> WriteIntent {
    WriteIntent::Create(CreateIntent {
        source_ref: source_ref.to_string(),
        content: content.to_string(),
        record: RecordDraft {
            scope_type: ScopeType::Topic,
            scope_id: scope_id.to_string(),
            record_type: RecordType::Note,
            title: title.to_string(),
            summary: summary.to_string(),
            tags: vec!["domain/memory".to_string(), "intent/debug".to_string()],
            source_type: SourceType::Candidate,
        },
        allow_new_folder: false,
    })
}

fn read_records(store: &Store) -> Vec<Record> {
    jsonl::read_jsonl(&store.records_path()).unwrap()
}

fn read_manifest(store: &Store) -> Manifest {
    serde_json::from_str(&fs::read_to_string(store.manifest_path()).unwrap()).unwrap()
}

fn assert_index_clean(store: &Store) {
    for entry in fs::read_dir(store.index_dir()).unwrap() {
        let name = entry.unwrap().file_name().to_string_lossy().to_string();
        assert!(
            !name.ends_with(".tmp") && !name.ends_with(".bak"),
            "side file left in 90_index: {}",
            name
        );
    }
}

#[test]
fn create_then_reread() {
    let (_tmp, store) = test_store();
    let content = "# V2 테스트\nBWT 검증용 문서";
    let response = bwt::execute(
        &store,
        &topic_create(
            "v2-test",
            "30_topics/v2-test/notes.md",
            "V2 검증 노트",
            "BWT V2 체크리스트 검증",
            content,
        ),
    );
    assert!(response.success, "{:?}", response.report.errors);

    let today = chrono::Utc::now().format("%Y%m%d").to_string();
    let record_id = response.record_id.unwrap();
    assert_eq!(record_id, format!("rec_topic_v2-test_{}_0001", today));

    // Document exists with the exact content.
    let doc = fs::read_to_string(store.root.join("30_topics/v2-test/notes.md")).unwrap();
    assert_eq!(doc, content);

    // Exactly one record, bound to the content hash.
    let records = read_records(&store);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_id, record_id);
    assert_eq!(records[0].status, RecordStatus::Active);
    assert_eq!(records[0].content_hash, hash::hash_text(content));

    // Manifest lists the path with the same hash and a recomputed summary.
    let manifest = read_manifest(&store);
    let entry = manifest.entry("30_topics/v2-test/notes.md").unwrap();
    assert_eq!(entry.hash, hash::hash_text(content));
    assert_eq!(entry.size, content.len() as u64);
    assert_eq!(manifest.summary.total_files, 1);

    // Digest carries an active line; no side files remain.
    let digest = fs::read_to_string(store.digest_path()).unwrap();
    assert!(digest.lines().any(|line| line.ends_with(" | active")));
    assert_index_clean(&store);
}

#[test]
fn update_of_unknown_id_rolls_back() {
    let (_tmp, store) = test_store();
    let content = "# V2 테스트\nBWT 검증용 문서";
    let doc_path = "30_topics/v2-test/notes.md";
    let created = bwt::execute(
        &store,
        &topic_create("v2-test", doc_path, "V2 검증 노트", "BWT V2 체크리스트 검증", content),
    );
    assert!(created.success);

    let records_before = fs::read(store.records_path()).unwrap();
    let manifest_before = fs::read(store.manifest_path()).unwrap();
    let digest_before = fs::read(store.digest_path()).unwrap();
    let doc_before = fs::read(store.root.join(doc_path)).unwrap();

    let response = bwt::execute(
        &store,
        &WriteIntent::Update(UpdateIntent {
            record_id: "rec_topic_nonexistent_20260101_9999".to_string(),
            content: Some("실패 테스트".to_string()),
            patch: RecordPatch::default(),
        }),
    );
    assert!(!response.success);
    assert_eq!(response.report.kind.as_deref(), Some("NotFound"));

    // Byte-identical store after rollback.
    assert_eq!(fs::read(store.records_path()).unwrap(), records_before);
    assert_eq!(fs::read(store.manifest_path()).unwrap(), manifest_before);
    assert_eq!(fs::read(store.digest_path()).unwrap(), digest_before);
    assert_eq!(fs::read(store.root.join(doc_path)).unwrap(), doc_before);
    assert_index_clean(&store);
}

#[test]
fn residue_blocks_the_next_write() {
    let (_tmp, store) = test_store();
    fs::write(store.index_dir().join("records.jsonl.tmp"), "").unwrap();

    let response = bwt::execute(
        &store,
        &topic_create(
            "v2-test",
            "30_topics/v2-test/notes.md",
            "V2 검증 노트",
            "BWT V2 체크리스트 검증",
            "# V2 테스트",
        ),
    );
    assert!(!response.success);
    assert_eq!(response.report.kind.as_deref(), Some("Residue"));
    assert_eq!(response.report.step, Some(2));

    // No side effects: nothing indexed, no document, residue untouched for
    // the caller to clean up explicitly.
    assert!(read_records(&store).is_empty());
    assert!(!store.root.join("30_topics/v2-test").exists());
    assert!(store.index_dir().join("records.jsonl.tmp").exists());
}

#[test]
fn folder_auto_create_is_limited_to_topics() {
    let (_tmp, store) = test_store();
    let mut intent = CreateIntent {
        source_ref: "10_projects/alpha/state.md".to_string(),
        content: "# alpha".to_string(),
        record: RecordDraft {
            scope_type: ScopeType::Project,
            scope_id: "alpha".to_string(),
            record_type: RecordType::ProjectState,
            title: "Alpha state".to_string(),
            summary: "Current state of alpha".to_string(),
            tags: vec!["domain/infra".to_string()],
            source_type: SourceType::UserConfirmed,
        },
        allow_new_folder: false,
    };

    let denied = bwt::execute(&store, &WriteIntent::Create(intent.clone()));
    assert!(!denied.success);
    assert_eq!(denied.report.kind.as_deref(), Some("ScopeViolation"));
    assert!(!store.root.join("10_projects/alpha").exists());
    assert_index_clean(&store);

    intent.allow_new_folder = true;
    let allowed = bwt::execute(&store, &WriteIntent::Create(intent));
    assert!(allowed.success, "{:?}", allowed.report.errors);
    assert!(store.root.join("10_projects/alpha/state.md").exists());
    assert_index_clean(&store);
}

#[test]
fn update_with_content_refreshes_hashes() {
    let (_tmp, store) = test_store();
    let doc_path = "30_topics/api/notes.md";
    let created = bwt::execute(
        &store,
        &topic_create("api", doc_path, "API 노트", "API 메모", "# v1"),
    );
    let record_id = created.record_id.unwrap();

    let response = bwt::execute(
        &store,
        &WriteIntent::Update(UpdateIntent {
            record_id: record_id.clone(),
            content: Some("# v2\n더 자세한 내용".to_string()),
            patch: RecordPatch {
                summary: Some("API 메모 개정판".to_string()),
                ..RecordPatch::default()
            },
        }),
    );
    assert!(response.success, "{:?}", response.report.errors);

    let new_hash = hash::hash_text("# v2\n더 자세한 내용");
    let records = read_records(&store);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content_hash, new_hash);
    assert_eq!(records[0].summary, "API 메모 개정판");
    assert_eq!(read_manifest(&store).entry(doc_path).unwrap().hash, new_hash);
    assert_eq!(
        fs::read_to_string(store.root.join(doc_path)).unwrap(),
        "# v2\n더 자세한 내용"
    );
    assert_index_clean(&store);
}

#[test]
fn deprecate_then_delete_removes_everything() {
    let (_tmp, store) = test_store();
    let doc_path = "30_topics/old/notes.md";
    let created = bwt::execute(
        &store,
        &topic_create("old", doc_path, "옛 노트", "더 이상 쓰지 않음", "# old"),
    );
    let record_id = created.record_id.unwrap();

    let deprecated = bwt::execute(
        &store,
        &WriteIntent::Deprecate(DeprecateIntent {
            record_id: record_id.clone(),
            replaced_by: "obsolete".to_string(),
            deprecation_reason: Some("내용이 더 이상 유효하지 않음".to_string()),
        }),
    );
    assert!(deprecated.success, "{:?}", deprecated.report.errors);
    let records = read_records(&store);
    assert_eq!(records[0].status, RecordStatus::Deprecated);
    assert_eq!(records[0].replaced_by.as_deref(), Some("obsolete"));

    // The engine trusts the caller to have passed the delete gate.
    let deleted = bwt::execute(
        &store,
        &WriteIntent::Delete(DeleteIntent {
            record_id: record_id.clone(),
        }),
    );
    assert!(deleted.success, "{:?}", deleted.report.errors);
    assert!(read_records(&store).is_empty());
    assert!(!store.root.join(doc_path).exists());
    assert!(read_manifest(&store).entry(doc_path).is_none());
    let digest = fs::read_to_string(store.digest_path()).unwrap();
    assert!(!digest.contains(&record_id));
    assert_index_clean(&store);
}

#[test]
fn ids_increment_within_a_scope_day() {
    let (_tmp, store) = test_store();
    let first = bwt::execute(
        &store,
        &topic_create("seq", "30_topics/seq/a.md", "첫번째", "순번 확인", "# a"),
    );
    let second = bwt::execute(
        &store,
        &topic_create("seq", "30_topics/seq/b.md", "두번째", "순번 확인", "# b"),
    );
    let first_id = first.record_id.unwrap();
    let second_id = second.record_id.unwrap();
    assert!(first_id.ends_with("_0001"), "{}", first_id);
    assert!(second_id.ends_with("_0002"), "{}", second_id);
}

#[test]
fn invalid_intent_touches_nothing() {
    let (_tmp, store) = test_store();
    let records_before = fs::read(store.records_path()).unwrap();

    let response = bwt::execute(
        &store,
        &WriteIntent::Create(CreateIntent {
            source_ref: "/absolute.md".to_string(),
            content: String::new(),
            record: RecordDraft {
                scope_type: ScopeType::Topic,
                scope_id: "Bad Slug".to_string(),
                record_type: RecordType::Note,
                title: String::new(),
                summary: "s".to_string(),
                tags: vec!["color/red".to_string()],
                source_type: SourceType::Candidate,
            },
            allow_new_folder: false,
        }),
    );
    assert!(!response.success);
    assert_eq!(response.report.kind.as_deref(), Some("IntentInvalid"));
    assert_eq!(response.report.step, Some(1));
    assert!(response.report.errors.len() >= 4, "{:?}", response.report.errors);
    assert_eq!(fs::read(store.records_path()).unwrap(), records_before);
    assert_index_clean(&store);
}
