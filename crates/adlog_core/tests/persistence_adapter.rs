use adlog_core::db::open_db;
use adlog_core::{
    normalize_block, AdapterOptions, Block, EngineError, EnvelopeShape, MemoryRecordStore,
    PersistenceAdapter, RecordStore, Section, ShapePolicy, SqliteRecordStore, StoreError,
    StoreResult,
};
use serde_json::{json, Value};

fn options() -> AdapterOptions {
    AdapterOptions {
        fallback_date: Some("2025-09-01".to_string()),
        ..AdapterOptions::default()
    }
}

fn section(title: &str, body: &str, text: &str) -> Section {
    let mut section = Section::empty("2025-09-01");
    section.title = title.to_string();
    section.blocks = vec![Block::paragraph(vec![adlog_core::Inline::Text(
        adlog_core::InlineRun::plain(body),
    )])];
    section.text = text.to_string();
    section
}

/// Refuses every write and counts the attempts.
#[derive(Default)]
struct RejectingStore {
    attempts: usize,
}

impl RecordStore for RejectingStore {
    fn get(&self, _id: &str) -> StoreResult<Option<Value>> {
        Ok(None)
    }

    fn set(&mut self, _id: &str, _patch: &Value) -> StoreResult<()> {
        self.attempts += 1;
        Err(StoreError::Rejected {
            reason: format!("attempt {} refused", self.attempts),
        })
    }
}

#[test]
fn single_section_round_trips_through_bare_blocks() {
    let mut adapter = PersistenceAdapter::new(MemoryRecordStore::new(), options());
    let outcome = adapter
        .save("log-1", &[section("Weekly", "CPA improved", " CPA improved ")])
        .unwrap();
    assert_eq!(outcome.shape, EnvelopeShape::Blocks);
    assert_eq!(outcome.attempts, 1);

    let loaded = adapter.load("log-1").unwrap();
    assert_eq!(loaded.shape, Some(EnvelopeShape::Blocks));
    assert_eq!(loaded.sections.len(), 1);
    assert_eq!(loaded.sections[0].title, "Weekly");
    assert_eq!(loaded.sections[0].blocks[0].inline_text(), "CPA improved");
    assert_eq!(loaded.sections[0].text, "CPA improved");
    assert_eq!(loaded.record.content_shape, Some(EnvelopeShape::Blocks));
}

#[test]
fn falls_back_to_encoded_string_when_store_only_takes_strings() {
    let store = MemoryRecordStore::with_policy(ShapePolicy::strings_only());
    let mut adapter = PersistenceAdapter::new(store, options());
    let original = section("Title", "body", "body");

    let outcome = adapter.save("log-1", &[original.clone()]).unwrap();
    assert_eq!(outcome.shape, EnvelopeShape::EncodedJson);
    assert_eq!(outcome.attempts, 3);

    let raw = adapter.store().get("log-1").unwrap().unwrap();
    assert!(raw["content_json"].is_string());
    assert_eq!(raw["content_shape"], json!("json_string"));

    let loaded = adapter.load("log-1").unwrap();
    assert_eq!(loaded.shape, Some(EnvelopeShape::EncodedJson));
    assert_eq!(loaded.sections, vec![original]);
}

#[test]
fn falls_back_to_sections_wrapper_when_arrays_are_refused() {
    let store = MemoryRecordStore::with_policy(ShapePolicy {
        arrays: false,
        objects: true,
        strings: true,
    });
    let mut adapter = PersistenceAdapter::new(store, options());

    let outcome = adapter
        .save("log-1", &[section("T", "b", "")])
        .unwrap();
    assert_eq!(outcome.shape, EnvelopeShape::Sections);
    assert_eq!(outcome.attempts, 2);

    let raw = adapter.store().get("log-1").unwrap().unwrap();
    let stored = raw["content_json"]["sections"].as_array().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["title"], json!("T"));
    assert_eq!(raw["content_shape"], json!("sections"));

    let loaded = adapter.load("log-1").unwrap();
    assert_eq!(loaded.shape, Some(EnvelopeShape::Sections));
    assert_eq!(loaded.sections.len(), 1);
    assert_eq!(loaded.sections[0].title, "T");
    assert_eq!(loaded.sections[0].blocks[0].inline_text(), "b");
}

#[test]
fn unedited_save_keeps_title_heading_as_stored() {
    let heading = json!({
        "id": "h1",
        "type": "heading",
        "props": {"level": 1, "textColor": "red"},
        "content": [{"type": "text", "text": "Title", "styles": {"bold": true}}]
    });
    let mut store = MemoryRecordStore::new();
    store.insert(
        "log-1",
        json!({
            "log_id": "log-1",
            "content_json": [heading.clone(), {"type": "paragraph", "content": "body"}]
        }),
    );
    let mut adapter = PersistenceAdapter::new(store, options());

    let loaded = adapter.load("log-1").unwrap();
    assert_eq!(loaded.sections[0].title, "Title");
    let outcome = adapter.save("log-1", &loaded.sections).unwrap();
    assert_eq!(outcome.shape, EnvelopeShape::Blocks);

    let raw = adapter.store().get("log-1").unwrap().unwrap();
    let expected = serde_json::to_value(normalize_block(&heading)).unwrap();
    assert_eq!(raw["content_json"][0], expected);
    assert_eq!(raw["content_json"][0]["props"]["level"], json!(1));
    assert_eq!(raw["content_json"].as_array().unwrap().len(), 2);
}

#[test]
fn all_variants_rejected_reports_last_cause() {
    let mut adapter = PersistenceAdapter::new(RejectingStore::default(), options());

    let err = adapter
        .save("log-1", &[section("T", "b", "")])
        .unwrap_err();
    match err {
        EngineError::AllVariantsRejected {
            record_id,
            attempts,
            last,
        } => {
            assert_eq!(record_id, "log-1");
            assert_eq!(attempts, 3);
            assert!(last.to_string().contains("attempt 3 refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(adapter.store().attempts, 3);
}

#[test]
fn multiple_sections_are_written_as_wrapper_and_keep_ids() {
    let mut adapter = PersistenceAdapter::new(MemoryRecordStore::new(), options());
    let first = section("A", "one", "one");
    let second = section("B", "two", "two");

    let outcome = adapter.save("log-1", &[first.clone(), second.clone()]).unwrap();
    assert_eq!(outcome.shape, EnvelopeShape::Sections);
    assert_eq!(outcome.attempts, 1);

    let raw = adapter.store().get("log-1").unwrap().unwrap();
    assert_eq!(raw["content_text"], json!("one\n\ntwo"));

    let loaded = adapter.load("log-1").unwrap();
    assert_eq!(loaded.sections, vec![first, second]);
}

#[test]
fn sqlite_store_preserves_unrelated_record_fields() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db(dir.path().join("adlog.db")).unwrap();
    let mut store = SqliteRecordStore::try_new(&mut conn).unwrap();
    store
        .set(
            "log-1",
            &json!({
                "log_id": "log-1",
                "client_name": "ACME",
                "month_date": "2025-08-01",
                "content_json": [{"name": "heading", "content": "Seed"}]
            }),
        )
        .unwrap();

    let mut adapter = PersistenceAdapter::new(store, options());
    let loaded = adapter.load("log-1").unwrap();
    assert_eq!(loaded.sections[0].title, "Seed");
    assert_eq!(loaded.sections[0].date, "2025-08-01");

    adapter.save("log-1", &loaded.sections).unwrap();
    let raw = adapter.store().get("log-1").unwrap().unwrap();
    assert_eq!(raw["client_name"], json!("ACME"));
    assert_eq!(raw["month_date"], json!("2025-08-01"));
    assert_eq!(raw["content_format"], json!("blocknote@0.23"));
    assert_eq!(raw["content_schema_version"], json!(1));
    assert!(raw["updated_at"].is_string());
}
