use adlog_core::{
    AdapterOptions, EditSession, EngineError, EnvelopeShape, MemoryRecordStore, PersistenceAdapter,
};
use serde_json::json;

fn adapter_with_seed() -> PersistenceAdapter<MemoryRecordStore> {
    let mut store = MemoryRecordStore::new();
    store.insert(
        "log-1",
        json!({
            "log_id": "log-1",
            "month_date": "2025-09-01",
            "content_json": {"sections": [{"id": "s1", "title": "Draft", "blocks": []}]}
        }),
    );
    PersistenceAdapter::new(store, AdapterOptions::default())
}

#[test]
fn edits_are_canonicalized_and_derive_text_and_media() {
    let adapter = adapter_with_seed();
    let mut session = EditSession::open(&adapter, "log-1").unwrap();
    assert!(!session.is_dirty());

    let section = session
        .apply_edit(
            "s1",
            &json!([
                {"type": "paragraph", "props": {"textColor": null}, "content": "Spend  up"},
                {"type": "image", "props": {"url": "https://cdn/chart.png", "name": "chart.png"}},
                {"type": "table", "content": [["CTR", "1.2%"]]}
            ]),
        )
        .unwrap();

    assert_eq!(section.blocks.len(), 3);
    assert!(!section.blocks[0].props.contains_key("textColor"));
    assert_eq!(section.text, "Spend up CTR 1.2%");
    assert_eq!(section.attachments.len(), 1);
    assert_eq!(
        section.attachments[0].url.as_deref(),
        Some("https://cdn/chart.png")
    );
    assert!(session.is_dirty());
}

#[test]
fn empty_edit_keeps_a_blank_paragraph() {
    let adapter = adapter_with_seed();
    let mut session = EditSession::open(&adapter, "log-1").unwrap();
    let section = session.apply_edit("s1", &json!([])).unwrap();
    assert_eq!(section.blocks.len(), 1);
    assert_eq!(section.text, "");
}

#[test]
fn unknown_section_is_an_error() {
    let adapter = adapter_with_seed();
    let mut session = EditSession::open(&adapter, "log-1").unwrap();
    let err = session.apply_edit("missing", &json!([])).unwrap_err();
    assert!(matches!(err, EngineError::UnknownSection(id) if id == "missing"));
    assert!(session.set_title("missing", "x").is_err());
    assert!(!session.is_dirty());
}

#[test]
fn save_writes_through_adapter_and_reloads() {
    let mut adapter = adapter_with_seed();
    let mut session = EditSession::open(&adapter, "log-1").unwrap();
    session
        .apply_edit("s1", &json!([{"type": "paragraph", "content": "final"}]))
        .unwrap();
    session.set_title("s1", "Final report").unwrap();

    let outcome = session.save(&mut adapter).unwrap();
    assert_eq!(outcome.shape, EnvelopeShape::Blocks);
    assert!(!session.is_dirty());

    let reloaded = EditSession::open(&adapter, "log-1").unwrap();
    let section = &reloaded.sections()[0];
    assert_eq!(section.title, "Final report");
    assert_eq!(section.date, "2025-09-01");
    assert_eq!(section.text, "final");
    assert_eq!(section.blocks[0].inline_text(), "final");
}
