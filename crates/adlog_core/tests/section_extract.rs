use adlog_core::{
    extract_sections, to_sections, Block, BlockKind, EnvelopeShape, ExtractContext, StoredRecord,
};
use serde_json::{json, Value};

fn record(raw: Value) -> StoredRecord {
    StoredRecord::from_value("log-1", &raw)
}

fn context() -> ExtractContext {
    ExtractContext {
        fallback_date: Some("2025-10-01".to_string()),
        ..ExtractContext::default()
    }
}

#[test]
fn leading_heading_becomes_the_title() {
    let sections = to_sections(&record(json!({
        "month_date": "2025-09-01",
        "content_json": [
            {"type": "heading", "props": {"level": 2}, "content": [{"type": "text", "text": "Test Table", "styles": {}}]},
            {"type": "table", "content": [["A1", "B1"]]}
        ],
        "content_text": "A1 B1",
        "attachments": [{"url": "https://cdn/x.png"}]
    })));

    assert_eq!(sections.len(), 1);
    let section = &sections[0];
    assert_eq!(section.title, "Test Table");
    assert_eq!(section.date, "2025-09-01");
    assert_eq!(section.blocks.len(), 1);
    assert_eq!(section.blocks[0].kind, BlockKind::Table);
    assert_eq!(section.text, "A1 B1");
    assert_eq!(section.attachments.len(), 1);
}

#[test]
fn document_without_leading_heading_has_empty_title() {
    let sections = to_sections(&record(json!({
        "content_json": [
            {"type": "paragraph", "content": "intro"},
            {"type": "heading", "content": "Later"}
        ]
    })));
    assert_eq!(sections[0].title, "");
    assert_eq!(sections[0].blocks.len(), 2);
}

#[test]
fn undecodable_string_falls_back_to_empty_section() {
    let extraction = extract_sections(
        &record(json!({"content_json": "{not valid json"})),
        &context(),
    );
    assert_eq!(extraction.shape, None);
    assert_eq!(extraction.sections.len(), 1);
    let section = &extraction.sections[0];
    assert_eq!(section.title, "");
    assert_eq!(section.blocks, vec![Block::blank_paragraph()]);
    assert_eq!(section.date, "2025-10-01");
    assert!(!section.id.is_empty());
}

#[test]
fn encoded_sections_wrapper_is_decoded() {
    let wrapper = json!({"sections": [
        {"id": "s1", "date": "2025-09-02", "title": "One", "blocks": [{"type": "paragraph", "content": "a"}], "text": "a"},
        {"id": "s2", "title": "Two", "blocks": []}
    ]});
    let extraction = extract_sections(
        &record(json!({"content_json": wrapper.to_string()})),
        &context(),
    );
    assert_eq!(extraction.shape, Some(EnvelopeShape::EncodedJson));
    let ids: Vec<_> = extraction.sections.iter().map(|section| section.id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2"]);
    assert_eq!(extraction.sections[0].text, "a");
    assert_eq!(extraction.sections[1].date, "2025-10-01");
    assert_eq!(extraction.sections[1].blocks, vec![Block::blank_paragraph()]);
}

#[test]
fn encoded_bare_blocks_are_decoded() {
    let blocks = json!([{"type": "heading", "content": "Title"}, {"type": "paragraph", "content": "body"}]);
    let extraction = extract_sections(
        &record(json!({"content_json": blocks.to_string()})),
        &context(),
    );
    assert_eq!(extraction.shape, Some(EnvelopeShape::EncodedJson));
    assert_eq!(extraction.sections[0].title, "Title");
    assert_eq!(extraction.sections[0].blocks[0].inline_text(), "body");
}

#[test]
fn bare_list_of_section_objects_keeps_section_titles() {
    let sections = to_sections(&record(json!({
        "month_date": "2025-09-01",
        "content_json": [{
            "date": "2025-09-01",
            "title": "Initial section",
            "blocks": [{"type": "paragraph", "content": "seeded"}],
            "text": "",
            "attachments": []
        }]
    })));
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "Initial section");
    assert_eq!(sections[0].blocks[0].inline_text(), "seeded");
}

#[test]
fn legacy_single_section_object_is_one_section() {
    let sections = to_sections(&record(json!({
        "content_json": {"title": "Legacy", "blocks": [{"type": "paragraph"}], "attachments": ["https://cdn/y.pdf"]}
    })));
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "Legacy");
    assert_eq!(
        sections[0].attachments[0].url.as_deref(),
        Some("https://cdn/y.pdf")
    );
}

#[test]
fn shape_hint_is_consulted_first() {
    let extraction = extract_sections(
        &record(json!({
            "content_shape": "blocks",
            "content_json": [{"blocks": [], "title": "looks like a section"}]
        })),
        &context(),
    );
    assert_eq!(extraction.shape, Some(EnvelopeShape::Blocks));
    assert_eq!(extraction.sections[0].title, "");
}

#[test]
fn limits_truncate_and_report() {
    let extraction = extract_sections(
        &record(json!({"content_json": [
            {"type": "paragraph", "content": "1"},
            {"type": "paragraph", "content": "2"},
            {"type": "paragraph", "content": "3"}
        ]})),
        &ExtractContext {
            fallback_date: None,
            limits: adlog_core::NormalizeLimits {
                max_depth: None,
                max_blocks: Some(2),
            },
        },
    );
    assert_eq!(extraction.sections[0].blocks.len(), 2);
    assert_eq!(extraction.truncation.dropped_blocks, 1);
}
