//! Table content normalizer.
//!
//! Stored tables come in several historical shapes. Each shape has one
//! recognizer; recognizers run in priority order and the first match wins.
//! Unrecognized content becomes an empty table.

use crate::model::inline::{Inline, InlineRun};
use crate::model::table::{
    CellProps, TableCell, TableCellTag, TableContent, TableContentTag, TableRow,
    DEFAULT_COLUMN_WIDTH, DEFAULT_TEXT_ALIGNMENT,
};
use crate::normalize::inline::normalize_inline;
use crate::normalize::{coerce_f64, coerce_positive_int, scrub_not_a_number, take_object};
use log::trace;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
struct TableRecognizer {
    name: &'static str,
    convert: fn(&Value) -> Option<TableContent>,
}

const TABLE_RECOGNIZERS: &[TableRecognizer] = &[
    TableRecognizer {
        name: "tagged",
        convert: convert_tagged,
    },
    TableRecognizer {
        name: "untagged_rows",
        convert: convert_untagged_rows,
    },
    TableRecognizer {
        name: "legacy_row_list",
        convert: convert_legacy_row_list,
    },
];

/// Canonicalizes the content of a `table` block.
pub fn normalize_table(content: &Value) -> TableContent {
    for recognizer in TABLE_RECOGNIZERS {
        if let Some(table) = (recognizer.convert)(content) {
            trace!(
                "event=table_normalize module=normalize status=ok shape={} rows={}",
                recognizer.name,
                table.rows.len()
            );
            return table;
        }
    }

    trace!("event=table_normalize module=normalize status=fallback shape=empty");
    TableContent::empty()
}

/// Canonicalizes one cell from any stored cell shape.
pub fn normalize_cell(cell: &Value) -> TableCell {
    match cell {
        Value::Object(map) => normalize_cell_object(map),
        Value::String(text) => TableCell::with_content(vec![Inline::Text(InlineRun::plain(
            text.as_str(),
        ))]),
        Value::Number(number) => {
            TableCell::with_content(vec![Inline::Text(InlineRun::plain(number.to_string()))])
        }
        _ => TableCell::with_content(Vec::new()),
    }
}

fn convert_tagged(content: &Value) -> Option<TableContent> {
    let map = content.as_object()?;
    if map.get("type").and_then(Value::as_str) != Some("tableContent") {
        return None;
    }
    Some(table_from_object(map))
}

fn convert_untagged_rows(content: &Value) -> Option<TableContent> {
    let map = content.as_object()?;
    let untagged = map.get("type").map_or(true, Value::is_null);
    if !untagged || !map.get("rows").is_some_and(Value::is_array) {
        return None;
    }
    Some(table_from_object(map))
}

fn convert_legacy_row_list(content: &Value) -> Option<TableContent> {
    let rows = content.as_array()?;
    let rows: Vec<TableRow> = rows.iter().map(normalize_row).collect();
    let columns = rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
    Some(TableContent {
        tag: TableContentTag::TableContent,
        column_widths: vec![DEFAULT_COLUMN_WIDTH; columns],
        header_rows: 0,
        rows,
    })
}

fn table_from_object(map: &Map<String, Value>) -> TableContent {
    let column_widths = map
        .get("columnWidths")
        .and_then(Value::as_array)
        .map(|widths| widths.iter().map(column_width).collect())
        .unwrap_or_default();
    let header_rows = map
        .get("headerRows")
        .and_then(coerce_f64)
        .filter(|rows| *rows >= 0.0)
        .map(|rows| rows.trunc().min(f64::from(u32::MAX)) as u32)
        .unwrap_or(0);
    let rows = map
        .get("rows")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().map(normalize_row).collect())
        .unwrap_or_default();

    TableContent {
        tag: TableContentTag::TableContent,
        column_widths,
        header_rows,
        rows,
    }
}

fn column_width(width: &Value) -> f64 {
    coerce_f64(width)
        .filter(|width| *width > 0.0)
        .unwrap_or(DEFAULT_COLUMN_WIDTH)
}

fn normalize_row(row: &Value) -> TableRow {
    TableRow {
        cells: row_cells(row).iter().map(normalize_cell).collect(),
    }
}

// A row exposes its cells as `cells`, as `content`, or is the cell list itself.
fn row_cells(row: &Value) -> &[Value] {
    match row {
        Value::Array(cells) => cells.as_slice(),
        Value::Object(map) => map
            .get("cells")
            .and_then(Value::as_array)
            .or_else(|| map.get("content").and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

fn normalize_cell_object(source: &Map<String, Value>) -> TableCell {
    let mut fields = source.clone();
    fields.remove("type");

    let mut props = take_object(&mut fields, "props");
    scrub_not_a_number(&mut props);
    let colspan = props.remove("colspan").as_ref().and_then(coerce_positive_int);
    let rowspan = props.remove("rowspan").as_ref().and_then(coerce_positive_int);
    let text_alignment = match props.remove("textAlignment") {
        Some(Value::String(alignment)) if !alignment.trim().is_empty() => alignment,
        _ => DEFAULT_TEXT_ALIGNMENT.to_string(),
    };

    let content = match fields.remove("content") {
        Some(content) if !content.is_null() => normalize_inline(&content),
        _ => match fields.remove("text") {
            Some(Value::String(text)) => vec![Inline::Text(InlineRun::plain(text))],
            Some(other) => {
                fields.insert("text".to_string(), other);
                Vec::new()
            }
            None => Vec::new(),
        },
    };

    TableCell {
        tag: TableCellTag::TableCell,
        props: CellProps {
            colspan,
            rowspan,
            text_alignment,
            extra: props,
        },
        content,
        extra: fields,
    }
}
