//! Textual projections of canonical blocks.
//!
//! # Responsibility
//! - Derive the plain search text stored as `content_text`.
//! - Export documents as Markdown or HTML for previews and the CLI.
//!
//! # Invariants
//! - Renderers never fail; unknown kinds degrade to their visible text.
//! - HTML output escapes all document text.

use crate::model::block::{Block, BlockContent, BlockKind};
use crate::model::inline::{inline_text, Inline, InlineRun, StyleValue};
use crate::model::table::{TableCell, TableContent};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const MIN_MARKDOWN_COLUMN_WIDTH: usize = 3;

// Inline style flags and the HTML/Markdown markers they map to.
const STYLE_MARKERS: &[(&str, &str, &str)] = &[
    ("code", "code", "`"),
    ("bold", "strong", "**"),
    ("italic", "em", "_"),
    ("underline", "u", ""),
    ("strike", "s", "~~"),
];

/// Visible text of a block tree with whitespace collapsed to single spaces.
pub fn to_plain_text(blocks: &[Block]) -> String {
    let mut parts = Vec::new();
    for block in blocks {
        collect_block_text(block, &mut parts);
    }
    let joined = parts.join(" ");
    WHITESPACE_RE.replace_all(joined.trim(), " ").into_owned()
}

fn collect_block_text(block: &Block, parts: &mut Vec<String>) {
    match &block.content {
        BlockContent::Inline(items) => parts.push(inline_text(items)),
        BlockContent::Table(table) => {
            for cell in table.rows.iter().flat_map(|row| &row.cells) {
                parts.push(cell.text());
            }
        }
        BlockContent::Opaque(items) => {
            for item in items {
                collect_value_text(item, parts);
            }
        }
    }
    for child in &block.children {
        collect_block_text(child, parts);
    }
}

fn collect_value_text(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_value_text(item, parts)),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                parts.push(text.to_string());
            }
            for key in ["content", "children"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    items.iter().for_each(|item| collect_value_text(item, parts));
                }
            }
        }
        _ => {}
    }
}

/// Markdown export: ATX headings, pipe tables, one blank line between blocks.
pub fn to_markdown(blocks: &[Block]) -> String {
    let mut chunks = Vec::new();
    for block in blocks {
        markdown_block(block, &mut chunks);
    }
    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks.join("\n\n")
}

fn markdown_block(block: &Block, chunks: &mut Vec<String>) {
    let chunk = match (&block.kind, &block.content) {
        (BlockKind::Heading, BlockContent::Inline(items)) => {
            let level = usize::from(block.level().unwrap_or(2).clamp(1, 6));
            format!("{} {}", "#".repeat(level), markdown_inlines(items))
        }
        (_, BlockContent::Inline(items)) => markdown_inlines(items),
        (_, BlockContent::Table(table)) => markdown_table(table),
        (_, BlockContent::Opaque(items)) => {
            let mut parts = Vec::new();
            items
                .iter()
                .for_each(|item| collect_value_text(item, &mut parts));
            parts.join(" ")
        }
    };
    chunks.push(chunk);
    for child in &block.children {
        markdown_block(child, chunks);
    }
}

fn markdown_inlines(items: &[Inline]) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            Inline::Text(run) => out.push_str(&markdown_run(run)),
            Inline::Opaque(_) => item.push_text(&mut out),
        }
    }
    out
}

fn markdown_run(run: &InlineRun) -> String {
    if run.text.trim().is_empty() {
        return run.text.clone();
    }
    let mut text = run.text.clone();
    for (style, _, marker) in STYLE_MARKERS {
        if is_flag_set(run, style) && !marker.is_empty() {
            text = format!("{marker}{text}{marker}");
        }
    }
    text
}

// First row is the header row; Markdown tables cannot omit one.
fn markdown_table(table: &TableContent) -> String {
    let columns = table.column_count();
    if columns == 0 {
        return String::new();
    }

    let grid: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let mut cells: Vec<String> = row.cells.iter().map(markdown_cell).collect();
            cells.resize(columns, String::new());
            cells
        })
        .collect();

    let mut widths = vec![MIN_MARKDOWN_COLUMN_WIDTH; columns];
    for row in &grid {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(grid.len() + 1);
    for (index, row) in grid.iter().enumerate() {
        lines.push(markdown_row(row, &widths));
        if index == 0 {
            let separator: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
            lines.push(markdown_row(&separator, &widths));
        }
    }
    lines.join("\n")
}

fn markdown_cell(cell: &TableCell) -> String {
    let text = WHITESPACE_RE.replace_all(cell.text().trim(), " ").into_owned();
    text.replace('|', "\\|")
}

fn markdown_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        let padding = width.saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(padding));
        line.push_str(" |");
    }
    line
}

/// HTML export with escaped text, inline style tags and real table markup.
pub fn to_html(blocks: &[Block]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        html_block(block, &mut lines);
    }
    lines.join("\n")
}

fn html_block(block: &Block, lines: &mut Vec<String>) {
    let line = match (&block.kind, &block.content) {
        (BlockKind::Heading, BlockContent::Inline(items)) => {
            let level = block.level().unwrap_or(2).clamp(1, 6);
            format!("<h{level}>{}</h{level}>", html_inlines(items))
        }
        (_, BlockContent::Inline(items)) => format!("<p>{}</p>", html_inlines(items)),
        (_, BlockContent::Table(table)) => html_table(table),
        (_, BlockContent::Opaque(items)) => {
            let mut parts = Vec::new();
            items
                .iter()
                .for_each(|item| collect_value_text(item, &mut parts));
            format!("<p>{}</p>", escape_html(&parts.join(" ")))
        }
    };
    lines.push(line);
    for child in &block.children {
        html_block(child, lines);
    }
}

fn html_inlines(items: &[Inline]) -> String {
    let mut out = String::new();
    for item in items {
        match item {
            Inline::Text(run) => out.push_str(&html_run(run)),
            Inline::Opaque(_) => {
                let mut text = String::new();
                item.push_text(&mut text);
                out.push_str(&escape_html(&text));
            }
        }
    }
    out
}

fn html_run(run: &InlineRun) -> String {
    let mut html = escape_html(&run.text);
    for (style, tag, _) in STYLE_MARKERS {
        if is_flag_set(run, style) {
            html = format!("<{tag}>{html}</{tag}>");
        }
    }
    html
}

fn html_table(table: &TableContent) -> String {
    let header_rows = usize::try_from(table.header_rows).unwrap_or(usize::MAX);
    let mut html = String::from("<table>");
    for (index, row) in table.rows.iter().enumerate() {
        let tag = if index < header_rows { "th" } else { "td" };
        html.push_str("<tr>");
        for cell in &row.cells {
            html.push('<');
            html.push_str(tag);
            if let Some(colspan) = cell.props.colspan.filter(|span| *span > 1) {
                html.push_str(&format!(" colspan=\"{colspan}\""));
            }
            if let Some(rowspan) = cell.props.rowspan.filter(|span| *span > 1) {
                html.push_str(&format!(" rowspan=\"{rowspan}\""));
            }
            if cell.props.text_alignment != "left" {
                html.push_str(&format!(
                    " style=\"text-align: {}\"",
                    escape_html(&cell.props.text_alignment)
                ));
            }
            html.push('>');
            html.push_str(&html_inlines(&cell.content));
            html.push_str(&format!("</{tag}>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn is_flag_set(run: &InlineRun, style: &str) -> bool {
    matches!(run.styles.get(style), Some(StyleValue::Flag(true)))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
