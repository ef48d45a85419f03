//! Canonical table content model.
//!
//! # Invariants
//! - `column_widths` entries are positive.
//! - `colspan`/`rowspan` are either absent or >= 1; absence means "unset".
//! - Every cell has a `text_alignment`.

use crate::model::inline::{inline_text, Inline};
use serde::Serialize;
use serde_json::{Map, Value};

/// Width assigned to a column whose stored width is unusable.
pub const DEFAULT_COLUMN_WIDTH: f64 = 160.0;
/// Alignment assigned to cells and text blocks that do not declare one.
pub const DEFAULT_TEXT_ALIGNMENT: &str = "left";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableContentTag {
    #[serde(rename = "tableContent")]
    TableContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TableCellTag {
    #[serde(rename = "tableCell")]
    TableCell,
}

/// Grid content of a `table` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableContent {
    #[serde(rename = "type")]
    pub tag: TableContentTag,
    pub column_widths: Vec<f64>,
    pub header_rows: u32,
    pub rows: Vec<TableRow>,
}

impl TableContent {
    /// Degenerate table used whenever no grid can be recovered.
    pub fn empty() -> Self {
        Self {
            tag: TableContentTag::TableContent,
            column_widths: Vec::new(),
            header_rows: 0,
            rows: Vec::new(),
        }
    }

    /// Number of cells in the widest row.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.cells.len())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    #[serde(rename = "type")]
    pub tag: TableCellTag,
    pub props: CellProps,
    pub content: Vec<Inline>,
    /// Unknown cell fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableCell {
    /// Creates a left-aligned cell with the given inline content.
    pub fn with_content(content: Vec<Inline>) -> Self {
        Self {
            tag: TableCellTag::TableCell,
            props: CellProps::default(),
            content,
            extra: Map::new(),
        }
    }

    pub fn text(&self) -> String {
        inline_text(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
    pub text_alignment: String,
    /// Remaining cell attributes (colors, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CellProps {
    fn default() -> Self {
        Self {
            colspan: None,
            rowspan: None,
            text_alignment: DEFAULT_TEXT_ALIGNMENT.to_string(),
            extra: Map::new(),
        }
    }
}
