//! Block tree model.
//!
//! # Responsibility
//! - Define the canonical node of the editor document tree.
//! - Provide constructors for the safe fallback blocks.
//!
//! # Invariants
//! - `props`, `content` and `children` are always present.
//! - `extra` never contains `type`, `props`, `content` or `children`.
//! - No prop value is `null` (the JSON encoding of a not-a-number value).

use crate::model::inline::{inline_text, Inline, InlineRun};
use crate::model::table::{TableContent, DEFAULT_TEXT_ALIGNMENT};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Kind-specific block attributes (heading level, alignment, colors, ...).
pub type Props = Map<String, Value>;

/// Heading level used when the stored level is missing or out of range.
pub const DEFAULT_HEADING_LEVEL: u8 = 2;

/// Block kind resolved from the stored `type` (or legacy `name`) field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading,
    Table,
    /// Any kind whose content schema is owned by the editor.
    Other(String),
}

impl BlockKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "paragraph" => Self::Paragraph,
            "heading" => Self::Heading,
            "table" => Self::Table,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Table => "table",
            Self::Other(kind) => kind.as_str(),
        }
    }
}

impl Serialize for BlockKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Content slot of a block; its shape depends on the block kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockContent {
    /// Text-bearing kinds (`paragraph`, `heading`).
    Inline(Vec<Inline>),
    Table(TableContent),
    /// Content of kinds the engine does not know, passed through as stored.
    Opaque(Vec<Value>),
}

/// One canonical node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub props: Props,
    pub content: BlockContent,
    pub children: Vec<Block>,
    /// Fields the engine does not interpret (`id`, editor metadata).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// The universal fallback: one empty, left-aligned paragraph.
    pub fn blank_paragraph() -> Self {
        Self::paragraph(Vec::new())
    }

    pub fn paragraph(content: Vec<Inline>) -> Self {
        let mut props = Props::new();
        props.insert(
            "textAlignment".to_string(),
            Value::from(DEFAULT_TEXT_ALIGNMENT),
        );
        Self {
            kind: BlockKind::Paragraph,
            props,
            content: BlockContent::Inline(content),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Creates a heading holding one unstyled run.
    ///
    /// `level` is clamped into `1..=6`.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        let mut props = Props::new();
        props.insert("level".to_string(), Value::from(level.clamp(1, 6)));
        props.insert(
            "textAlignment".to_string(),
            Value::from(DEFAULT_TEXT_ALIGNMENT),
        );
        Self {
            kind: BlockKind::Heading,
            props,
            content: BlockContent::Inline(vec![Inline::Text(InlineRun::plain(text))]),
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn is_heading(&self) -> bool {
        self.kind == BlockKind::Heading
    }

    /// Heading level as stored in props, if this block carries one.
    pub fn level(&self) -> Option<u8> {
        self.props
            .get("level")
            .and_then(Value::as_u64)
            .and_then(|level| u8::try_from(level).ok())
    }

    /// Concatenated inline text of this block's own content.
    ///
    /// Tables and opaque content yield an empty string; children are not
    /// visited.
    pub fn inline_text(&self) -> String {
        match &self.content {
            BlockContent::Inline(items) => inline_text(items),
            BlockContent::Table(_) | BlockContent::Opaque(_) => String::new(),
        }
    }

    /// Stored string prop, e.g. `url` of a media block.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }
}
