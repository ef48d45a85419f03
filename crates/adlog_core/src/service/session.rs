//! Editing session over one record.
//!
//! # Responsibility
//! - Hold the sections of one loaded record while the editor changes them.
//! - Canonicalize every inbound editor edit before it is kept.
//! - Derive section text and media attachments from edited blocks.
//!
//! # Invariants
//! - Section blocks held by a session are always canonical and non-empty.
//! - Sessions share no state; concurrent sessions on one record are last
//!   writer wins.

use crate::model::block::Block;
use crate::model::section::{Attachment, Section};
use crate::normalize::document::normalize_document_with;
use crate::normalize::limits::NormalizeLimits;
use crate::render::to_plain_text;
use crate::repo::record_store::RecordStore;
use crate::service::persistence::{EngineError, LoadedDocument, PersistenceAdapter, SaveOutcome};
use log::{info, warn};
use serde_json::{Map, Value};

/// Block kinds whose `url` prop points at an uploaded file.
const MEDIA_BLOCK_KINDS: &[&str] = &["image", "video", "audio", "file"];

#[derive(Debug, Clone)]
pub struct EditSession {
    record_id: String,
    sections: Vec<Section>,
    limits: NormalizeLimits,
    dirty: bool,
}

impl EditSession {
    /// Starts a session from an already loaded document.
    pub fn from_loaded(document: LoadedDocument) -> Self {
        Self {
            record_id: document.record.id,
            sections: document.sections,
            limits: NormalizeLimits::unbounded(),
            dirty: false,
        }
    }

    /// Loads `record_id` through `adapter` and starts a session on it.
    pub fn open<S: RecordStore>(
        adapter: &PersistenceAdapter<S>,
        record_id: &str,
    ) -> Result<Self, EngineError> {
        let document = adapter.load(record_id)?;
        let mut session = Self::from_loaded(document);
        session.limits = adapter.options().limits;
        Ok(session)
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces a section body with blocks emitted by the editor.
    ///
    /// The blocks are canonicalized; the section text and attachments are
    /// derived from them.
    ///
    /// # Errors
    /// - Returns `EngineError::UnknownSection` when no section has `section_id`.
    pub fn apply_edit(&mut self, section_id: &str, blocks: &Value) -> Result<&Section, EngineError> {
        let limits = self.limits;
        let section = self.section_mut(section_id)?;

        let normalized = normalize_document_with(blocks, limits);
        if !normalized.truncation.is_empty() {
            warn!(
                "event=section_edit module=service status=truncated section_id={section_id} dropped_blocks={} pruned_subtrees={}",
                normalized.truncation.dropped_blocks,
                normalized.truncation.pruned_subtrees
            );
        }
        section.text = to_plain_text(&normalized.blocks);
        section.attachments = collect_media(&normalized.blocks);
        section.blocks = normalized.blocks;
        self.dirty = true;

        self.section_ref(section_id)
    }

    pub fn set_title(&mut self, section_id: &str, title: impl Into<String>) -> Result<(), EngineError> {
        let section = self.section_mut(section_id)?;
        section.title = title.into();
        self.dirty = true;
        Ok(())
    }

    /// Saves all sections through `adapter` and clears the dirty flag.
    pub fn save<S: RecordStore>(
        &mut self,
        adapter: &mut PersistenceAdapter<S>,
    ) -> Result<SaveOutcome, EngineError> {
        let outcome = adapter.save(&self.record_id, &self.sections)?;
        self.dirty = false;
        info!(
            "event=session_save module=service status=ok record_id={} shape={} attempts={}",
            self.record_id,
            outcome.shape.as_str(),
            outcome.attempts
        );
        Ok(outcome)
    }

    fn section_mut(&mut self, section_id: &str) -> Result<&mut Section, EngineError> {
        self.sections
            .iter_mut()
            .find(|section| section.id == section_id)
            .ok_or_else(|| EngineError::UnknownSection(section_id.to_string()))
    }

    fn section_ref(&self, section_id: &str) -> Result<&Section, EngineError> {
        self.section(section_id)
            .ok_or_else(|| EngineError::UnknownSection(section_id.to_string()))
    }
}

/// Attachments referenced by media blocks, in document order.
pub fn collect_media(blocks: &[Block]) -> Vec<Attachment> {
    let mut media = Vec::new();
    for block in blocks {
        collect_media_into(block, &mut media);
    }
    media
}

fn collect_media_into(block: &Block, media: &mut Vec<Attachment>) {
    let kind = block.kind.as_str();
    if MEDIA_BLOCK_KINDS.contains(&kind) {
        if let Some(url) = block.prop_str("url").filter(|url| !url.trim().is_empty()) {
            let mut extra = Map::new();
            if let Some(caption) = block.prop_str("caption").filter(|caption| !caption.is_empty()) {
                extra.insert("caption".to_string(), Value::from(caption));
            }
            media.push(Attachment {
                id: block
                    .extra
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                kind: Some(kind.to_string()),
                url: Some(url.to_string()),
                name: block.prop_str("name").map(str::to_string),
                width: block
                    .props
                    .get("previewWidth")
                    .and_then(Value::as_u64)
                    .and_then(|width| u32::try_from(width).ok()),
                height: None,
                duration: None,
                extra,
            });
        }
    }
    for child in &block.children {
        collect_media_into(child, media);
    }
}
