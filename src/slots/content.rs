//! Slot content and content models

use std::collections::HashMap;

use super::error::SlotError;
use super::store::PageRef;

/// Model identifier for wikitext
pub const MODEL_WIKITEXT: &str = "wikitext";
/// Model identifier for JSON
pub const MODEL_JSON: &str = "json";
/// Model identifier for plain text
pub const MODEL_TEXT: &str = "text";

/// How the text of a content model is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Wikitext,
    Json,
    /// Text that is neither wikitext nor JSON (CSS, JavaScript, plain text)
    Text,
    /// Content that has no meaningful text form
    Binary,
}

impl ContentKind {
    pub fn is_text(self) -> bool {
        !matches!(self, ContentKind::Binary)
    }
}

/// The content of one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    model: String,
    kind: ContentKind,
    text: String,
}

impl Content {
    pub fn new(model: impl Into<String>, kind: ContentKind, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            kind,
            text: text.into(),
        }
    }

    /// Content model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Whether the content is text-based and may be appended to
    pub fn is_plain_text(&self) -> bool {
        self.kind.is_text()
    }

    /// Serialized form of the content
    pub fn serialize(&self) -> &str {
        &self.text
    }

    /// Text for text-based content, `None` otherwise
    pub fn text(&self) -> Option<&str> {
        self.is_plain_text().then_some(self.text.as_str())
    }
}

/// Builds content objects for a content model
pub trait ContentFactory {
    fn make_content(&self, text: &str, page: &PageRef, model: &str) -> Result<Content, SlotError>;
}

/// Content factory backed by a table of known models
#[derive(Debug, Clone)]
pub struct StandardContentFactory {
    models: HashMap<String, ContentKind>,
}

impl Default for StandardContentFactory {
    fn default() -> Self {
        let models = [
            (MODEL_WIKITEXT, ContentKind::Wikitext),
            (MODEL_JSON, ContentKind::Json),
            (MODEL_TEXT, ContentKind::Text),
            ("css", ContentKind::Text),
            ("sanitized-css", ContentKind::Text),
            ("javascript", ContentKind::Text),
        ]
        .into_iter()
        .map(|(id, kind)| (id.to_string(), kind))
        .collect();

        Self { models }
    }
}

impl StandardContentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional content model
    pub fn with_model(mut self, model: impl Into<String>, kind: ContentKind) -> Self {
        self.models.insert(model.into(), kind);
        self
    }

    pub fn kind_of(&self, model: &str) -> Option<ContentKind> {
        self.models.get(model).copied()
    }
}

impl ContentFactory for StandardContentFactory {
    fn make_content(&self, text: &str, _page: &PageRef, model: &str) -> Result<Content, SlotError> {
        let kind = self
            .kind_of(model)
            .ok_or_else(|| SlotError::UnknownContentModel {
                model: model.to_string(),
            })?;
        Ok(Content::new(model, kind, text))
    }
}
