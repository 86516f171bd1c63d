//! Error types for slot editing and reading

use thiserror::Error;

/// Failures signalled by a page store.
///
/// These are passed through to the caller unchanged; the editor never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The page changed since the edit transaction was opened
    #[error("edit conflict on page '{page}': expected base revision {expected:?}, found {found:?}")]
    EditConflict {
        page: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    /// A revision must always contain the main slot
    #[error("revision of page '{page}' has no main slot")]
    MissingMainSlot { page: String },

    /// Any other storage failure
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::EditConflict { .. } => "editconflict",
            StoreError::MissingMainSlot { .. } => "nomainslot",
            StoreError::Backend(_) => "storageerror",
        }
    }
}

/// Errors returned by slot operations.
///
/// `Display` gives the human-readable message and [`SlotError::code`] the
/// machine-readable code adapters put into protocol responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The slot name is not a registered role
    #[error("the slot '{slot}' does not exist")]
    UnknownSlot { slot: String },

    /// Append or prepend on content that is not text
    #[error("cannot append to or prepend to slot '{slot}': content model '{model}' is not text")]
    AppendNotSupported { slot: String, model: String },

    /// The content factory does not know the model
    #[error("unknown content model '{model}'")]
    UnknownContentModel { model: String },

    /// The page has no revision or the revision lacks the slot
    #[error("the slot '{slot}' does not exist on page '{page}'")]
    SlotDoesNotExist { slot: String, page: String },

    /// The slot holds content that cannot be returned as text
    #[error("the content model '{model}' of slot '{slot}' is not text")]
    NotText { slot: String, model: String },

    /// The actor may not read the page
    #[error("you do not have permission to read page '{page}'")]
    PermissionDenied { page: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SlotError {
    pub fn unknown_slot(slot: impl Into<String>) -> Self {
        Self::UnknownSlot { slot: slot.into() }
    }

    pub fn append_not_supported(slot: impl Into<String>, model: impl Into<String>) -> Self {
        Self::AppendNotSupported {
            slot: slot.into(),
            model: model.into(),
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            SlotError::UnknownSlot { .. } => "unknownslot",
            SlotError::AppendNotSupported { .. } => "appendnotsupported",
            SlotError::UnknownContentModel { .. } => "unknowncontentmodel",
            SlotError::SlotDoesNotExist { .. } => "slotdoesnotexist",
            SlotError::NotText { .. } => "nottext",
            SlotError::PermissionDenied { .. } => "permissiondenied",
            SlotError::Store(e) => e.code(),
        }
    }

    /// Content model carried by the error, if any
    pub fn model(&self) -> Option<&str> {
        match self {
            SlotError::AppendNotSupported { model, .. }
            | SlotError::UnknownContentModel { model }
            | SlotError::NotText { model, .. } => Some(model),
            _ => None,
        }
    }

    /// The (message, code) pair adapters report to users
    pub fn to_message_code(&self) -> (String, &'static str) {
        (self.to_string(), self.code())
    }
}
