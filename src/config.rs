//! Extension configuration
//!
//! Slots are configured from TOML. Every key is optional; missing keys fall back
//! to the values of the embedded default document.
//!
//! ```toml
//! default_content_model = "wikitext"
//! do_purge = true
//! slots_to_append = ["footer"]
//! defined_slots = ["notes", { name = "metadata", content_model = "json" }]
//!
//! [default_slot_role_layout]
//! display = "none"
//! region = "center"
//! placement = "append"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// How the host lays out a slot when displaying a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotRoleLayout {
    pub display: String,
    pub region: String,
    pub placement: String,
}

impl Default for SlotRoleLayout {
    fn default() -> Self {
        Self {
            display: "none".to_string(),
            region: "center".to_string(),
            placement: "append".to_string(),
        }
    }
}

/// A configured slot with its settings resolved against the defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDefinition {
    pub name: String,
    pub content_model: String,
    pub layout: SlotRoleLayout,
}

/// Configuration consumed by the role registry, the editor and the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotsConfig {
    /// Content model for slots that do not name one
    pub default_content_model: String,
    /// Layout for slots that do not name one
    pub default_slot_role_layout: SlotRoleLayout,
    /// Slots to register as roles
    pub defined_slots: Vec<SlotDefinition>,
    /// Perform a null edit after each changing edit
    pub do_purge: bool,
    /// Slots whose wikitext is appended to the main text when rendering
    pub slots_to_append: Vec<String>,
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
struct TomlConfig {
    default_content_model: Option<String>,
    default_slot_role_layout: Option<SlotRoleLayout>,
    #[serde(default)]
    defined_slots: Vec<TomlSlot>,
    do_purge: Option<bool>,
    slots_to_append: Option<Vec<String>>,
}

/// A slot is either a bare name or a table of settings; anything else is
/// kept as `Invalid` and skipped when the configuration is resolved
#[derive(Deserialize)]
#[serde(untagged)]
enum TomlSlot {
    Name(String),
    Settings {
        name: String,
        content_model: Option<String>,
        slot_role_layout: Option<SlotRoleLayout>,
    },
    Invalid(toml::Value),
}

const DEFAULT_CONFIG: &str = r#"
default_content_model = "wikitext"
do_purge = false
slots_to_append = []
defined_slots = []

[default_slot_role_layout]
display = "none"
region = "center"
placement = "append"
"#;

impl SlotsConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;

        let default_content_model = parsed
            .default_content_model
            .unwrap_or_else(|| "wikitext".to_string());
        let default_slot_role_layout = parsed.default_slot_role_layout.unwrap_or_default();

        let mut defined_slots = Vec::new();
        for slot in parsed.defined_slots {
            let (name, content_model, layout) = match slot {
                TomlSlot::Name(name) => (name, None, None),
                TomlSlot::Settings {
                    name,
                    content_model,
                    slot_role_layout,
                } => (name, content_model, slot_role_layout),
                TomlSlot::Invalid(entry) => {
                    tracing::warn!(%entry, "ignoring invalid slot definition");
                    continue;
                }
            };

            let name = name.trim().to_string();
            if name.is_empty() {
                tracing::warn!("ignoring slot definition without a name");
                continue;
            }

            defined_slots.push(SlotDefinition {
                name,
                content_model: content_model.unwrap_or_else(|| default_content_model.clone()),
                layout: layout.unwrap_or_else(|| default_slot_role_layout.clone()),
            });
        }

        Ok(SlotsConfig {
            default_content_model,
            default_slot_role_layout,
            defined_slots,
            do_purge: parsed.do_purge.unwrap_or(false),
            slots_to_append: parsed.slots_to_append.unwrap_or_default(),
        })
    }

    /// Add a slot with the default model and layout
    pub fn with_slot(mut self, name: impl Into<String>) -> Self {
        self.defined_slots.push(SlotDefinition {
            name: name.into(),
            content_model: self.default_content_model.clone(),
            layout: self.default_slot_role_layout.clone(),
        });
        self
    }

    /// Add a slot with an explicit content model
    pub fn with_slot_model(mut self, name: impl Into<String>, model: impl Into<String>) -> Self {
        self.defined_slots.push(SlotDefinition {
            name: name.into(),
            content_model: model.into(),
            layout: self.default_slot_role_layout.clone(),
        });
        self
    }

    /// Enable or disable the post-edit null edit
    pub fn with_purge(mut self, do_purge: bool) -> Self {
        self.do_purge = do_purge;
        self
    }

    /// Set the slots appended to the main text when rendering
    pub fn with_slots_to_append(mut self, slots: Vec<String>) -> Self {
        self.slots_to_append = slots;
        self
    }
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self::from_str(DEFAULT_CONFIG).expect("Default configuration should be valid TOML")
    }
}
