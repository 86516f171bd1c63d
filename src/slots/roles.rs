//! Slot role registry

use indexmap::IndexMap;

use crate::config::{SlotRoleLayout, SlotsConfig};

use super::store::PageRef;
use super::MAIN_SLOT;

/// Lookup of the slot roles a host knows about
pub trait SlotRoleRegistry {
    fn is_defined_role(&self, role: &str) -> bool;

    /// Content model for a new slot of this role, `None` for unknown roles
    fn default_content_model(&self, role: &str, page: &PageRef) -> Option<String>;

    /// All roles in definition order
    fn known_roles(&self) -> Vec<String>;
}

/// A registered slot role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    pub name: String,
    pub content_model: String,
    pub layout: SlotRoleLayout,
}

/// Registry of slot roles; the main role is always defined
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    roles: IndexMap<String, RoleDefinition>,
}

impl RoleRegistry {
    /// Create a registry holding only the main role
    pub fn new(main_model: impl Into<String>) -> Self {
        let mut roles = IndexMap::new();
        roles.insert(
            MAIN_SLOT.to_string(),
            RoleDefinition {
                name: MAIN_SLOT.to_string(),
                content_model: main_model.into(),
                layout: SlotRoleLayout::default(),
            },
        );
        Self { roles }
    }

    /// Create a registry with the main role and every configured slot
    pub fn from_config(config: &SlotsConfig) -> Self {
        let mut registry = Self::new(config.default_content_model.clone());
        registry.define_roles(config);
        registry
    }

    /// Define the configured slots, skipping roles that already exist
    pub fn define_roles(&mut self, config: &SlotsConfig) {
        for slot in &config.defined_slots {
            let defined =
                self.define_role_with_model(&slot.name, &slot.content_model, slot.layout.clone());
            if !defined {
                tracing::debug!(slot = %slot.name, "slot role already defined");
            }
        }
    }

    /// Define a role; returns false when the role already existed
    pub fn define_role_with_model(&mut self, name: &str, model: &str, layout: SlotRoleLayout) -> bool {
        if self.roles.contains_key(name) {
            return false;
        }
        self.roles.insert(
            name.to_string(),
            RoleDefinition {
                name: name.to_string(),
                content_model: model.to_string(),
                layout,
            },
        );
        true
    }

    pub fn get(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleDefinition> {
        self.roles.values()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::from_config(&SlotsConfig::default())
    }
}

impl SlotRoleRegistry for RoleRegistry {
    fn is_defined_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    fn default_content_model(&self, role: &str, _page: &PageRef) -> Option<String> {
        self.roles.get(role).map(|r| r.content_model.clone())
    }

    fn known_roles(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }
}
