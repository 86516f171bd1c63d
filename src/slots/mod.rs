//! Multi-slot page editing and reading
//!
//! A page revision holds one or more named slots. The `main` slot exists on
//! every revision; other slots are registered roles with their own default
//! content model. Storage, watchlists, actor preferences and permissions are
//! reached only through the traits in [`store`].

pub mod content;
pub mod editor;
pub mod error;
pub mod memory;
pub mod reader;
pub mod roles;
pub mod store;
pub mod watch;

pub use content::{Content, ContentFactory, ContentKind, StandardContentFactory};
pub use editor::{defined_tags, EditOutcome, EditRequest, SlotEditor, SLOT_EDIT_TAG};
pub use error::{SlotError, StoreError};
pub use memory::{ActorPreferences, MemoryActors, MemoryPageStore, MemoryPermissions, MemoryWatchlist};
pub use reader::{find_block_by_value, transclusion_text, SlotReader};
pub use roles::{RoleDefinition, RoleRegistry, SlotRoleRegistry};
pub use store::{
    Actor, ActorTraits, EditFlags, PageRef, PageResolver, PageStore, PageUpdater, PermissionChecker,
    Revision, RevisionId, WatchManager,
};
pub use watch::{resolve_watch, WatchContext, WatchDirective};

/// Role name of the slot every revision must have
pub const MAIN_SLOT: &str = "main";
