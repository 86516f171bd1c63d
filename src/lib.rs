//! Wiki Slots - multi-slot page content and template data extraction
//!
//! This library provides template parsers for wikitext and an editor and reader
//! for pages whose revisions hold several named content slots.
//!
//! # Example
//!
//! ```rust
//! use wiki_slots::parse;
//!
//! let templates = parse("{{Infobox|Ada|born=1815}}");
//! assert_eq!(templates["Infobox"]["1"], "Ada");
//! assert_eq!(templates["Infobox"]["born"], "1815");
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod slots;

pub use config::{ConfigError, SlotDefinition, SlotRoleLayout, SlotsConfig};
pub use error::ParseError;
pub use parser::{
    parse, parse_tree, parse_with, templates_to_json, FlatTemplateParser, ParseStrategy,
    ParsedTemplates, RecursiveTemplateParser, TemplateMap, TemplateNode, DEFAULT_MAX_DEPTH,
    MAX_DEPTH_LIMIT,
};
pub use slots::{
    Actor, EditOutcome, EditRequest, PageRef, RoleRegistry, SlotEditor, SlotError, SlotReader,
    StandardContentFactory, WatchDirective, MAIN_SLOT,
};

/// Everything a host needs to edit and read slots, built from one configuration
///
/// # Example
///
/// ```rust
/// use wiki_slots::{Actor, EditRequest, PageRef, SlotsConfig, Workspace};
/// use wiki_slots::slots::{MemoryActors, MemoryPageStore, MemoryPermissions, MemoryWatchlist};
///
/// let config = SlotsConfig::default().with_slot("notes");
/// let workspace = Workspace::new(&config);
/// let store = MemoryPageStore::new();
/// let watchlist = MemoryWatchlist::new();
/// let actors = MemoryActors::new();
///
/// let editor = workspace.editor(&store, &watchlist, &actors);
/// let page = PageRef::new("Notebook");
/// let request = EditRequest::new().with_slot("notes", "remember the milk");
/// editor.edit_slots(&Actor::new("Alice"), &page, &request).unwrap();
///
/// let permissions = MemoryPermissions::new();
/// let reader = workspace.reader(&store, &store, &permissions);
/// let notes = reader.slot_text(&Actor::new("Alice"), "Notebook", "notes");
/// assert_eq!(notes.as_deref(), Some("remember the milk"));
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Registered slot roles
    pub roles: RoleRegistry,
    /// Content models known to the host
    pub contents: StandardContentFactory,
    /// Whether edits are followed by a refreshing null edit
    pub purge: bool,
    /// Slots appended to the main text when rendering
    pub slots_to_append: Vec<String>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new(&SlotsConfig::default())
    }
}

impl Workspace {
    /// Create a workspace from configuration
    pub fn new(config: &SlotsConfig) -> Self {
        Self {
            roles: RoleRegistry::from_config(config),
            contents: StandardContentFactory::new(),
            purge: config.do_purge,
            slots_to_append: config.slots_to_append.clone(),
        }
    }

    /// Set the content factory
    pub fn with_contents(mut self, contents: StandardContentFactory) -> Self {
        self.contents = contents;
        self
    }

    /// Create an editor over the given host collaborators
    pub fn editor<'a>(
        &'a self,
        store: &'a dyn slots::PageStore,
        watchlist: &'a dyn slots::WatchManager,
        actors: &'a dyn slots::ActorTraits,
    ) -> SlotEditor<'a> {
        SlotEditor::new(store, &self.roles, &self.contents, watchlist, actors).with_purge(self.purge)
    }

    /// Create a reader over the given host collaborators
    pub fn reader<'a>(
        &'a self,
        store: &'a dyn slots::PageStore,
        resolver: &'a dyn slots::PageResolver,
        permissions: &'a dyn slots::PermissionChecker,
    ) -> SlotReader<'a> {
        SlotReader::new(store, resolver, permissions)
    }

    /// Text of a page as rendered: the main text followed by the configured slots
    pub fn transclude(&self, revision: &slots::Revision, text: &str) -> String {
        slots::transclusion_text(revision, text, &self.slots_to_append)
    }
}
