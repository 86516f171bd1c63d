//! Collaborator contracts supplied by the host runtime
//!
//! The slot editor and reader never touch storage, watchlists or permissions
//! directly. Hosts implement these traits; [`super::memory`] provides in-memory
//! versions.

use std::fmt;

use indexmap::IndexMap;

use super::content::Content;
use super::error::StoreError;

/// Identity of a page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub title: String,
}

impl PageRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// The user or agent performing an operation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    pub name: String,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevisionId(pub u64);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable snapshot of all slots of a page
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub id: RevisionId,
    pub slots: IndexMap<String, Content>,
}

impl Revision {
    pub fn has_slot(&self, role: &str) -> bool {
        self.slots.contains_key(role)
    }

    pub fn slot_content(&self, role: &str) -> Option<&Content> {
        self.slots.get(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

/// Flags attached to a saved revision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditFlags {
    /// The edit was made by the extension rather than through the edit form
    pub internal: bool,
    pub bot: bool,
    pub minor: bool,
    /// Keep the edit out of recent changes
    pub suppress_rc: bool,
    /// Let the host generate a summary
    pub auto_summary: bool,
}

impl EditFlags {
    /// Flags for an extension-made edit
    pub fn internal() -> Self {
        Self {
            internal: true,
            ..Self::default()
        }
    }

    pub fn with_bot(mut self, bot: bool) -> Self {
        self.bot = bot;
        self
    }

    pub fn with_minor(mut self, minor: bool) -> Self {
        self.minor = minor;
        self
    }

    pub fn with_suppress_rc(mut self, suppress: bool) -> Self {
        self.suppress_rc = suppress;
        self
    }

    pub fn with_auto_summary(mut self, auto_summary: bool) -> Self {
        self.auto_summary = auto_summary;
        self
    }
}

/// Revision storage
pub trait PageStore {
    fn current_revision(&self, page: &PageRef) -> Option<Revision>;

    /// Open an edit transaction against the current revision of `page`
    fn new_edit_transaction<'s>(&'s self, page: &PageRef, actor: &Actor) -> Box<dyn PageUpdater + 's>;
}

/// A pending edit that becomes one revision on commit.
///
/// `commit` must be atomic: either every staged slot change is saved or none is.
pub trait PageUpdater {
    /// The revision this edit is based on, `None` for a page being created.
    ///
    /// `commit` fails with an edit conflict if the page moved past this revision.
    fn parent_revision(&self) -> Option<&Revision>;

    fn set_slot_content(&mut self, role: &str, content: Content);

    fn remove_slot(&mut self, role: &str);

    fn add_tag(&mut self, tag: &str);

    /// Save the staged changes; returns whether a new revision was created
    fn commit(&mut self, comment: &str, flags: EditFlags) -> Result<bool, StoreError>;

    /// After commit: whether the edit changed nothing
    fn is_no_op(&self) -> bool;
}

/// Watchlist storage
pub trait WatchManager {
    fn is_watching(&self, actor: &Actor, page: &PageRef) -> bool;

    fn set_watch(&self, watch: bool, actor: &Actor, page: &PageRef);
}

/// Per-actor facts used to resolve the `preferences` watch directive
pub trait ActorTraits {
    fn is_automated_agent(&self, actor: &Actor) -> bool;

    /// "Add pages I edit to my watchlist"
    fn watch_default_preference(&self, actor: &Actor) -> bool;

    /// "Add pages I create to my watchlist"
    fn watch_on_create_preference(&self, actor: &Actor) -> bool;
}

/// Resolves a page name given by a user to a page
pub trait PageResolver {
    fn resolve(&self, name: &str) -> Option<PageRef>;
}

/// Decides whether an actor may read a page
pub trait PermissionChecker {
    fn can_read(&self, actor: &Actor, page: &PageRef) -> bool;
}
