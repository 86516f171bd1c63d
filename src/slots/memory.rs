//! In-memory collaborators
//!
//! Reference implementations of the store, watchlist, actor and permission
//! contracts. Revisions are kept per page title; commits use optimistic
//! concurrency on the current revision id.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use super::content::Content;
use super::error::StoreError;
use super::store::{
    Actor, ActorTraits, EditFlags, PageRef, PageResolver, PageStore, PageUpdater, PermissionChecker,
    Revision, RevisionId, WatchManager,
};
use super::MAIN_SLOT;

/// Characters that may not appear in a page title
const ILLEGAL_TITLE_CHARS: &[char] = &['{', '}', '[', ']', '|', '<', '>', '#'];

#[derive(Debug, Default)]
struct StoreState {
    pages: HashMap<String, Vec<Revision>>,
    tags: HashMap<RevisionId, Vec<String>>,
    flags: HashMap<RevisionId, EditFlags>,
    comments: HashMap<RevisionId, String>,
    next_id: u64,
    null_edits: usize,
    fail_null_edits: bool,
}

/// Revision store held in memory
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    state: RwLock<StoreState>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("page store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("page store lock poisoned".to_string()))
    }

    /// All revisions of `page`, oldest first
    pub fn history(&self, page: &PageRef) -> Vec<Revision> {
        self.read()
            .ok()
            .and_then(|state| state.pages.get(&page.title).cloned())
            .unwrap_or_default()
    }

    /// Change tags recorded for a revision
    pub fn tags(&self, revision: RevisionId) -> Vec<String> {
        self.read()
            .ok()
            .and_then(|state| state.tags.get(&revision).cloned())
            .unwrap_or_default()
    }

    pub fn flags(&self, revision: RevisionId) -> Option<EditFlags> {
        self.read().ok()?.flags.get(&revision).copied()
    }

    pub fn comment(&self, revision: RevisionId) -> Option<String> {
        self.read().ok()?.comments.get(&revision).cloned()
    }

    /// Number of commits that staged nothing
    pub fn null_edits(&self) -> usize {
        self.read().map(|state| state.null_edits).unwrap_or(0)
    }

    /// Make commits that stage nothing fail with a backend error
    pub fn set_fail_null_edits(&self, fail: bool) {
        if let Ok(mut state) = self.write() {
            state.fail_null_edits = fail;
        }
    }
}

impl PageStore for MemoryPageStore {
    fn current_revision(&self, page: &PageRef) -> Option<Revision> {
        self.read().ok()?.pages.get(&page.title)?.last().cloned()
    }

    fn new_edit_transaction<'s>(&'s self, page: &PageRef, actor: &Actor) -> Box<dyn PageUpdater + 's> {
        Box::new(MemoryUpdater {
            store: self,
            page: page.clone(),
            actor: actor.clone(),
            parent: self.current_revision(page),
            staged: IndexMap::new(),
            removed: Vec::new(),
            tags: Vec::new(),
            no_op: false,
        })
    }
}

impl PageResolver for MemoryPageStore {
    /// Any well-formed title resolves, whether or not the page exists
    fn resolve(&self, name: &str) -> Option<PageRef> {
        let title = name.trim();
        if title.is_empty() || title.contains(ILLEGAL_TITLE_CHARS) {
            return None;
        }
        Some(PageRef::new(title))
    }
}

/// Edit transaction of a [`MemoryPageStore`]
pub struct MemoryUpdater<'s> {
    store: &'s MemoryPageStore,
    page: PageRef,
    actor: Actor,
    parent: Option<Revision>,
    staged: IndexMap<String, Content>,
    removed: Vec<String>,
    tags: Vec<String>,
    no_op: bool,
}

impl PageUpdater for MemoryUpdater<'_> {
    fn parent_revision(&self) -> Option<&Revision> {
        self.parent.as_ref()
    }

    fn set_slot_content(&mut self, role: &str, content: Content) {
        self.removed.retain(|r| r != role);
        self.staged.insert(role.to_string(), content);
    }

    fn remove_slot(&mut self, role: &str) {
        self.staged.shift_remove(role);
        if !self.removed.iter().any(|r| r == role) {
            self.removed.push(role.to_string());
        }
    }

    fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    fn commit(&mut self, comment: &str, flags: EditFlags) -> Result<bool, StoreError> {
        let mut state = self.store.write()?;
        let null_edit = self.staged.is_empty() && self.removed.is_empty();

        if null_edit {
            if state.fail_null_edits {
                return Err(StoreError::Backend(format!(
                    "null edit of page '{}' rejected",
                    self.page
                )));
            }
            state.null_edits += 1;
        }

        let current = state.pages.get(&self.page.title).and_then(|h| h.last());
        let found = current.map(|r| r.id);
        let expected = self.parent.as_ref().map(|r| r.id);
        if found != expected {
            return Err(StoreError::EditConflict {
                page: self.page.title.clone(),
                expected: expected.map(|id| id.0),
                found: found.map(|id| id.0),
            });
        }

        let mut slots = current.map(|r| r.slots.clone()).unwrap_or_default();
        for role in &self.removed {
            slots.shift_remove(role);
        }
        for (role, content) in &self.staged {
            slots.insert(role.clone(), content.clone());
        }

        if !slots.contains_key(MAIN_SLOT) {
            return Err(StoreError::MissingMainSlot {
                page: self.page.title.clone(),
            });
        }

        if current.is_some_and(|r| r.slots == slots) {
            self.no_op = true;
            return Ok(false);
        }

        state.next_id += 1;
        let id = RevisionId(state.next_id);
        state.tags.insert(id, self.tags.clone());
        state.flags.insert(id, flags);
        state.comments.insert(id, comment.to_string());
        state
            .pages
            .entry(self.page.title.clone())
            .or_default()
            .push(Revision {
                id,
                slots: slots.clone(),
            });
        self.parent = Some(Revision { id, slots });

        tracing::debug!(page = %self.page, actor = %self.actor, revision = %id, "saved revision");
        Ok(true)
    }

    fn is_no_op(&self) -> bool {
        self.no_op
    }
}

/// Watchlist held in memory
#[derive(Debug, Default)]
pub struct MemoryWatchlist {
    watched: RwLock<HashSet<(String, String)>>,
}

impl MemoryWatchlist {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WatchManager for MemoryWatchlist {
    fn is_watching(&self, actor: &Actor, page: &PageRef) -> bool {
        self.watched
            .read()
            .map(|w| w.contains(&(actor.name.clone(), page.title.clone())))
            .unwrap_or(false)
    }

    fn set_watch(&self, watch: bool, actor: &Actor, page: &PageRef) {
        let Ok(mut watched) = self.watched.write() else {
            tracing::error!(%actor, %page, "watchlist lock poisoned");
            return;
        };
        let key = (actor.name.clone(), page.title.clone());
        if watch {
            watched.insert(key);
        } else {
            watched.remove(&key);
        }
    }
}

/// Stored preferences of one actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorPreferences {
    pub automated_agent: bool,
    pub watch_default: bool,
    pub watch_on_create: bool,
}

impl ActorPreferences {
    pub fn with_automated_agent(mut self, automated: bool) -> Self {
        self.automated_agent = automated;
        self
    }

    pub fn with_watch_default(mut self, watch: bool) -> Self {
        self.watch_default = watch;
        self
    }

    pub fn with_watch_on_create(mut self, watch: bool) -> Self {
        self.watch_on_create = watch;
        self
    }
}

/// Actor preferences held in memory; unknown actors have all preferences off
#[derive(Debug, Clone, Default)]
pub struct MemoryActors {
    actors: HashMap<String, ActorPreferences>,
}

impl MemoryActors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, name: impl Into<String>, preferences: ActorPreferences) -> Self {
        self.actors.insert(name.into(), preferences);
        self
    }

    fn preferences(&self, actor: &Actor) -> ActorPreferences {
        self.actors.get(&actor.name).copied().unwrap_or_default()
    }
}

impl ActorTraits for MemoryActors {
    fn is_automated_agent(&self, actor: &Actor) -> bool {
        self.preferences(actor).automated_agent
    }

    fn watch_default_preference(&self, actor: &Actor) -> bool {
        self.preferences(actor).watch_default
    }

    fn watch_on_create_preference(&self, actor: &Actor) -> bool {
        self.preferences(actor).watch_on_create
    }
}

/// Read permissions held in memory; everything is readable unless denied
#[derive(Debug, Clone, Default)]
pub struct MemoryPermissions {
    denied: HashSet<(String, String)>,
}

impl MemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(mut self, actor: impl Into<String>, page: impl Into<String>) -> Self {
        self.denied.insert((actor.into(), page.into()));
        self
    }
}

impl PermissionChecker for MemoryPermissions {
    fn can_read(&self, actor: &Actor, page: &PageRef) -> bool {
        !self
            .denied
            .contains(&(actor.name.clone(), page.title.clone()))
    }
}
