//! Slot editing
//!
//! [`SlotEditor::edit_slots`] applies a batch of slot updates to a page as one
//! revision. Every slot is validated before anything is committed; the first
//! rejected slot aborts the whole batch.

use indexmap::IndexMap;

use super::content::{Content, ContentFactory, MODEL_WIKITEXT};
use super::error::SlotError;
use super::roles::SlotRoleRegistry;
use super::store::{Actor, ActorTraits, EditFlags, PageRef, PageStore, WatchManager};
use super::watch::{resolve_watch, WatchContext, WatchDirective};
use super::MAIN_SLOT;

/// Change tag attached to every revision that edits a non-main slot
pub const SLOT_EDIT_TAG: &str = "slot-edit";

/// Change tags that hosts must register
pub fn defined_tags() -> &'static [&'static str] {
    &[SLOT_EDIT_TAG]
}

/// A batch of slot updates and the options to apply them with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditRequest {
    /// Slot name -> new text, applied in insertion order
    pub slots: IndexMap<String, String>,
    pub summary: String,
    pub append: bool,
    pub prepend: bool,
    pub watch: WatchDirective,
    pub bot: bool,
    pub minor: bool,
    /// Do nothing when the page already exists
    pub create_only: bool,
    /// Do nothing when the page does not exist yet
    pub no_create: bool,
    /// Keep the edit out of recent changes
    pub suppress: bool,
}

impl EditRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the update for one slot
    pub fn with_slot(mut self, slot: impl Into<String>, text: impl Into<String>) -> Self {
        self.slots.insert(slot.into(), text.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn with_prepend(mut self, prepend: bool) -> Self {
        self.prepend = prepend;
        self
    }

    pub fn with_watch(mut self, watch: WatchDirective) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_bot(mut self, bot: bool) -> Self {
        self.bot = bot;
        self
    }

    pub fn with_minor(mut self, minor: bool) -> Self {
        self.minor = minor;
        self
    }

    pub fn with_create_only(mut self, create_only: bool) -> Self {
        self.create_only = create_only;
        self
    }

    pub fn with_no_create(mut self, no_create: bool) -> Self {
        self.no_create = no_create;
        self
    }

    pub fn with_suppress(mut self, suppress: bool) -> Self {
        self.suppress = suppress;
        self
    }

    fn flags(&self) -> EditFlags {
        EditFlags::internal()
            .with_bot(self.bot)
            .with_minor(self.minor)
            .with_suppress_rc(self.suppress)
    }

    /// Apply the append/prepend options to `text` given the current slot text
    fn merge(&self, current: &str, text: &str) -> String {
        let mut merged = current.to_string();
        if self.append {
            merged.push_str(text);
        }
        if self.prepend {
            merged.insert_str(0, text);
        }
        merged
    }
}

/// Result of a successful [`SlotEditor::edit_slots`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// `create_only`/`no_create` prevented the edit
    Skipped,
    /// The edit was committed but changed nothing
    Unchanged,
    /// A new revision was saved
    Saved,
}

/// Returns the content of `slot` in the current revision of `page`
pub fn get_slot_content(store: &dyn PageStore, page: &PageRef, slot: &str) -> Option<Content> {
    store.current_revision(page)?.slot_content(slot).cloned()
}

/// Applies slot updates through the injected collaborators
pub struct SlotEditor<'a> {
    store: &'a dyn PageStore,
    roles: &'a dyn SlotRoleRegistry,
    contents: &'a dyn ContentFactory,
    watchlist: &'a dyn WatchManager,
    actors: &'a dyn ActorTraits,
    purge: bool,
}

impl<'a> SlotEditor<'a> {
    pub fn new(
        store: &'a dyn PageStore,
        roles: &'a dyn SlotRoleRegistry,
        contents: &'a dyn ContentFactory,
        watchlist: &'a dyn WatchManager,
        actors: &'a dyn ActorTraits,
    ) -> Self {
        Self {
            store,
            roles,
            contents,
            watchlist,
            actors,
            purge: false,
        }
    }

    /// Perform a null edit after every changing edit so derived page data is rebuilt
    pub fn with_purge(mut self, purge: bool) -> Self {
        self.purge = purge;
        self
    }

    /// Returns the content of `slot` on `page`, if the page and slot exist
    pub fn get_slot_content(&self, page: &PageRef, slot: &str) -> Option<Content> {
        get_slot_content(self.store, page, slot)
    }

    /// Edit a single slot; any slots already in `options` are ignored
    pub fn edit_slot(
        &self,
        actor: &Actor,
        page: &PageRef,
        slot: &str,
        text: &str,
        options: EditRequest,
    ) -> Result<EditOutcome, SlotError> {
        let mut request = options;
        request.slots = IndexMap::from([(slot.to_string(), text.to_string())]);
        self.edit_slots(actor, page, &request)
    }

    /// Apply every slot update of `request` to `page` as one revision
    pub fn edit_slots(
        &self,
        actor: &Actor,
        page: &PageRef,
        request: &EditRequest,
    ) -> Result<EditOutcome, SlotError> {
        // Existing slots are read from the updater's parent; a commit by another
        // writer after this point fails as an edit conflict
        let mut updater = self.store.new_edit_transaction(page, actor);
        let current = updater.parent_revision().cloned();
        let exists = current.is_some();

        if (exists && request.create_only) || (!exists && request.no_create) {
            tracing::debug!(%page, exists, "edit skipped by create_only/no_create");
            return Ok(EditOutcome::Skipped);
        }

        for (slot, text) in &request.slots {
            tracing::debug!(%slot, %page, "editing slot");

            if !self.roles.is_defined_role(slot) {
                tracing::warn!(%slot, %page, "tried to edit an undefined slot");
                return Err(SlotError::unknown_slot(slot.as_str()));
            }

            let existing = current.as_ref().and_then(|r| r.slot_content(slot));

            let text = match existing {
                Some(content) if request.append || request.prepend => {
                    if !content.is_plain_text() {
                        tracing::warn!(
                            %slot,
                            model = content.model(),
                            %page,
                            "tried to append or prepend to non-text content"
                        );
                        return Err(SlotError::append_not_supported(
                            slot.as_str(),
                            content.model(),
                        ));
                    }
                    request.merge(content.serialize(), text)
                }
                _ => text.clone(),
            };

            if text.is_empty() && slot != MAIN_SLOT {
                tracing::debug!(%slot, "removing empty slot");
                updater.remove_slot(slot);
            } else {
                let model = match existing {
                    Some(content) => content.model().to_string(),
                    None => self
                        .roles
                        .default_content_model(slot, page)
                        .ok_or_else(|| SlotError::unknown_slot(slot.as_str()))?,
                };
                let content = self.contents.make_content(&text, page, &model)?;
                updater.set_slot_content(slot, content);
            }

            if slot != MAIN_SLOT {
                updater.add_tag(SLOT_EDIT_TAG);
            }
        }

        if !exists && !request.slots.contains_key(MAIN_SLOT) {
            tracing::debug!(%page, "setting empty main slot on new page");
            let model = self
                .roles
                .default_content_model(MAIN_SLOT, page)
                .unwrap_or_else(|| MODEL_WIKITEXT.to_string());
            let main = self.contents.make_content("", page, &model)?;
            updater.set_slot_content(MAIN_SLOT, main);
        }

        let saved = updater.commit(&request.summary, request.flags())?;
        let outcome = if saved && !updater.is_no_op() {
            EditOutcome::Saved
        } else {
            EditOutcome::Unchanged
        };
        tracing::debug!(%page, ?outcome, "committed slot edit");

        self.apply_watch(actor, page, request.watch, !exists);

        if outcome == EditOutcome::Saved && self.purge {
            self.refresh(actor, page);
        }

        Ok(outcome)
    }

    fn apply_watch(&self, actor: &Actor, page: &PageRef, directive: WatchDirective, created: bool) {
        let ctx = WatchContext {
            currently_watching: self.watchlist.is_watching(actor, page),
            automated_agent: self.actors.is_automated_agent(actor),
            watch_default: self.actors.watch_default_preference(actor),
            watch_on_create: self.actors.watch_on_create_preference(actor),
            page_created: created,
        };
        let watch = resolve_watch(directive, &ctx);
        self.watchlist.set_watch(watch, actor, page);
    }

    /// Null edit; failures do not affect the edit that triggered it
    fn refresh(&self, actor: &Actor, page: &PageRef) {
        tracing::debug!(%page, "refreshing page data");
        let flags = EditFlags::default()
            .with_suppress_rc(true)
            .with_auto_summary(true);
        let mut updater = self.store.new_edit_transaction(page, actor);
        if let Err(err) = updater.commit("", flags) {
            tracing::error!(%page, error = %err, "refresh null edit failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotsConfig;
    use crate::slots::content::{ContentKind, StandardContentFactory};
    use crate::slots::memory::{MemoryActors, MemoryPageStore, MemoryWatchlist};
    use crate::slots::roles::RoleRegistry;
    use crate::slots::store::PageUpdater;

    struct Fixture {
        store: MemoryPageStore,
        roles: RoleRegistry,
        contents: StandardContentFactory,
        watchlist: MemoryWatchlist,
        actors: MemoryActors,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SlotsConfig::default()
                .with_slot("notes")
                .with_slot_model("data", "json");
            Self {
                store: MemoryPageStore::new(),
                roles: RoleRegistry::from_config(&config),
                contents: StandardContentFactory::new(),
                watchlist: MemoryWatchlist::new(),
                actors: MemoryActors::new(),
            }
        }

        fn editor(&self) -> SlotEditor<'_> {
            SlotEditor::new(
                &self.store,
                &self.roles,
                &self.contents,
                &self.watchlist,
                &self.actors,
            )
        }

        fn seed(&self, page: &PageRef, slots: &[(&str, &str)]) {
            let mut request = EditRequest::new();
            for (slot, text) in slots {
                request = request.with_slot(*slot, *text);
            }
            self.editor()
                .edit_slots(&Actor::new("Seeder"), page, &request)
                .expect("seed edit");
        }

        fn text(&self, page: &PageRef, slot: &str) -> Option<String> {
            self.editor()
                .get_slot_content(page, slot)
                .map(|c| c.serialize().to_string())
        }
    }

    #[test]
    fn test_defined_tags() {
        assert_eq!(defined_tags(), &["slot-edit"]);
    }

    #[test]
    fn test_merge_append_then_prepend() {
        let request = EditRequest::new().with_append(true).with_prepend(true);
        assert_eq!(request.merge("cur", "x"), "xcurx");
        let append = EditRequest::new().with_append(true);
        assert_eq!(append.merge("cur", "x"), "curx");
        let prepend = EditRequest::new().with_prepend(true);
        assert_eq!(prepend.merge("cur", "x"), "xcur");
    }

    #[test]
    fn test_flags_from_request() {
        let flags = EditRequest::new()
            .with_bot(true)
            .with_suppress(true)
            .flags();
        assert!(flags.internal);
        assert!(flags.bot);
        assert!(!flags.minor);
        assert!(flags.suppress_rc);
        assert!(!flags.auto_summary);
    }

    #[test]
    fn test_create_only_on_existing_page_is_skipped() {
        let fx = Fixture::new();
        let page = PageRef::new("Existing");
        fx.seed(&page, &[("main", "Hello")]);

        let request = EditRequest::new()
            .with_slot("main", "Replaced")
            .with_create_only(true);
        let outcome = fx
            .editor()
            .edit_slots(&Actor::new("Alice"), &page, &request)
            .expect("skip is not an error");

        assert_eq!(outcome, EditOutcome::Skipped);
        assert_eq!(fx.text(&page, "main").as_deref(), Some("Hello"));
    }

    #[test]
    fn test_no_create_on_missing_page_is_skipped() {
        let fx = Fixture::new();
        let page = PageRef::new("Missing");
        let request = EditRequest::new()
            .with_slot("notes", "x")
            .with_no_create(true);
        let outcome = fx
            .editor()
            .edit_slots(&Actor::new("Alice"), &page, &request)
            .expect("skip is not an error");

        assert_eq!(outcome, EditOutcome::Skipped);
        assert!(fx.store.current_revision(&page).is_none());
    }

    #[test]
    fn test_unknown_slot_aborts_whole_batch() {
        let fx = Fixture::new();
        let page = PageRef::new("Batch");
        fx.seed(&page, &[("main", "Hello")]);

        let request = EditRequest::new()
            .with_slot("notes", "first")
            .with_slot("bogus", "second");
        let err = fx
            .editor()
            .edit_slots(&Actor::new("Alice"), &page, &request)
            .unwrap_err();

        assert_eq!(err, SlotError::unknown_slot("bogus"));
        assert_eq!(fx.store.history(&page).len(), 1);
        assert_eq!(fx.text(&page, "notes"), None);
    }

    #[test]
    fn test_existing_slot_keeps_its_model() {
        let fx = Fixture::new();
        let page = PageRef::new("Models");
        let actor = Actor::new("Alice");

        // Store text content in the "data" slot even though its role default is json
        let mut updater = fx.store.new_edit_transaction(&page, &actor);
        updater.set_slot_content("main", Content::new("wikitext", ContentKind::Wikitext, ""));
        updater.set_slot_content("data", Content::new("text", ContentKind::Text, "a"));
        updater
            .commit("", EditFlags::internal())
            .expect("seed commit");

        fx.editor()
            .edit_slot(&actor, &page, "data", "b", EditRequest::new())
            .expect("edit");

        let content = fx.editor().get_slot_content(&page, "data").expect("data slot");
        assert_eq!(content.model(), "text");
        assert_eq!(content.serialize(), "b");
    }

    #[test]
    fn test_new_slot_uses_role_default_model() {
        let fx = Fixture::new();
        let page = PageRef::new("Defaults");
        fx.editor()
            .edit_slot(&Actor::new("Alice"), &page, "data", "{}", EditRequest::new())
            .expect("edit");

        let content = fx.editor().get_slot_content(&page, "data").expect("data slot");
        assert_eq!(content.model(), "json");
        assert_eq!(content.kind(), ContentKind::Json);
    }

    #[test]
    fn test_non_main_edit_is_tagged() {
        let fx = Fixture::new();
        let page = PageRef::new("Tags");
        fx.seed(&page, &[("main", "Hello")]);
        let first = fx.store.history(&page)[0].id;
        assert!(fx.store.tags(first).is_empty());

        fx.editor()
            .edit_slot(&Actor::new("Alice"), &page, "notes", "n", EditRequest::new())
            .expect("edit");
        let second = fx.store.history(&page)[1].id;
        assert_eq!(fx.store.tags(second), vec![SLOT_EDIT_TAG.to_string()]);
    }

    #[test]
    fn test_unchanged_edit_reports_unchanged() {
        let fx = Fixture::new();
        let page = PageRef::new("Same");
        fx.seed(&page, &[("main", "Hello")]);

        let outcome = fx
            .editor()
            .edit_slot(&Actor::new("Alice"), &page, "main", "Hello", EditRequest::new())
            .expect("edit");
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(fx.store.history(&page).len(), 1);
    }

    #[test]
    fn test_purge_only_after_real_change() {
        let fx = Fixture::new();
        let page = PageRef::new("Purge");
        fx.seed(&page, &[("main", "Hello")]);
        let editor = fx.editor().with_purge(true);
        let actor = Actor::new("Alice");

        editor
            .edit_slot(&actor, &page, "main", "Hello", EditRequest::new())
            .expect("edit");
        assert_eq!(fx.store.null_edits(), 0);

        editor
            .edit_slot(&actor, &page, "main", "Changed", EditRequest::new())
            .expect("edit");
        assert_eq!(fx.store.null_edits(), 1);
        assert_eq!(fx.store.history(&page).len(), 2);
    }

    #[test]
    fn test_failed_refresh_does_not_fail_edit() {
        let fx = Fixture::new();
        let page = PageRef::new("Refresh");
        fx.store.set_fail_null_edits(true);

        let outcome = fx
            .editor()
            .with_purge(true)
            .edit_slot(&Actor::new("Alice"), &page, "main", "Hi", EditRequest::new())
            .expect("primary edit succeeds");
        assert_eq!(outcome, EditOutcome::Saved);
        assert_eq!(fx.text(&page, "main").as_deref(), Some("Hi"));
    }
}
