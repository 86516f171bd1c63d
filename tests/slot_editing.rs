//! End-to-end tests for slot editing with the in-memory collaborators

use std::cell::Cell;

use pretty_assertions::assert_eq;

use wiki_slots::slots::{
    ActorPreferences, Content, ContentKind, EditFlags, MemoryActors, MemoryPageStore,
    MemoryWatchlist, PageStore, PageUpdater, Revision, StoreError, WatchManager, SLOT_EDIT_TAG,
};
use wiki_slots::{
    Actor, EditOutcome, EditRequest, PageRef, SlotError, SlotsConfig, WatchDirective, Workspace,
    MAIN_SLOT,
};

struct Wiki {
    workspace: Workspace,
    store: MemoryPageStore,
    watchlist: MemoryWatchlist,
    actors: MemoryActors,
}

impl Wiki {
    fn new() -> Self {
        Self::with_config(
            SlotsConfig::default()
                .with_slot("notes")
                .with_slot_model("data", "json")
                .with_slot_model("blob", "image"),
        )
    }

    fn with_config(config: SlotsConfig) -> Self {
        let workspace = Workspace::new(&config).with_contents(
            wiki_slots::StandardContentFactory::new().with_model("image", ContentKind::Binary),
        );
        Self {
            workspace,
            store: MemoryPageStore::new(),
            watchlist: MemoryWatchlist::new(),
            actors: MemoryActors::new()
                .with_actor(
                    "Watcher",
                    ActorPreferences::default().with_watch_default(true),
                )
                .with_actor(
                    "Creator",
                    ActorPreferences::default().with_watch_on_create(true),
                )
                .with_actor(
                    "Bot",
                    ActorPreferences::default()
                        .with_automated_agent(true)
                        .with_watch_default(true),
                ),
        }
    }

    fn edit(&self, actor: &str, page: &PageRef, request: EditRequest) -> Result<EditOutcome, SlotError> {
        self.workspace
            .editor(&self.store, &self.watchlist, &self.actors)
            .edit_slots(&Actor::new(actor), page, &request)
    }

    fn text(&self, page: &PageRef, slot: &str) -> Option<String> {
        self.store
            .current_revision(page)?
            .slot_content(slot)
            .map(|c| c.serialize().to_string())
    }

    fn watching(&self, actor: &str, page: &PageRef) -> bool {
        self.watchlist.is_watching(&Actor::new(actor), page)
    }
}

#[test]
fn test_new_page_with_only_non_main_slot_gets_empty_main() {
    let wiki = Wiki::new();
    let page = PageRef::new("Fresh");

    let outcome = wiki
        .edit("Alice", &page, EditRequest::new().with_slot("notes", "Some notes"))
        .expect("edit");

    assert_eq!(outcome, EditOutcome::Saved);
    let revision = wiki.store.current_revision(&page).expect("page created");
    assert_eq!(revision.roles().collect::<Vec<_>>(), vec!["notes", MAIN_SLOT]);
    assert_eq!(wiki.text(&page, MAIN_SLOT).as_deref(), Some(""));
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("Some notes"));
    assert_eq!(wiki.store.tags(revision.id), vec![SLOT_EDIT_TAG.to_string()]);
}

#[test]
fn test_unknown_slot_performs_no_writes() {
    let wiki = Wiki::new();
    let page = PageRef::new("Unknown");

    let err = wiki
        .edit("Alice", &page, EditRequest::new().with_slot("bogus", "text"))
        .unwrap_err();

    assert_eq!(err.code(), "unknownslot");
    assert!(err.to_string().contains("bogus"));
    assert!(wiki.store.current_revision(&page).is_none());
}

#[test]
fn test_append_to_non_text_slot_is_rejected() {
    let wiki = Wiki::new();
    let page = PageRef::new("Binary");
    wiki.edit("Alice", &page, EditRequest::new().with_slot("blob", "\u{89}PNG"))
        .expect("seed");

    let err = wiki
        .edit(
            "Alice",
            &page,
            EditRequest::new().with_slot("blob", "more").with_append(true),
        )
        .unwrap_err();

    assert_eq!(err, SlotError::append_not_supported("blob", "image"));
    assert_eq!(err.model(), Some("image"));
    assert_eq!(wiki.store.history(&page).len(), 1);
    assert_eq!(wiki.text(&page, "blob").as_deref(), Some("\u{89}PNG"));
}

#[test]
fn test_append_and_prepend() {
    let wiki = Wiki::new();
    let page = PageRef::new("Merge");
    wiki.edit("Alice", &page, EditRequest::new().with_slot("notes", "middle"))
        .expect("seed");

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new().with_slot("notes", " end").with_append(true),
    )
    .expect("append");
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("middle end"));

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new().with_slot("notes", "start ").with_prepend(true),
    )
    .expect("prepend");
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("start middle end"));
}

#[test]
fn test_append_to_missing_slot_writes_text() {
    let wiki = Wiki::new();
    let page = PageRef::new("AppendNew");
    wiki.edit(
        "Alice",
        &page,
        EditRequest::new().with_slot("notes", "first").with_append(true),
    )
    .expect("edit");
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("first"));
}

#[test]
fn test_empty_text_removes_slot_but_not_main() {
    let wiki = Wiki::new();
    let page = PageRef::new("Removal");
    wiki.edit(
        "Alice",
        &page,
        EditRequest::new()
            .with_slot(MAIN_SLOT, "Body")
            .with_slot("notes", "Notes"),
    )
    .expect("seed");

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new()
            .with_slot(MAIN_SLOT, "")
            .with_slot("notes", ""),
    )
    .expect("edit");

    let revision = wiki.store.current_revision(&page).expect("revision");
    assert!(!revision.has_slot("notes"));
    assert_eq!(wiki.text(&page, MAIN_SLOT).as_deref(), Some(""));
}

#[test]
fn test_batch_is_one_revision() {
    let wiki = Wiki::new();
    let page = PageRef::new("Batch");

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new()
            .with_slot(MAIN_SLOT, "Body")
            .with_slot("notes", "Notes")
            .with_slot("data", r#"{"a": 1}"#)
            .with_summary("set everything")
            .with_minor(true),
    )
    .expect("edit");

    let history = wiki.store.history(&page);
    assert_eq!(history.len(), 1);
    let id = history[0].id;
    assert_eq!(wiki.store.comment(id).as_deref(), Some("set everything"));
    let flags = wiki.store.flags(id).expect("flags recorded");
    assert!(flags.internal);
    assert!(flags.minor);
    assert!(!flags.bot);
    assert_eq!(
        history[0].slot_content("data").map(|c| c.model()),
        Some("json")
    );
}

#[test]
fn test_create_only_and_no_create() {
    let wiki = Wiki::new();
    let page = PageRef::new("Guarded");

    let skipped = wiki
        .edit(
            "Alice",
            &page,
            EditRequest::new().with_slot("notes", "x").with_no_create(true),
        )
        .expect("skip");
    assert_eq!(skipped, EditOutcome::Skipped);
    assert!(wiki.store.current_revision(&page).is_none());

    let created = wiki
        .edit(
            "Alice",
            &page,
            EditRequest::new().with_slot("notes", "x").with_create_only(true),
        )
        .expect("create");
    assert_eq!(created, EditOutcome::Saved);

    let skipped = wiki
        .edit(
            "Alice",
            &page,
            EditRequest::new().with_slot("notes", "y").with_create_only(true),
        )
        .expect("skip");
    assert_eq!(skipped, EditOutcome::Skipped);
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("x"));
}

#[test]
fn test_watch_directives() {
    let wiki = Wiki::new();
    let page = PageRef::new("Watched");

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new()
            .with_slot("notes", "a")
            .with_watch(WatchDirective::Watch),
    )
    .expect("edit");
    assert!(wiki.watching("Alice", &page));

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new()
            .with_slot("notes", "b")
            .with_watch("bogus".parse::<WatchDirective>().unwrap_or_default()),
    )
    .expect("edit");
    assert!(wiki.watching("Alice", &page));

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new()
            .with_slot("notes", "c")
            .with_watch(WatchDirective::Unwatch),
    )
    .expect("edit");
    assert!(!wiki.watching("Alice", &page));
}

#[test]
fn test_watch_preferences() {
    let wiki = Wiki::new();
    let existing = PageRef::new("Existing");
    wiki.edit("Alice", &existing, EditRequest::new().with_slot("notes", "a"))
        .expect("seed");

    let prefs = |slot_text: &str| {
        EditRequest::new()
            .with_slot("notes", slot_text)
            .with_watch(WatchDirective::Preferences)
    };

    wiki.edit("Watcher", &existing, prefs("b")).expect("edit");
    assert!(wiki.watching("Watcher", &existing));

    wiki.edit("Creator", &existing, prefs("c")).expect("edit");
    assert!(!wiki.watching("Creator", &existing));

    let created = PageRef::new("Created");
    wiki.edit("Creator", &created, prefs("d")).expect("edit");
    assert!(wiki.watching("Creator", &created));

    wiki.edit("Bot", &existing, prefs("e")).expect("edit");
    assert!(!wiki.watching("Bot", &existing));
}

#[test]
fn test_purge_from_config() {
    let wiki = Wiki::with_config(SlotsConfig::default().with_slot("notes").with_purge(true));
    let page = PageRef::new("Purged");

    wiki.edit("Alice", &page, EditRequest::new().with_slot("notes", "a"))
        .expect("edit");
    assert_eq!(wiki.store.null_edits(), 1);

    let outcome = wiki
        .edit("Alice", &page, EditRequest::new().with_slot("notes", "a"))
        .expect("edit");
    assert_eq!(outcome, EditOutcome::Unchanged);
    assert_eq!(wiki.store.null_edits(), 1);
    assert_eq!(wiki.store.history(&page).len(), 1);
}

/// When another writer commits relative to an edit transaction
#[derive(Clone, Copy)]
enum Race {
    /// Just before the transaction is opened
    BeforeOpen,
    /// Between opening the transaction and committing it
    BeforeCommit,
}

/// Store that lets "Bob" append "+BOB" to the notes slot once, at the chosen moment
struct RacyStore<'w> {
    inner: &'w MemoryPageStore,
    race: Race,
    raced: Cell<bool>,
}

impl<'w> RacyStore<'w> {
    fn new(inner: &'w MemoryPageStore, race: Race) -> Self {
        Self {
            inner,
            race,
            raced: Cell::new(false),
        }
    }
}

fn bob_appends(store: &MemoryPageStore, page: &PageRef) {
    let mut updater = store.new_edit_transaction(page, &Actor::new("Bob"));
    let notes = updater
        .parent_revision()
        .and_then(|r| r.slot_content("notes"))
        .map(|c| c.serialize().to_string())
        .unwrap_or_default();
    updater.set_slot_content(
        "notes",
        Content::new("wikitext", ContentKind::Wikitext, format!("{notes}+BOB")),
    );
    updater
        .commit("bob", EditFlags::internal())
        .expect("bob commits");
}

impl PageStore for RacyStore<'_> {
    fn current_revision(&self, page: &PageRef) -> Option<Revision> {
        self.inner.current_revision(page)
    }

    fn new_edit_transaction<'s>(&'s self, page: &PageRef, actor: &Actor) -> Box<dyn PageUpdater + 's> {
        let first = !self.raced.replace(true);
        if first && matches!(self.race, Race::BeforeOpen) {
            bob_appends(self.inner, page);
        }
        Box::new(RacyUpdater {
            inner: self.inner.new_edit_transaction(page, actor),
            store: self.inner,
            page: page.clone(),
            race_on_commit: first && matches!(self.race, Race::BeforeCommit),
        })
    }
}

struct RacyUpdater<'s> {
    inner: Box<dyn PageUpdater + 's>,
    store: &'s MemoryPageStore,
    page: PageRef,
    race_on_commit: bool,
}

impl PageUpdater for RacyUpdater<'_> {
    fn parent_revision(&self) -> Option<&Revision> {
        self.inner.parent_revision()
    }

    fn set_slot_content(&mut self, role: &str, content: Content) {
        self.inner.set_slot_content(role, content);
    }

    fn remove_slot(&mut self, role: &str) {
        self.inner.remove_slot(role);
    }

    fn add_tag(&mut self, tag: &str) {
        self.inner.add_tag(tag);
    }

    fn commit(&mut self, comment: &str, flags: EditFlags) -> Result<bool, StoreError> {
        if self.race_on_commit {
            bob_appends(self.store, &self.page);
        }
        self.inner.commit(comment, flags)
    }

    fn is_no_op(&self) -> bool {
        self.inner.is_no_op()
    }
}

#[test]
fn test_append_builds_on_latest_revision() {
    let wiki = Wiki::new();
    let page = PageRef::new("Race");
    wiki.edit("Alice", &page, EditRequest::new().with_slot("notes", "a"))
        .expect("seed");

    let racy = RacyStore::new(&wiki.store, Race::BeforeOpen);
    let outcome = wiki
        .workspace
        .editor(&racy, &wiki.watchlist, &wiki.actors)
        .edit_slots(
            &Actor::new("Alice"),
            &page,
            &EditRequest::new().with_slot("notes", "+ALICE").with_append(true),
        )
        .expect("edit");

    assert_eq!(outcome, EditOutcome::Saved);
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("a+BOB+ALICE"));
    assert_eq!(wiki.store.history(&page).len(), 3);
}

#[test]
fn test_edit_conflict_is_passed_through() {
    let wiki = Wiki::new();
    let page = PageRef::new("Race");
    wiki.edit("Alice", &page, EditRequest::new().with_slot("notes", "a"))
        .expect("seed");

    let racy = RacyStore::new(&wiki.store, Race::BeforeCommit);
    let err = wiki
        .workspace
        .editor(&racy, &wiki.watchlist, &wiki.actors)
        .edit_slots(
            &Actor::new("Alice"),
            &page,
            &EditRequest::new().with_slot("notes", "+ALICE").with_append(true),
        )
        .unwrap_err();

    assert_eq!(
        err,
        SlotError::Store(StoreError::EditConflict {
            page: "Race".to_string(),
            expected: Some(1),
            found: Some(2),
        })
    );
    assert_eq!(err.code(), "editconflict");
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("a+BOB"));
}

#[test]
fn test_append_and_prepend_together() {
    let wiki = Wiki::new();
    let page = PageRef::new("Wrap");
    wiki.edit("Alice", &page, EditRequest::new().with_slot("notes", "body"))
        .expect("seed");

    wiki.edit(
        "Alice",
        &page,
        EditRequest::new()
            .with_slot("notes", "|")
            .with_append(true)
            .with_prepend(true),
    )
    .expect("edit");
    assert_eq!(wiki.text(&page, "notes").as_deref(), Some("|body|"));
}
