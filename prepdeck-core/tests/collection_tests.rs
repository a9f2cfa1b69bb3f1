use async_trait::async_trait;
use prepdeck_core::records::{Note, StudyGoal, StudyPlan};
use prepdeck_core::repo::Query;
use prepdeck_core::{
    Collection, CoreError, LoadOutcome, MemoryStore, Record, RecordStore, Scope, SyncState, Table,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Delegates to a memory store; reads and/or writes can be made to fail.
#[derive(Default)]
struct Flaky {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl Flaky {
    fn check(&self, flag: &AtomicBool) -> Result<(), CoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(CoreError::Remote {
                status: 503,
                message: "unavailable".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for Flaky {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, CoreError> {
        self.check(&self.fail_reads)?;
        self.inner.select(table, query).await
    }
    async fn insert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.check(&self.fail_writes)?;
        self.inner.insert(table, row).await
    }
    async fn upsert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.check(&self.fail_writes)?;
        self.inner.upsert(table, row).await
    }
    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>, CoreError> {
        self.check(&self.fail_writes)?;
        self.inner.update(table, query, patch).await
    }
    async fn delete(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        self.check(&self.fail_writes)?;
        self.inner.delete(table, query).await
    }
    async fn count(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        self.check(&self.fail_reads)?;
        self.inner.count(table, query).await
    }
}

fn notes(store: &Arc<Flaky>) -> Collection<Note> {
    Collection::new(store.clone() as Arc<dyn RecordStore>, Scope::new())
}

#[tokio::test]
async fn empty_table_is_reported_as_empty_not_fallback() {
    let store = Arc::new(Flaky::default());
    let c = notes(&store);
    assert!(matches!(c.load().await, LoadOutcome::Empty));
    assert!(c.records().is_empty());
}

#[tokio::test]
async fn failed_load_shows_fallback_and_says_so() {
    let store = Arc::new(Flaky::default());
    store.fail_reads.store(true, Ordering::SeqCst);
    let c = notes(&store);
    let outcome = c.load().await;
    assert!(outcome.is_fallback());
    assert_eq!(c.records(), Note::fallback());
}

#[tokio::test]
async fn resubmitted_create_does_not_duplicate() {
    let store = Arc::new(Flaky::default());
    let c = notes(&store);
    let note = Note::new("Preamble", "Sovereign socialist secular...", "Polity");
    c.create(note.clone()).await.unwrap();
    c.create(note.clone()).await.unwrap();

    assert_eq!(store.count(Table::Notes, &Query::all()).await.unwrap(), 1);
    assert_eq!(c.records().len(), 1);
    assert_eq!(c.entries()[0].state, SyncState::Committed);
}

#[tokio::test]
async fn failed_create_rolls_back_and_names_the_action() {
    let store = Arc::new(Flaky::default());
    store.fail_writes.store(true, Ordering::SeqCst);
    let c = notes(&store);
    let err = c.create(Note::new("t", "c", "Polity")).await.unwrap_err();
    match err {
        CoreError::ActionFailed { action, .. } => assert_eq!(action, "save note"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(c.records().is_empty());
}

#[tokio::test]
async fn failed_update_restores_prior_value() {
    let store = Arc::new(Flaky::default());
    let c = notes(&store);
    let note = c.create(Note::new("Old", "c", "Polity")).await.unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);
    let mut edited = note.clone();
    edited.title = "New".into();
    assert!(c.update(edited).await.is_err());
    assert_eq!(c.get(note.id).unwrap().title, "Old");
    assert_eq!(c.entries()[0].state, SyncState::Committed);
}

#[tokio::test]
async fn toggle_flips_and_persists_the_field() {
    let store = Arc::new(Flaky::default());
    let c = notes(&store);
    let note = c.create(Note::new("t", "c", "Polity")).await.unwrap();

    let on = c.toggle(note.id, "is_favorite").await.unwrap();
    assert!(on.is_favorite);
    let off = c.toggle(note.id, "is_favorite").await.unwrap();
    assert!(!off.is_favorite);

    let remote: Note = prepdeck_core::repo::fetch_by_id(&*store, note.id).await.unwrap();
    assert!(!remote.is_favorite);

    assert!(matches!(c.toggle(note.id, "title").await, Err(CoreError::Invalid(_))));
}

#[tokio::test]
async fn failed_delete_restores_the_row() {
    let store = Arc::new(Flaky::default());
    let c = notes(&store);
    let note = c.create(Note::new("t", "c", "Polity")).await.unwrap();
    store.fail_writes.store(true, Ordering::SeqCst);
    assert!(c.delete(note.id).await.is_err());
    assert_eq!(c.records().len(), 1);

    store.fail_writes.store(false, Ordering::SeqCst);
    c.delete(note.id).await.unwrap();
    assert!(c.records().is_empty());
}

#[tokio::test]
async fn closed_scope_leaves_local_state_alone() {
    let store = Arc::new(Flaky::default());
    let scope = Scope::new();
    let c: Collection<Note> = Collection::new(store.clone() as Arc<dyn RecordStore>, scope.clone());
    scope.close();
    assert!(matches!(c.load().await, LoadOutcome::Cancelled));
    let err = c.create(Note::new("t", "c", "Polity")).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(c.entries().is_empty());
    assert_eq!(store.count(Table::Notes, &Query::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn closed_scope_refuses_edits_to_loaded_rows() {
    let store = Arc::new(Flaky::default());
    let note = Note::new("Budget", "Fiscal deficit targets", "Economy");
    store.inner.upsert(Table::Notes, serde_json::to_value(&note).unwrap()).await.unwrap();
    let scope = Scope::new();
    let c: Collection<Note> = Collection::new(store.clone() as Arc<dyn RecordStore>, scope.clone());
    assert!(matches!(c.load().await, LoadOutcome::Loaded(1)));
    scope.close();

    assert!(c.toggle(note.id, "is_favorite").await.unwrap_err().is_cancelled());
    assert!(c.delete(note.id).await.unwrap_err().is_cancelled());
    let entries = c.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].state, SyncState::Committed);
    assert!(!entries[0].record.is_favorite);
}

#[tokio::test]
async fn planner_toggle_writes_the_flipped_value() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let planner = prepdeck_core::planner::Planner::new(store.clone(), Scope::new());
    let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let plan = planner
        .add_plan(StudyPlan::new("Revise polity", "Polity", 60, date))
        .await
        .unwrap();

    planner.toggle_plan_completion(plan.id).await.unwrap();
    let done = planner.toggle_plan_completion(plan.id).await.unwrap();
    assert!(!done.completed);
    let remote: StudyPlan = prepdeck_core::repo::fetch_by_id(&*store, plan.id).await.unwrap();
    assert!(!remote.completed);

    let goal = planner
        .add_goal(StudyGoal::new("Finish GS II", date))
        .await
        .unwrap();
    let g = planner.update_goal_progress(goal.id, 140).await.unwrap();
    assert_eq!(g.progress, 100);
    assert!(g.achieved);
    let g = planner.update_goal_progress(goal.id, -5).await.unwrap();
    assert_eq!(g.progress, 0);
    assert!(!g.achieved);
}

#[tokio::test]
async fn deck_board_falls_back_to_sample_decks() {
    let store = Arc::new(Flaky::default());
    store.fail_reads.store(true, Ordering::SeqCst);
    let board = prepdeck_core::DeckBoard::new(store.clone() as Arc<dyn RecordStore>, Scope::new());
    let (decks, cards) = board.load().await;
    assert!(decks.is_fallback() && cards.is_fallback());

    let sample = board.decks();
    assert_eq!(sample.len(), prepdeck_core::Deck::fallback().len());
    let first = &sample[0];
    assert_eq!(board.find_deck(&first.name.to_uppercase()).map(|d| d.id), Some(first.id));
    let in_deck = board.cards_for(Some(first.id));
    assert_eq!(first.cards_count as usize, in_deck.len());
    assert!(in_deck.iter().all(|c| c.deck_id == first.id));
}

#[tokio::test]
async fn deck_board_counts_cards_per_deck() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let fc = prepdeck_core::Flashcards::new(store.clone());
    let deck = fc.create_deck("Polity", "Polity").await.unwrap();
    fc.add_card(deck.id, "Article 14?", "Equality before law", 2).await.unwrap();
    fc.add_card(deck.id, "Article 19?", "Six freedoms", 3).await.unwrap();

    let board = prepdeck_core::DeckBoard::new(store, Scope::new());
    let (decks, cards) = board.load().await;
    assert!(matches!(decks, LoadOutcome::Loaded(1)));
    assert!(matches!(cards, LoadOutcome::Loaded(2)));
    assert_eq!(board.decks()[0].cards_count, 2);
    assert!(board.find_deck("History").is_none());
}

#[tokio::test]
async fn session_history_falls_back_when_unreadable() {
    use prepdeck_core::ai::{ScriptedGenerator, TextGenerator};
    use prepdeck_core::practice::{AnswerPractice, InterviewLab};
    use prepdeck_core::records::{AnswerSession, InterviewSession};

    let store = Arc::new(Flaky::default());
    let ai: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::new());
    let answers = AnswerPractice::new(store.clone() as Arc<dyn RecordStore>, ai.clone());
    let interviews = InterviewLab::new(store.clone() as Arc<dyn RecordStore>, ai);

    let (rows, outcome) = answers.history(Scope::new()).await;
    assert!(matches!(outcome, LoadOutcome::Empty));
    assert!(rows.is_empty());

    store.fail_reads.store(true, Ordering::SeqCst);
    let (rows, outcome) = answers.history(Scope::new()).await;
    assert!(outcome.is_fallback());
    assert_eq!(rows, AnswerSession::fallback());
    let (rows, outcome) = interviews.history(Scope::new()).await;
    assert!(outcome.is_fallback());
    assert_eq!(rows, InterviewSession::fallback());
}
