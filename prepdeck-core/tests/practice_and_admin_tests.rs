use async_trait::async_trait;
use chrono::{Duration, Utc};
use prepdeck_core::admin::{ai_settings, require_admin, save_ai_settings, user_stats, Moderation};
use prepdeck_core::ai::{ScriptedGenerator, TextGenerator};
use prepdeck_core::practice::{AnswerPractice, Countdown, InterviewLab, QUESTION_SECONDS};
use prepdeck_core::records::*;
use prepdeck_core::repo::{self, Query};
use prepdeck_core::{rate_card, CoreError, Deck, Flashcard, Flashcards, MemoryStore, Rating, RecordStore, Scope, Table};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A memory store whose upserts into one table fail.
struct FailOn {
    inner: MemoryStore,
    table: Table,
}

impl FailOn {
    fn new(table: Table) -> Self {
        Self {
            inner: MemoryStore::new(),
            table,
        }
    }
}

#[async_trait]
impl RecordStore for FailOn {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, CoreError> {
        self.inner.select(table, query).await
    }
    async fn insert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.inner.insert(table, row).await
    }
    async fn upsert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        if table == self.table {
            return Err(CoreError::Storage("disk full"));
        }
        self.inner.upsert(table, row).await
    }
    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>, CoreError> {
        self.inner.update(table, query, patch).await
    }
    async fn delete(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        self.inner.delete(table, query).await
    }
    async fn count(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        self.inner.count(table, query).await
    }
}

fn question(text: &str) -> PracticeQuestion {
    PracticeQuestion {
        id: Uuid::new_v4(),
        question: text.into(),
        topic: "Federalism".into(),
        word_limit: 150,
        marks: 10,
        subject: "Polity".into(),
    }
}

fn profile(role: Role, last_active_days_ago: Option<i64>, premium: bool, created_days_ago: i64) -> Profile {
    let now = Utc::now();
    Profile {
        id: Uuid::new_v4(),
        username: "u".into(),
        full_name: String::new(),
        role,
        subscription_status: premium.then(|| "premium".to_string()),
        last_active: last_active_days_ago.map(|d| now - Duration::days(d)),
        created_at: now - Duration::days(created_days_ago),
    }
}

#[tokio::test]
async fn answer_submission_scores_and_writes_both_rows() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let ai: Arc<dyn TextGenerator> = Arc::new(
        ScriptedGenerator::new()
            .reply(r#"{"score": 6, "structure": 7, "content": 5, "feedback": "Cite articles."}"#),
    );
    let practice = AnswerPractice::new(store.clone(), ai);
    let session = AnswerSession::new("GS II", vec![question("Finance Commission?")], 10);

    let mut clock = Countdown::new(QUESTION_SECONDS);
    clock.advance(90);
    let out = practice
        .submit_answer(&session, "It divides taxes between the Union and States.", &clock)
        .await
        .unwrap();

    assert_eq!(out.answer.word_count, 8);
    assert_eq!(out.answer.time_taken_secs, 90);
    assert_eq!(out.answer.score, 6);
    assert!(out.finished);
    assert_eq!(out.session.answers.len(), 1);
    assert_eq!(store.count(Table::Answers, &Query::all()).await.unwrap(), 1);
    let saved: AnswerSession = repo::fetch_by_id(&*store, session.id).await.unwrap();
    assert_eq!(saved.answers.len(), 1);
}

#[tokio::test]
async fn evaluation_failure_names_the_action() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let ai: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::new().fail(CoreError::Remote {
        status: 500,
        message: "boom".into(),
    }));
    let practice = AnswerPractice::new(store.clone(), ai);
    let session = AnswerSession::new("GS II", vec![question("Q")], 10);
    let err = practice
        .submit_answer(&session, "text", &Countdown::new(QUESTION_SECONDS))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ActionFailed { ref action, .. } if action == "evaluate answer"));
    assert_eq!(store.count(Table::AnswerSessions, &Query::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn interview_completes_after_last_question() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let reply = r#"{"confidence": 7, "clarity": 8, "content": 6, "overall": 7, "feedback": "Good."}"#;
    let ai: Arc<dyn TextGenerator> = Arc::new(ScriptedGenerator::new().reply(reply).reply(reply));
    let lab = InterviewLab::new(store.clone(), ai);
    let qs = (0..2)
        .map(|i| InterviewQuestion {
            id: Uuid::new_v4(),
            question: format!("Question {i}"),
            category: "Ethics".into(),
            expected_duration_secs: 90,
            follow_up: false,
        })
        .collect();
    let session = lab.start("Board 1", PanelType::Personality, qs).await.unwrap();
    assert_eq!(session.status, InterviewStatus::InProgress);

    let first = lab.submit_response(&session, "Answer one", &[]).await.unwrap();
    assert!(!first.completed);
    let second = lab.submit_response(&first.session, "Answer two", &[]).await.unwrap();
    assert!(second.completed);
    assert_eq!(second.session.status, InterviewStatus::Completed);

    let saved: InterviewSession = repo::fetch_by_id(&*store, session.id).await.unwrap();
    assert_eq!(saved.status, InterviewStatus::Completed);
    assert_eq!(saved.responses.len(), 2);
    assert!(lab.submit_response(&saved, "again", &[]).await.is_err());
}

#[tokio::test]
async fn user_stats_counts_profiles() {
    let store = MemoryStore::new();
    for p in [
        profile(Role::Admin, Some(1), false, 30),
        profile(Role::User, Some(10), true, 30),
        profile(Role::User, None, true, 0),
    ] {
        repo::save(&store, &p).await.unwrap();
    }
    let stats = user_stats(&store, Utc::now()).await.unwrap();
    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.active_users, 1);
    assert_eq!(stats.premium_users, 2);
    assert_eq!(stats.new_users_today, 1);
}

#[tokio::test]
async fn moderation_requires_admin_and_evicts_decided_items() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let user = profile(Role::User, None, false, 1);
    assert!(matches!(require_admin(&user), Err(CoreError::Forbidden(_))));
    assert!(Moderation::new(store.clone(), Scope::new(), &user).is_err());

    let item = ContentItem {
        id: Uuid::new_v4(),
        title: "Monsoon notes".into(),
        kind: ContentKind::Note,
        status: ContentStatus::Pending,
        created_by: "u".into(),
        created_at: Utc::now(),
    };
    repo::save(&*store, &item).await.unwrap();

    let admin = profile(Role::Admin, None, false, 1);
    let m = Moderation::new(store.clone(), Scope::new(), &admin).unwrap();
    m.load().await;
    assert_eq!(m.pending.records().len(), 1);
    m.approve(item.id).await.unwrap();
    assert!(m.pending.records().is_empty());

    let saved: ContentItem = repo::fetch_by_id(&*store, item.id).await.unwrap();
    assert_eq!(saved.status, ContentStatus::Active);
}

#[tokio::test]
async fn failed_answer_write_keeps_the_session_and_reports_partial() {
    let store: Arc<dyn RecordStore> = Arc::new(FailOn::new(Table::Answers));
    let ai: Arc<dyn TextGenerator> = Arc::new(
        ScriptedGenerator::new().reply(r#"{"score": 5, "structure": 5, "content": 5, "feedback": "ok"}"#),
    );
    let practice = AnswerPractice::new(store.clone(), ai);
    let session = AnswerSession::new("GS III", vec![question("Inflation targeting?")], 10);

    let err = practice
        .submit_answer(&session, "The RBI targets four percent.", &Countdown::new(QUESTION_SECONDS))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::PartialWrite { completed: 1, failed_step: "save answer", .. }
    ));
    let saved: AnswerSession = repo::fetch_by_id(&*store, session.id).await.unwrap();
    assert_eq!(saved.answers.len(), 1);
    assert_eq!(store.count(Table::Answers, &Query::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_session_write_is_an_action_failure() {
    let store: Arc<dyn RecordStore> = Arc::new(FailOn::new(Table::AnswerSessions));
    let ai: Arc<dyn TextGenerator> = Arc::new(
        ScriptedGenerator::new().reply(r#"{"score": 5, "structure": 5, "content": 5, "feedback": "ok"}"#),
    );
    let practice = AnswerPractice::new(store.clone(), ai);
    let session = AnswerSession::new("GS III", vec![question("Q")], 10);
    let err = practice
        .submit_answer(&session, "text", &Countdown::new(QUESTION_SECONDS))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ActionFailed { ref action, .. } if action == "save answer session"));
    assert_eq!(store.count(Table::Answers, &Query::all()).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_review_log_keeps_the_rescheduled_card() {
    let store: Arc<dyn RecordStore> = Arc::new(FailOn::new(Table::FlashcardReviews));
    let fc = Flashcards::new(store.clone());
    let deck: Deck = fc.create_deck("Economy", "Economy").await.unwrap();
    let card: Flashcard = fc.add_card(deck.id, "Repo rate?", "RBI lending rate", 3).await.unwrap();

    let outcome = rate_card(card.clone(), Rating::new(4));
    let err = fc.persist_rating(&outcome).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::PartialWrite { completed: 1, failed_step: "save review", .. }
    ));
    let stored = fc.get_card(card.id).await.unwrap();
    assert_eq!(stored.next_review_at, outcome.updated_card.next_review_at);
    assert!(fc.reviews(Some(card.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn ai_settings_are_a_single_admin_only_row() {
    let store = MemoryStore::new();
    let user = profile(Role::User, None, false, 1);
    let admin = profile(Role::Admin, None, false, 1);

    let settings = AiSettings::new("openai", "sk-test", "https://api.example/v1");
    assert!(matches!(
        save_ai_settings(&store, &user, settings.clone()).await,
        Err(CoreError::Forbidden(_))
    ));
    assert_eq!(ai_settings(&store, &admin).await.unwrap(), None);

    save_ai_settings(&store, &admin, settings).await.unwrap();
    let mut other = AiSettings::new("local", "", "http://localhost:11434");
    other.id = Uuid::new_v4();
    save_ai_settings(&store, &admin, other).await.unwrap();

    assert_eq!(store.count(Table::AiSettings, &Query::all()).await.unwrap(), 1);
    let current = ai_settings(&store, &admin).await.unwrap().unwrap();
    assert_eq!(current.id, AI_SETTINGS_ID);
    assert_eq!(current.provider, "local");
    assert!(save_ai_settings(&store, &admin, AiSettings::new(" ", "", "")).await.is_err());
}
