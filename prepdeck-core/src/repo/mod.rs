use crate::CoreError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod memory;
pub mod query;

pub use query::{Filter, Order, Query};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Notes,
    Flashcards,
    FlashcardDecks,
    FlashcardReviews,
    StudyPlans,
    StudyGoals,
    InterviewSessions,
    InterviewResponses,
    AnswerSessions,
    Answers,
    ArVisualizations,
    UserBrainModels,
    UserStats,
    Profiles,
    AiSettings,
    UserContent,
}

impl Table {
    pub const ALL: [Table; 16] = [
        Table::Notes,
        Table::Flashcards,
        Table::FlashcardDecks,
        Table::FlashcardReviews,
        Table::StudyPlans,
        Table::StudyGoals,
        Table::InterviewSessions,
        Table::InterviewResponses,
        Table::AnswerSessions,
        Table::Answers,
        Table::ArVisualizations,
        Table::UserBrainModels,
        Table::UserStats,
        Table::Profiles,
        Table::AiSettings,
        Table::UserContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Notes => "notes",
            Table::Flashcards => "flashcards",
            Table::FlashcardDecks => "flashcard_decks",
            Table::FlashcardReviews => "flashcard_reviews",
            Table::StudyPlans => "study_plans",
            Table::StudyGoals => "study_goals",
            Table::InterviewSessions => "interview_sessions",
            Table::InterviewResponses => "interview_responses",
            Table::AnswerSessions => "answer_sessions",
            Table::Answers => "answers",
            Table::ArVisualizations => "ar_visualizations",
            Table::UserBrainModels => "user_brain_models",
            Table::UserStats => "user_stats",
            Table::Profiles => "profiles",
            Table::AiSettings => "ai_settings",
            Table::UserContent => "user_content",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table-level CRUD over JSON rows keyed by their `id` field.
///
/// One instance is built at startup and shared by every feature service.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, CoreError>;
    /// Fails with `Conflict` when a row with the same id exists.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, CoreError>;
    /// Insert, or replace the row with the same id.
    async fn upsert(&self, table: Table, row: Value) -> Result<Value, CoreError>;
    /// Shallow-merge `patch` into every matching row; returns the updated rows.
    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>, CoreError>;
    async fn delete(&self, table: Table, query: &Query) -> Result<usize, CoreError>;
    async fn count(&self, table: Table, query: &Query) -> Result<usize, CoreError>;
}

/// A typed row of one table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const TABLE: Table;
    /// Names the record in user-facing messages ("save note").
    const NOUN: &'static str;

    fn id(&self) -> Uuid;

    /// Sample rows shown when the table cannot be read.
    fn fallback() -> Vec<Self> {
        Vec::new()
    }
}

pub fn row_id(row: &Value) -> Result<String, CoreError> {
    row.get("id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or(CoreError::Invalid("row has no string id"))
}

pub fn merge_patch(row: &mut Value, patch: &Value) {
    if let (Some(dst), Some(src)) = (row.as_object_mut(), patch.as_object()) {
        for (k, v) in src {
            if k != "id" {
                dst.insert(k.clone(), v.clone());
            }
        }
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value).map_err(|_| CoreError::Storage("encode row"))
}

pub fn decode<T: DeserializeOwned>(row: Value) -> Result<T, CoreError> {
    serde_json::from_value(row).map_err(|_| CoreError::Storage("decode row"))
}

pub async fn fetch_all<T, S>(store: &S, query: &Query) -> Result<Vec<T>, CoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    store
        .select(T::TABLE, query)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn fetch_by_id<T, S>(store: &S, id: Uuid) -> Result<T, CoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    let row = store
        .select(T::TABLE, &Query::by_id(id))
        .await?
        .into_iter()
        .next()
        .ok_or(CoreError::NotFound("record"))?;
    decode(row)
}

pub async fn insert<T, S>(store: &S, record: &T) -> Result<T, CoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    decode(store.insert(T::TABLE, encode(record)?).await?)
}

/// Idempotent write keyed on the record id.
pub async fn save<T, S>(store: &S, record: &T) -> Result<T, CoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    decode(store.upsert(T::TABLE, encode(record)?).await?)
}

pub async fn patch<T, S>(store: &S, id: Uuid, patch: Value) -> Result<T, CoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    let row = store
        .update(T::TABLE, &Query::by_id(id), patch)
        .await?
        .into_iter()
        .next()
        .ok_or(CoreError::NotFound("record"))?;
    decode(row)
}

pub async fn remove<T, S>(store: &S, id: Uuid) -> Result<(), CoreError>
where
    T: Record,
    S: RecordStore + ?Sized,
{
    match store.delete(T::TABLE, &Query::by_id(id)).await? {
        0 => Err(CoreError::NotFound("record")),
        _ => Ok(()),
    }
}

/// `first`, then `second`, as two independent writes. Once `first` is
/// stored a failure of `second` is a [`CoreError::PartialWrite`].
pub async fn save_pair<A, B, S>(
    store: &S,
    first: &A,
    second: &B,
    second_step: &'static str,
) -> Result<(), CoreError>
where
    A: Record,
    B: Record,
    S: RecordStore + ?Sized,
{
    save(store, first)
        .await
        .map_err(|e| CoreError::action(format!("save {}", A::NOUN), e))?;
    if let Err(e) = save(store, second).await {
        tracing::warn!(table = %B::TABLE, first = %first.id(), step = second_step, error = %e, "second write failed");
        return Err(CoreError::PartialWrite {
            completed: 1,
            failed_step: second_step,
            source: Box::new(e),
        });
    }
    Ok(())
}

macro_rules! impl_record {
    ($ty:ty, $table:expr, $noun:literal) => {
        impl Record for $ty {
            const TABLE: Table = $table;
            const NOUN: &'static str = $noun;
            fn id(&self) -> Uuid {
                self.id
            }
        }
    };
    ($ty:ty, $table:expr, $noun:literal, $fallback:path) => {
        impl Record for $ty {
            const TABLE: Table = $table;
            const NOUN: &'static str = $noun;
            fn id(&self) -> Uuid {
                self.id
            }
            fn fallback() -> Vec<Self> {
                $fallback()
            }
        }
    };
}

use crate::fallback;
use crate::records::*;
use crate::{Deck, Flashcard, Review};

impl_record!(Deck, Table::FlashcardDecks, "deck", fallback::decks);
impl_record!(Flashcard, Table::Flashcards, "flashcard", fallback::flashcards);
impl_record!(Review, Table::FlashcardReviews, "review");
impl_record!(Note, Table::Notes, "note", fallback::notes);
impl_record!(StudyPlan, Table::StudyPlans, "study plan", fallback::study_plans);
impl_record!(StudyGoal, Table::StudyGoals, "goal", fallback::study_goals);
impl_record!(InterviewSession, Table::InterviewSessions, "interview session", fallback::interview_sessions);
impl_record!(InterviewResponse, Table::InterviewResponses, "interview response");
impl_record!(AnswerSession, Table::AnswerSessions, "answer session", fallback::answer_sessions);
impl_record!(Answer, Table::Answers, "answer");
impl_record!(ArVisualization, Table::ArVisualizations, "visualization", fallback::ar_visualizations);
impl_record!(ContentItem, Table::UserContent, "content");
impl_record!(Profile, Table::Profiles, "profile");
impl_record!(AiSettings, Table::AiSettings, "AI settings");
