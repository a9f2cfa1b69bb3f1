use chrono::{DateTime, Utc};
use prepdeck_core::records::Note;
use prepdeck_core::{Deck, Flashcard};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
pub struct DeckOut {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub cards_count: u32,
    pub mastery: u8,
    pub created_at: DateTime<Utc>,
}

impl From<Deck> for DeckOut {
    fn from(d: Deck) -> Self {
        Self {
            id: d.id,
            name: d.name,
            subject: d.subject,
            cards_count: d.cards_count,
            mastery: d.mastery,
            created_at: d.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct CardOut {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    pub difficulty: u8,
    pub next_review_at: DateTime<Utc>,
}

impl From<Flashcard> for CardOut {
    fn from(c: Flashcard) -> Self {
        Self {
            id: c.id,
            deck_id: c.deck_id,
            front: c.front,
            back: c.back,
            difficulty: c.difficulty,
            next_review_at: c.next_review_at,
        }
    }
}

#[derive(Deserialize)]
pub struct ReviewIn {
    pub card_id: Uuid,
    /// Out-of-range values are clamped to 1..=5.
    pub rating: i64,
}

#[derive(Serialize)]
pub struct ReviewOut {
    pub card: CardOut,
    pub mastered: bool,
    pub interval_days: u32,
}

#[derive(Serialize)]
pub struct NoteOut {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub is_favorite: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteOut {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            title: n.title,
            subject: n.subject,
            is_favorite: n.is_favorite,
            updated_at: n.updated_at,
        }
    }
}
