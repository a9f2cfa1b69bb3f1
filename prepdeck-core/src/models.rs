use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DeckId = Uuid;
pub type CardId = Uuid;
pub type ReviewId = Uuid;

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;

/// A review rating in `1..=5`. Out-of-range input is clamped, never rejected.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(raw: i64) -> Self {
        Rating(raw.clamp(RATING_MIN as i64, RATING_MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_max(self) -> bool {
        self.0 == RATING_MAX
    }

    /// 1 day for the lowest rating, otherwise twice the rating.
    pub fn interval_days(self) -> u32 {
        if self.0 == RATING_MIN {
            1
        } else {
            self.0 as u32 * 2
        }
    }
}

impl From<i64> for Rating {
    fn from(raw: i64) -> Self {
        Rating::new(raw)
    }
}

impl From<Rating> for u8 {
    fn from(r: Rating) -> Self {
        r.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub subject: String,
    #[serde(default)]
    pub cards_count: u32,
    #[serde(default)]
    pub mastery: u8,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            subject: subject.into(),
            cards_count: 0,
            mastery: 0,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
    pub id: CardId,
    pub deck_id: DeckId,
    #[serde(default)]
    pub subject: String,
    pub front: String,
    pub back: String,
    pub difficulty: u8,
    pub next_review_at: DateTime<Utc>,
    #[serde(default)]
    pub mastered: bool,
    pub created_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(deck_id: DeckId, front: impl Into<String>, back: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            deck_id,
            subject: String::new(),
            front: front.into(),
            back: back.into(),
            difficulty: 3,
            next_review_at: now,
            mastered: false,
            created_at: now,
        }
    }

    pub fn with_difficulty(mut self, difficulty: i64) -> Self {
        self.difficulty = Rating::new(difficulty).value();
        self
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.mastered && self.next_review_at <= now
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: ReviewId,
    pub card_id: CardId,
    pub rating: Rating,
    pub reviewed_at: DateTime<Utc>,
    pub interval_days: u32,
}

impl Review {
    pub fn new(card_id: CardId, rating: Rating, reviewed_at: DateTime<Utc>, interval_days: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id,
            rating,
            reviewed_at,
            interval_days,
        }
    }
}
