use crate::repo::{self, Query, Record, RecordStore};
use crate::scheduler::ScheduleOutcome;
use crate::session::{ReviewSession, SessionOrder};
use crate::stats::deck_summary;
use crate::sync::{Collection, LoadOutcome};
use crate::{filters, CardId, CoreError, Deck, DeckId, Flashcard, Review, Scope};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Decks, cards and review persistence on top of a [`RecordStore`].
#[derive(Clone)]
pub struct Flashcards {
    store: Arc<dyn RecordStore>,
}

impl Flashcards {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn create_deck(&self, name: &str, subject: &str) -> Result<Deck, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Invalid("deck name is empty"));
        }
        let decks: Vec<Deck> = repo::fetch_all(&*self.store, &Query::all()).await?;
        if decks.iter().any(|d| d.name.eq_ignore_ascii_case(name)) {
            return Err(CoreError::Conflict("deck name already exists"));
        }
        repo::insert(&*self.store, &Deck::new(name, subject)).await
    }

    pub async fn get_deck(&self, id: DeckId) -> Result<Deck, CoreError> {
        repo::fetch_by_id(&*self.store, id).await
    }

    /// Decks with `cards_count` and `mastery` computed from their cards.
    pub async fn list_decks(&self) -> Result<Vec<Deck>, CoreError> {
        let decks: Vec<Deck> = repo::fetch_all(&*self.store, &Query::all().order_by("created_at", true)).await?;
        let cards = self.list_cards(None).await?;
        Ok(decks.into_iter().map(|d| deck_summary(d, &cards)).collect())
    }

    /// Accepts a deck id or a case-insensitive name.
    pub async fn resolve_deck(&self, sel: &str) -> Result<Deck, CoreError> {
        if let Ok(id) = uuid::Uuid::parse_str(sel) {
            if let Ok(d) = self.get_deck(id).await {
                return Ok(d);
            }
        }
        let decks: Vec<Deck> = repo::fetch_all(&*self.store, &Query::all()).await?;
        decks
            .into_iter()
            .find(|d| d.name.eq_ignore_ascii_case(sel.trim()))
            .ok_or(CoreError::NotFound("deck"))
    }

    pub async fn delete_deck(&self, id: DeckId) -> Result<(), CoreError> {
        let cards = self.list_cards(Some(id)).await?;
        for c in &cards {
            self.store
                .delete(Review::TABLE, &Query::all().eq("card_id", c.id.to_string()))
                .await?;
        }
        self.store
            .delete(Flashcard::TABLE, &Query::all().eq("deck_id", id.to_string()))
            .await?;
        repo::remove::<Deck, _>(&*self.store, id).await
    }

    pub async fn add_card(
        &self,
        deck_id: DeckId,
        front: &str,
        back: &str,
        difficulty: i64,
    ) -> Result<Flashcard, CoreError> {
        if front.trim().is_empty() || back.trim().is_empty() {
            return Err(CoreError::Invalid("card needs a front and a back"));
        }
        let deck = self.get_deck(deck_id).await?;
        let mut card = Flashcard::new(deck.id, front.trim(), back.trim()).with_difficulty(difficulty);
        card.subject = deck.subject;
        repo::insert(&*self.store, &card).await
    }

    pub async fn get_card(&self, id: CardId) -> Result<Flashcard, CoreError> {
        repo::fetch_by_id(&*self.store, id).await
    }

    /// Ordered by next review, earliest first.
    pub async fn list_cards(&self, deck_id: Option<DeckId>) -> Result<Vec<Flashcard>, CoreError> {
        let mut q = Query::all().order_by("next_review_at", true);
        if let Some(did) = deck_id {
            q = q.eq("deck_id", did.to_string());
        }
        repo::fetch_all(&*self.store, &q).await
    }

    /// Explicit edit; the only path that may clear `mastered`.
    pub async fn update_card(&self, card: &Flashcard) -> Result<Flashcard, CoreError> {
        self.get_card(card.id).await?;
        repo::save(&*self.store, card).await
    }

    pub async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        self.store
            .delete(Review::TABLE, &Query::all().eq("card_id", id.to_string()))
            .await?;
        repo::remove::<Flashcard, _>(&*self.store, id).await
    }

    pub async fn due_cards(&self, deck_id: Option<DeckId>, now: DateTime<Utc>) -> Result<Vec<Flashcard>, CoreError> {
        let cards = self.list_cards(deck_id).await?;
        Ok(filters::due_cards(&cards, now))
    }

    pub async fn start_session(&self, deck_id: DeckId, order: SessionOrder) -> Result<ReviewSession, CoreError> {
        let cards = self.list_cards(Some(deck_id)).await?;
        ReviewSession::start(deck_id, &cards, order)
    }

    /// Writes the rated card, then appends the review log entry. A failed
    /// review write leaves the card rescheduled and reports `PartialWrite`.
    pub async fn persist_rating(&self, outcome: &ScheduleOutcome) -> Result<(), CoreError> {
        let card = &outcome.updated_card;
        debug!(card = %card.id, rating = card.difficulty, due = %card.next_review_at, "rated");
        repo::save_pair(&*self.store, card, &outcome.review, "save review").await
    }

    pub async fn reviews(&self, card_id: Option<CardId>) -> Result<Vec<Review>, CoreError> {
        let mut q = Query::all().order_by("reviewed_at", true);
        if let Some(cid) = card_id {
            q = q.eq("card_id", cid.to_string());
        }
        repo::fetch_all(&*self.store, &q).await
    }
}

/// Screen-level view of decks and their cards. Unlike [`Flashcards`] it
/// never fails a read: an unreachable store shows the sample decks and the
/// outcomes say so.
pub struct DeckBoard {
    pub decks: Collection<Deck>,
    pub cards: Collection<Flashcard>,
}

impl DeckBoard {
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope) -> Self {
        Self {
            decks: Collection::with_query(store.clone(), scope.clone(), Query::all().order_by("created_at", true)),
            cards: Collection::with_query(store, scope, Query::all().order_by("next_review_at", true)),
        }
    }

    /// Deck outcome first, then cards.
    pub async fn load(&self) -> (LoadOutcome, LoadOutcome) {
        let decks = self.decks.load().await;
        let cards = self.cards.load().await;
        (decks, cards)
    }

    pub fn decks(&self) -> Vec<Deck> {
        let cards = self.cards.records();
        self.decks
            .records()
            .into_iter()
            .map(|d| deck_summary(d, &cards))
            .collect()
    }

    pub fn cards_for(&self, deck_id: Option<DeckId>) -> Vec<Flashcard> {
        self.cards
            .records()
            .into_iter()
            .filter(|c| deck_id.map_or(true, |d| c.deck_id == d))
            .collect()
    }

    /// Case-insensitive name or id among the loaded decks.
    pub fn find_deck(&self, sel: &str) -> Option<Deck> {
        let sel = sel.trim();
        self.decks().into_iter().find(|d| {
            d.id.to_string() == sel || d.name.eq_ignore_ascii_case(sel)
        })
    }
}
