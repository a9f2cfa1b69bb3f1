use crate::filters::pending_for_deck;
use crate::scheduler::{rate_card_at, ScheduleOutcome};
use crate::{CoreError, DeckId, Flashcard, Rating};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionOrder {
    /// The order the cards were loaded in.
    #[default]
    Collection,
    /// Earliest `next_review_at` first, harder cards first on ties.
    MostOverdue,
}

#[derive(Debug, PartialEq)]
pub enum SessionStep {
    Next(Flashcard),
    /// Reported once, by the step that moves past the last pending card.
    Completed { reviewed: usize },
}

pub struct Rated {
    pub outcome: ScheduleOutcome,
    pub step: SessionStep,
}

/// Walk over the unmastered cards of one deck.
#[derive(Debug)]
pub struct ReviewSession {
    deck_id: DeckId,
    queue: VecDeque<Flashcard>,
    reviewed: usize,
    done: bool,
}

impl ReviewSession {
    pub fn start(deck_id: DeckId, cards: &[Flashcard], order: SessionOrder) -> Result<Self, CoreError> {
        let pending = pending_for_deck(cards, deck_id);
        if pending.is_empty() {
            return Err(CoreError::Invalid("deck has no pending cards"));
        }
        let queue = match order {
            SessionOrder::Collection => pending.into(),
            SessionOrder::MostOverdue => by_overdue(pending),
        };
        Ok(Self {
            deck_id,
            queue,
            reviewed: 0,
            done: false,
        })
    }

    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.queue.front()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    pub fn is_complete(&self) -> bool {
        self.done
    }

    pub fn rate(&mut self, rating: impl Into<Rating>) -> Result<Rated, CoreError> {
        self.rate_at(rating, Utc::now())
    }

    pub fn rate_at(&mut self, rating: impl Into<Rating>, now: DateTime<Utc>) -> Result<Rated, CoreError> {
        let card = self.take_current()?;
        let outcome = rate_card_at(card, rating, now);
        self.reviewed += 1;
        Ok(Rated {
            outcome,
            step: self.advance(),
        })
    }

    /// Moves on without rating; the card is left as it was.
    pub fn skip(&mut self) -> Result<SessionStep, CoreError> {
        self.take_current()?;
        Ok(self.advance())
    }

    fn take_current(&mut self) -> Result<Flashcard, CoreError> {
        if self.done {
            return Err(CoreError::Invalid("session already complete"));
        }
        self.queue
            .pop_front()
            .ok_or(CoreError::Invalid("session already complete"))
    }

    fn advance(&mut self) -> SessionStep {
        match self.queue.front() {
            Some(next) => SessionStep::Next(next.clone()),
            None => {
                self.done = true;
                SessionStep::Completed {
                    reviewed: self.reviewed,
                }
            }
        }
    }
}

fn by_overdue(cards: Vec<Flashcard>) -> VecDeque<Flashcard> {
    let mut heap: BinaryHeap<(Reverse<DateTime<Utc>>, u8, Reverse<usize>)> = cards
        .iter()
        .enumerate()
        .map(|(i, c)| (Reverse(c.next_review_at), c.difficulty, Reverse(i)))
        .collect();
    let mut out = VecDeque::with_capacity(cards.len());
    while let Some((_, _, Reverse(i))) = heap.pop() {
        out.push_back(cards[i].clone());
    }
    out
}
