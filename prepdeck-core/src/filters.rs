use crate::records::Note;
use crate::{DeckId, Flashcard};
use chrono::{DateTime, Utc};

/// Cards not yet mastered whose next review has passed.
pub fn due_cards(cards: &[Flashcard], now: DateTime<Utc>) -> Vec<Flashcard> {
    cards.iter().filter(|c| c.is_due(now)).cloned().collect()
}

/// Unmastered cards of one deck, in collection order.
pub fn pending_for_deck(cards: &[Flashcard], deck_id: DeckId) -> Vec<Flashcard> {
    cards
        .iter()
        .filter(|c| c.deck_id == deck_id && !c.mastered)
        .cloned()
        .collect()
}

pub fn filter_cards_by_text(cards: &[Flashcard], query: &str) -> Vec<Flashcard> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return cards.to_vec();
    }
    cards
        .iter()
        .filter(|c| c.front.to_lowercase().contains(&q) || c.back.to_lowercase().contains(&q))
        .cloned()
        .collect()
}

pub fn filter_notes_by_text(notes: &[Note], query: &str) -> Vec<Note> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return notes.to_vec();
    }
    notes
        .iter()
        .filter(|n| {
            n.title.to_lowercase().contains(&q)
                || n.content.to_lowercase().contains(&q)
                || n.tags.iter().any(|t| t.to_lowercase().contains(&q))
        })
        .cloned()
        .collect()
}

/// "All" matches every note.
pub fn filter_notes_by_subject(notes: &[Note], subject: &str) -> Vec<Note> {
    let s = subject.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("all") {
        return notes.to_vec();
    }
    notes
        .iter()
        .filter(|n| n.subject.eq_ignore_ascii_case(s))
        .cloned()
        .collect()
}

pub fn favorite_notes(notes: &[Note]) -> Vec<Note> {
    notes.iter().filter(|n| n.is_favorite).cloned().collect()
}
