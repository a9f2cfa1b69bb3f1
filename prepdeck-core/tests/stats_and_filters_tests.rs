use chrono::{Duration, NaiveDate, Utc};
use prepdeck_core::records::{Note, StudyPlan};
use prepdeck_core::stats::{deck_summary, plan_progress};
use prepdeck_core::{
    daily_streak, favorite_notes, filter_cards_by_text, filter_notes_by_subject, filter_notes_by_text,
    pending_for_deck, summarize, Deck, Flashcard, Rating, Review,
};

#[test]
fn card_and_note_text_filters() {
    let deck = Deck::new("Polity", "Polity");
    let c1 = Flashcard::new(deck.id, "Article 21", "Protection of life and personal liberty");
    let c2 = Flashcard::new(deck.id, "Article 32", "Constitutional remedies");
    let v = vec![c1.clone(), c2];
    let hits = filter_cards_by_text(&v, "LIBERTY");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, c1.id);
    assert_eq!(filter_cards_by_text(&v, "  ").len(), 2);

    let mut n1 = Note::new("Monsoon", "Onset over Kerala in June", "Geography");
    n1.tags = vec!["climate".into()];
    n1.is_favorite = true;
    let n2 = Note::new("Preamble", "Sovereign socialist secular", "Polity");
    let notes = vec![n1.clone(), n2.clone()];

    assert_eq!(filter_notes_by_text(&notes, "climate")[0].id, n1.id);
    assert_eq!(filter_notes_by_subject(&notes, "polity")[0].id, n2.id);
    assert_eq!(filter_notes_by_subject(&notes, "All").len(), 2);
    assert_eq!(favorite_notes(&notes).len(), 1);
}

#[test]
fn pending_excludes_mastered_and_other_decks() {
    let a = Deck::new("A", "Polity");
    let b = Deck::new("B", "History");
    let keep = Flashcard::new(a.id, "q1", "a1");
    let mut mastered = Flashcard::new(a.id, "q2", "a2");
    mastered.mastered = true;
    let other = Flashcard::new(b.id, "q3", "a3");
    let pending = pending_for_deck(&[keep.clone(), mastered.clone(), other], a.id);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, keep.id);

    let summary = deck_summary(a, &[keep, mastered]);
    assert_eq!(summary.cards_count, 2);
    assert_eq!(summary.mastery, 50);
}

#[test]
fn summary_and_streak() {
    let deck = Deck::new("Economy", "Economy");
    let card = Flashcard::new(deck.id, "Repo rate?", "RBI lending rate to banks");
    let now = Utc::now();
    let reviews: Vec<Review> = [(1, 0), (3, 0), (5, 1), (4, 3)]
        .into_iter()
        .map(|(r, days_ago)| Review::new(card.id, Rating::new(r), now - Duration::days(days_ago), 1))
        .collect();

    let s = summarize(&reviews);
    assert_eq!(s.totals.total, 4);
    assert_eq!(s.totals.by_rating, [1, 0, 1, 1, 1]);
    assert!((s.totals.accuracy() - 0.75).abs() < 1e-6);

    // today and yesterday have reviews; the day before does not
    assert_eq!(daily_streak(&reviews, now.date_naive()), 2);
    assert_eq!(daily_streak(&[], now.date_naive()), 0);
}

#[test]
fn plan_progress_counts_completed_minutes() {
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut done = StudyPlan::new("Revise", "Polity", 45, day);
    done.completed = true;
    let open = StudyPlan::new("Read", "History", 30, day);
    let p = plan_progress(&[done, open]);
    assert_eq!(p.total_minutes, 75);
    assert_eq!(p.completed_minutes, 45);
    assert_eq!((p.completed_plans, p.total_plans), (1, 2));
}
