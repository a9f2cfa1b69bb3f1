use chrono::{Duration, Utc};
use prepdeck_core::{due_cards, rate_card, rate_card_at, Deck, Flashcard, Rating};

fn card() -> Flashcard {
    let deck = Deck::new("Polity", "Polity");
    Flashcard::new(deck.id, "Article 14?", "Equality before law")
}

#[test]
fn interval_table() {
    let now = Utc::now();
    for (r, days, mastered) in [(1, 1, false), (2, 4, false), (3, 6, false), (4, 8, false), (5, 10, true)] {
        let out = rate_card_at(card(), r, now);
        let c = out.updated_card;
        assert_eq!(c.next_review_at, now + Duration::days(days), "rating {r}");
        assert_eq!(c.mastered, mastered, "rating {r}");
        assert_eq!(c.difficulty as i64, r);
        assert_eq!(out.review.interval_days as i64, days);
    }
}

#[test]
fn out_of_range_ratings_are_clamped() {
    let now = Utc::now();
    let low = rate_card_at(card(), 0, now).updated_card;
    assert_eq!(low.next_review_at, now + Duration::days(1));
    assert_eq!(low.difficulty, 1);
    assert!(!low.mastered);

    let high = rate_card_at(card(), 9, now).updated_card;
    assert_eq!(high.next_review_at, now + Duration::days(10));
    assert_eq!(high.difficulty, 5);
    assert!(high.mastered);

    assert_eq!(Rating::new(-3).value(), 1);
}

#[test]
fn mastered_card_stays_mastered() {
    let now = Utc::now();
    let c = rate_card_at(card(), 5, now).updated_card;
    let c = rate_card_at(c, 1, now + Duration::days(10)).updated_card;
    assert!(c.mastered);
    assert_eq!(c.difficulty, 1);
}

#[test]
fn next_review_never_precedes_the_review() {
    let before = Utc::now();
    let out = rate_card(card(), 1);
    assert!(out.updated_card.next_review_at >= out.review.reviewed_at);
    assert!(out.review.reviewed_at >= before);
}

#[test]
fn mastered_cards_are_never_due() {
    let now = Utc::now();
    let mut overdue = card();
    overdue.next_review_at = now - Duration::days(30);
    let mut mastered = card();
    mastered.next_review_at = now - Duration::days(30);
    mastered.mastered = true;
    let mut future = card();
    future.next_review_at = now + Duration::days(1);

    let due = due_cards(&[overdue.clone(), mastered, future], now);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, overdue.id);
}

#[test]
fn rating_serializes_as_a_number() {
    let r = Rating::new(4);
    assert_eq!(serde_json::to_string(&r).unwrap(), "4");
    let back: Rating = serde_json::from_str("7").unwrap();
    assert_eq!(back.value(), 5);
}
