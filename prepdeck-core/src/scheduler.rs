use crate::{Flashcard, Rating, Review};
use chrono::{DateTime, Duration, Utc};

pub struct ScheduleOutcome {
    pub updated_card: Flashcard,
    pub review: Review,
}

pub fn rate_card(card: Flashcard, rating: impl Into<Rating>) -> ScheduleOutcome {
    rate_card_at(card, rating, Utc::now())
}

/// Rating 1 schedules tomorrow, ratings 2..=5 schedule `2 * rating` days out.
/// A top rating masters the card; a mastered card stays mastered.
pub fn rate_card_at(mut card: Flashcard, rating: impl Into<Rating>, now: DateTime<Utc>) -> ScheduleOutcome {
    let rating = rating.into();
    let days = rating.interval_days();

    card.difficulty = rating.value();
    card.next_review_at = now + Duration::days(days as i64);
    card.mastered = card.mastered || rating.is_max();

    let review = Review::new(card.id, rating, now, days);

    ScheduleOutcome { updated_card: card, review }
}
