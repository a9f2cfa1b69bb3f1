use crate::records::StudyPlan;
use crate::{Deck, Flashcard, Rating, Review, RATING_MAX};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default)]
pub struct Totals {
    pub total: u32,
    /// Index `r - 1` counts reviews rated `r`.
    pub by_rating: [u32; RATING_MAX as usize],
}

impl Totals {
    pub fn record(&mut self, r: Rating) {
        self.total += 1;
        self.by_rating[r.value() as usize - 1] += 1;
    }

    /// Share of reviews rated 3 or better.
    pub fn accuracy(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            let recalled: u32 = self.by_rating[2..].iter().sum();
            recalled as f32 / self.total as f32
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StatsSummary {
    pub totals: Totals,
    pub per_day: BTreeMap<NaiveDate, Totals>,
}

pub fn summarize(reviews: &[Review]) -> StatsSummary {
    let mut summary = StatsSummary::default();
    for r in reviews {
        summary.totals.record(r.rating);
        let d = r.reviewed_at.date_naive();
        summary.per_day.entry(d).or_default().record(r.rating);
    }
    summary
}

pub fn daily_streak(reviews: &[Review], today: NaiveDate) -> u32 {
    let per_day = summarize(reviews).per_day;
    let mut streak = 0u32;
    let mut day = today;
    while per_day.get(&day).map(|t| t.total > 0).unwrap_or(false) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Fills `cards_count` and `mastery` (percent of mastered cards) from the deck's cards.
pub fn deck_summary(mut deck: Deck, cards: &[Flashcard]) -> Deck {
    let own: Vec<&Flashcard> = cards.iter().filter(|c| c.deck_id == deck.id).collect();
    let mastered = own.iter().filter(|c| c.mastered).count();
    deck.cards_count = own.len() as u32;
    deck.mastery = if own.is_empty() {
        0
    } else {
        ((mastered * 100) / own.len()) as u8
    };
    deck
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlanProgress {
    pub total_minutes: u32,
    pub completed_minutes: u32,
    pub completed_plans: usize,
    pub total_plans: usize,
}

pub fn plan_progress(plans: &[StudyPlan]) -> PlanProgress {
    let mut p = PlanProgress {
        total_plans: plans.len(),
        ..Default::default()
    };
    for plan in plans {
        p.total_minutes += plan.duration_minutes;
        if plan.completed {
            p.completed_minutes += plan.duration_minutes;
            p.completed_plans += 1;
        }
    }
    p
}
