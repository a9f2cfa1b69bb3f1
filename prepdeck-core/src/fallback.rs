//! Fixed sample rows substituted when a table cannot be read.

use crate::records::*;
use crate::{Deck, Flashcard};
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

const POLITY_DECK: Uuid = Uuid::from_u128(0x0d0c_0000_0000_0000_0000_0000_0000_0001);
const ECONOMY_DECK: Uuid = Uuid::from_u128(0x0d0c_0000_0000_0000_0000_0000_0000_0002);

fn epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn decks() -> Vec<Deck> {
    vec![
        Deck {
            id: POLITY_DECK,
            name: "Polity Fundamentals".into(),
            subject: "Polity".into(),
            cards_count: 25,
            mastery: 72,
            created_at: epoch(),
        },
        Deck {
            id: ECONOMY_DECK,
            name: "Economic Concepts".into(),
            subject: "Economy".into(),
            cards_count: 18,
            mastery: 65,
            created_at: epoch(),
        },
    ]
}

pub fn flashcards() -> Vec<Flashcard> {
    vec![
        Flashcard {
            id: Uuid::from_u128(0xca7d_0000_0000_0000_0000_0000_0000_0001),
            deck_id: POLITY_DECK,
            subject: "Polity".into(),
            front: "What is Article 14 of the Indian Constitution?".into(),
            back: "Article 14 guarantees equality before law and equal protection of laws within India.".into(),
            difficulty: 3,
            next_review_at: epoch(),
            mastered: false,
            created_at: epoch(),
        },
        Flashcard {
            id: Uuid::from_u128(0xca7d_0000_0000_0000_0000_0000_0000_0002),
            deck_id: ECONOMY_DECK,
            subject: "Economy".into(),
            front: "Define Fiscal Deficit".into(),
            back: "The difference between total expenditure and total receipts excluding borrowings.".into(),
            difficulty: 4,
            next_review_at: epoch() + Duration::days(1),
            mastered: true,
            created_at: epoch(),
        },
    ]
}

pub fn notes() -> Vec<Note> {
    vec![Note {
        id: Uuid::from_u128(0x0e7e_0000_0000_0000_0000_0000_0000_0001),
        title: "Fundamental Rights overview".into(),
        content: "Part III, Articles 12 to 35. Justiciable, subject to reasonable restrictions.".into(),
        subject: "Polity".into(),
        tags: vec!["constitution".into(), "rights".into()],
        is_favorite: true,
        created_at: epoch(),
        updated_at: epoch(),
    }]
}

pub fn study_plans() -> Vec<StudyPlan> {
    vec![StudyPlan {
        id: Uuid::from_u128(0x91a0_0000_0000_0000_0000_0000_0000_0001),
        title: "Revise Indian Economy basics".into(),
        subject: "Economy".into(),
        duration_minutes: 90,
        date: day(2024, 1, 2),
        completed: false,
        priority: Priority::High,
        notes: "Budget terms and deficits".into(),
        created_at: epoch(),
    }]
}

pub fn study_goals() -> Vec<StudyGoal> {
    vec![StudyGoal {
        id: Uuid::from_u128(0x90a1_0000_0000_0000_0000_0000_0000_0001),
        title: "Finish Polity syllabus".into(),
        target_date: day(2024, 3, 31),
        progress: 40,
        achieved: false,
    }]
}

pub fn interview_sessions() -> Vec<InterviewSession> {
    vec![InterviewSession {
        id: Uuid::from_u128(0x1e70_0000_0000_0000_0000_0000_0000_0001),
        title: "Personality test warm-up".into(),
        panel: PanelType::Personality,
        questions: vec![InterviewQuestion {
            id: Uuid::from_u128(0x1e70_0000_0000_0000_0000_0000_0001_0001),
            question: "Why do you want to join the civil services?".into(),
            category: "Motivation".into(),
            expected_duration_secs: 120,
            follow_up: true,
        }],
        responses: Vec::new(),
        current_question_index: 0,
        started_at: epoch(),
        status: InterviewStatus::Preparing,
    }]
}

pub fn answer_sessions() -> Vec<AnswerSession> {
    vec![AnswerSession {
        id: Uuid::from_u128(0xa115_0000_0000_0000_0000_0000_0000_0001),
        title: "GS Paper II practice".into(),
        questions: vec![PracticeQuestion {
            id: Uuid::from_u128(0xa115_0000_0000_0000_0000_0000_0001_0001),
            question: "Discuss the role of the Finance Commission in fiscal federalism.".into(),
            topic: "Federalism".into(),
            word_limit: 250,
            marks: 15,
            subject: "Polity".into(),
        }],
        duration_minutes: 10,
        current_question_index: 0,
        started_at: epoch(),
        answers: Vec::new(),
    }]
}

pub fn ar_visualizations() -> Vec<ArVisualization> {
    let a = Uuid::from_u128(0x0a70_0000_0000_0000_0000_0000_0001_0001);
    let b = Uuid::from_u128(0x0a70_0000_0000_0000_0000_0000_0001_0002);
    vec![ArVisualization {
        id: Uuid::from_u128(0x0a70_0000_0000_0000_0000_0000_0000_0001),
        title: "Constitution concept map".into(),
        mode: VisualizationMode::ConceptMap,
        nodes: vec![
            ConceptNode {
                id: a,
                name: "Preamble".into(),
                topic: "Polity".into(),
                position: [0.0, 0.0, 0.0],
                connected_to: vec![b],
                color: "#4F46E5".into(),
                size: 1.0,
            },
            ConceptNode {
                id: b,
                name: "Fundamental Rights".into(),
                topic: "Polity".into(),
                position: [1.5, 0.0, 0.5],
                connected_to: vec![a],
                color: "#10B981".into(),
                size: 0.8,
            },
        ],
        saved: true,
    }]
}
