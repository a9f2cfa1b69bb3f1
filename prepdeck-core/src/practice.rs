//! Answer-writing and mock-interview flows. Both are "score with the AI
//! endpoint, append to the session, write session then item": two
//! independent writes, so a failure between them is reported as
//! [`CoreError::PartialWrite`].

use crate::ai::{self, TextGenerator};
use crate::records::*;
use crate::repo::{self, Query, Record, RecordStore};
use crate::sync::{Collection, LoadOutcome};
use crate::{CoreError, Scope};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Time allowed per answer-writing question.
pub const QUESTION_SECONDS: u32 = 10 * 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    total: u32,
    remaining: u32,
}

impl Countdown {
    pub fn new(total_secs: u32) -> Self {
        Self {
            total: total_secs,
            remaining: total_secs,
        }
    }

    /// One second passes; returns true once time is up.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.expired()
    }

    /// `secs` seconds pass at once, stopping at zero; returns true once time is up.
    pub fn advance(&mut self, secs: u64) -> bool {
        let secs = u32::try_from(secs).unwrap_or(u32::MAX);
        self.remaining = self.remaining.saturating_sub(secs);
        self.expired()
    }

    pub fn expired(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn elapsed(&self) -> u32 {
        self.total - self.remaining
    }

    pub fn reset(&mut self) {
        self.remaining = self.total;
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }
}

/// Rows of a session table, newest first, with sample rows when unreadable.
pub async fn session_history<T: Record>(store: &Arc<dyn RecordStore>, scope: Scope) -> (Vec<T>, LoadOutcome) {
    let sessions = Collection::with_query(store.clone(), scope, Query::all().order_by("started_at", false));
    let outcome = sessions.load().await;
    (sessions.records(), outcome)
}

/// `m:ss`
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

#[derive(Debug)]
pub struct AnswerSubmitted {
    pub session: AnswerSession,
    pub answer: Answer,
    /// The submitted question was the session's last.
    pub finished: bool,
}

#[derive(Clone)]
pub struct AnswerPractice {
    store: Arc<dyn RecordStore>,
    ai: Arc<dyn TextGenerator>,
}

impl AnswerPractice {
    pub fn new(store: Arc<dyn RecordStore>, ai: Arc<dyn TextGenerator>) -> Self {
        Self { store, ai }
    }

    /// Past sessions, newest first. An unreadable table yields the sample
    /// sessions, flagged by the outcome.
    pub async fn history(&self, scope: Scope) -> (Vec<AnswerSession>, LoadOutcome) {
        session_history(&self.store, scope).await
    }

    pub async fn answers_for(&self, question_id: Uuid) -> Result<Vec<Answer>, CoreError> {
        repo::fetch_all(
            &*self.store,
            &Query::all().eq("question_id", question_id.to_string()).order_by("created_at", true),
        )
        .await
    }

    pub async fn submit_answer(
        &self,
        session: &AnswerSession,
        text: &str,
        clock: &Countdown,
    ) -> Result<AnswerSubmitted, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::Invalid("answer is empty"));
        }
        let question = session
            .current_question()
            .ok_or(CoreError::Invalid("session has no current question"))?;

        let fb = ai::evaluate_answer(&*self.ai, &question.question, text)
            .await
            .map_err(|e| CoreError::action("evaluate answer", e))?;

        let answer = Answer {
            id: Uuid::new_v4(),
            question_id: question.id,
            content: text.to_string(),
            word_count: word_count(text),
            time_taken_secs: clock.elapsed(),
            score: fb.score,
            structure_score: fb.structure,
            content_score: fb.content,
            feedback: fb.feedback,
            created_at: Utc::now(),
        };
        let mut updated = session.clone();
        updated.answers.push(answer.clone());
        let finished = updated.current_question_index + 1 >= updated.questions.len();

        repo::save_pair(&*self.store, &updated, &answer, "save answer").await?;
        info!(session = %updated.id, score = answer.score, finished, "answer scored");

        Ok(AnswerSubmitted {
            session: updated,
            answer,
            finished,
        })
    }

    /// Local only; the index is persisted with the next submitted answer.
    pub fn next_question(session: &AnswerSession) -> Result<AnswerSession, CoreError> {
        if session.current_question_index + 1 >= session.questions.len() {
            return Err(CoreError::Invalid("no more questions"));
        }
        let mut s = session.clone();
        s.current_question_index += 1;
        Ok(s)
    }
}

#[derive(Debug)]
pub struct ResponseSubmitted {
    pub session: InterviewSession,
    pub response: InterviewResponse,
    pub completed: bool,
}

#[derive(Clone)]
pub struct InterviewLab {
    store: Arc<dyn RecordStore>,
    ai: Arc<dyn TextGenerator>,
}

impl InterviewLab {
    pub fn new(store: Arc<dyn RecordStore>, ai: Arc<dyn TextGenerator>) -> Self {
        Self { store, ai }
    }

    /// Past sessions, newest first. An unreadable table yields the sample
    /// sessions, flagged by the outcome.
    pub async fn history(&self, scope: Scope) -> (Vec<InterviewSession>, LoadOutcome) {
        session_history(&self.store, scope).await
    }

    pub async fn start(
        &self,
        title: &str,
        panel: PanelType,
        questions: Vec<InterviewQuestion>,
    ) -> Result<InterviewSession, CoreError> {
        if questions.is_empty() {
            return Err(CoreError::Invalid("interview needs at least one question"));
        }
        let mut session = InterviewSession::new(title, panel, questions);
        session.status = InterviewStatus::InProgress;
        repo::save(&*self.store, &session)
            .await
            .map_err(|e| CoreError::action("start interview", e))
    }

    pub async fn submit_response(
        &self,
        session: &InterviewSession,
        text: &str,
        expertise: &[String],
    ) -> Result<ResponseSubmitted, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::Invalid("response is empty"));
        }
        if session.status == InterviewStatus::Completed {
            return Err(CoreError::Invalid("interview already completed"));
        }
        let question = session
            .current_question()
            .ok_or(CoreError::Invalid("session has no current question"))?;

        let fb = ai::evaluate_interview_response(&*self.ai, &question.question, text, expertise)
            .await
            .map_err(|e| CoreError::action("evaluate response", e))?;

        let response = InterviewResponse {
            id: Uuid::new_v4(),
            question_id: question.id,
            response: text.to_string(),
            confidence: fb.confidence,
            clarity: fb.clarity,
            content: fb.content,
            overall_score: fb.overall,
            feedback: fb.feedback,
            timestamp: Utc::now(),
        };
        let mut updated = session.clone();
        updated.responses.push(response.clone());
        updated.current_question_index += 1;
        let completed = updated.current_question_index >= updated.questions.len();
        updated.status = if completed {
            InterviewStatus::Completed
        } else {
            InterviewStatus::InProgress
        };

        repo::save_pair(&*self.store, &updated, &response, "save interview response").await?;
        info!(session = %updated.id, overall = response.overall_score, completed, "response scored");

        Ok(ResponseSubmitted {
            session: updated,
            response,
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_minutes_and_seconds() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(0), "0:00");
    }

    #[test]
    fn countdown_tracks_elapsed() {
        let mut c = Countdown::new(3);
        assert!(!c.tick());
        assert_eq!(c.elapsed(), 1);
        c.tick();
        assert!(c.tick());
        assert!(c.tick());
        assert_eq!(c.elapsed(), 3);
        c.reset();
        assert_eq!(c.display(), "0:03");
    }

    #[test]
    fn advance_records_the_elapsed_seconds() {
        let mut c = Countdown::new(QUESTION_SECONDS);
        assert!(!c.advance(90));
        assert_eq!(c.elapsed(), 90);
        assert_eq!(c.display(), "8:30");
        assert!(c.advance(10_000));
        assert_eq!(c.elapsed(), QUESTION_SECONDS);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn words_are_counted_on_whitespace() {
        assert_eq!(word_count("  The  Finance\nCommission\tmatters "), 4);
        assert_eq!(word_count(""), 0);
    }
}
