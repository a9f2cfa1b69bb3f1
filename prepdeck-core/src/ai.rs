//! The external text-generation endpoint and the scoring prompts built on it.

use crate::CoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::VecDeque;

pub const SCORE_MIN: u8 = 1;
pub const SCORE_MAX: u8 = 10;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, CoreError>;
}

/// Replays canned replies in order; used offline and in tests.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, CoreError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, err: CoreError) -> Self {
        self.replies.lock().push_back(Err(err));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CoreError> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or(Err(CoreError::Storage("no scripted reply")))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnswerFeedback {
    pub score: u8,
    pub structure: u8,
    pub content: u8,
    pub feedback: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterviewFeedback {
    pub confidence: u8,
    pub clarity: u8,
    pub content: u8,
    pub overall: u8,
    pub feedback: String,
}

#[derive(Deserialize)]
struct RawAnswer {
    score: f64,
    structure: f64,
    content: f64,
    #[serde(default)]
    feedback: String,
}

#[derive(Deserialize)]
struct RawInterview {
    confidence: f64,
    clarity: f64,
    content: f64,
    #[serde(default)]
    overall: Option<f64>,
    #[serde(default)]
    feedback: String,
}

fn clamp_score(x: f64) -> u8 {
    if x.is_nan() {
        return SCORE_MIN;
    }
    x.round().clamp(SCORE_MIN as f64, SCORE_MAX as f64) as u8
}

/// The reply may wrap its JSON object in prose or a code fence.
fn extract_json<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T, CoreError> {
    let start = text.find('{').ok_or(CoreError::Invalid("reply has no JSON object"))?;
    let end = text.rfind('}').ok_or(CoreError::Invalid("reply has no JSON object"))?;
    if end < start {
        return Err(CoreError::Invalid("reply has no JSON object"));
    }
    serde_json::from_str(&text[start..=end]).map_err(|_| CoreError::Invalid("reply JSON has the wrong shape"))
}

pub async fn evaluate_answer<G: TextGenerator + ?Sized>(
    gen: &G,
    question: &str,
    answer: &str,
) -> Result<AnswerFeedback, CoreError> {
    let prompt = format!(
        "You are a civil services mains examiner. Score the answer below.\n\
         Reply with only a JSON object: {{\"score\": 1-10, \"structure\": 1-10, \"content\": 1-10, \"feedback\": string}}.\n\n\
         Question: {question}\n\nAnswer:\n{answer}"
    );
    let reply = gen.generate(&prompt).await?;
    let raw: RawAnswer = extract_json(&reply)?;
    Ok(AnswerFeedback {
        score: clamp_score(raw.score),
        structure: clamp_score(raw.structure),
        content: clamp_score(raw.content),
        feedback: raw.feedback.trim().to_string(),
    })
}

pub async fn evaluate_interview_response<G: TextGenerator + ?Sized>(
    gen: &G,
    question: &str,
    response: &str,
    expertise: &[String],
) -> Result<InterviewFeedback, CoreError> {
    let panel = if expertise.is_empty() {
        "general administration".to_string()
    } else {
        expertise.join(", ")
    };
    let prompt = format!(
        "You are an interview board member with expertise in {panel}. Rate the candidate's response.\n\
         Reply with only a JSON object: {{\"confidence\": 1-10, \"clarity\": 1-10, \"content\": 1-10, \"overall\": 1-10, \"feedback\": string}}.\n\n\
         Question: {question}\n\nResponse:\n{response}"
    );
    let reply = gen.generate(&prompt).await?;
    let raw: RawInterview = extract_json(&reply)?;
    let confidence = clamp_score(raw.confidence);
    let clarity = clamp_score(raw.clarity);
    let content = clamp_score(raw.content);
    // missing overall: mean of the three
    let overall = raw
        .overall
        .map(clamp_score)
        .unwrap_or_else(|| clamp_score((confidence as f64 + clarity as f64 + content as f64) / 3.0));
    Ok(InterviewFeedback {
        confidence,
        clarity,
        content,
        overall,
        feedback: raw.feedback.trim().to_string(),
    })
}

pub async fn summarize<G: TextGenerator + ?Sized>(gen: &G, text: &str) -> Result<String, CoreError> {
    let prompt = format!(
        "Summarize the following news item for an exam aspirant in at most three sentences, \
         noting its relevance to the syllabus.\n\n{text}"
    );
    let out = gen.generate(&prompt).await?;
    let out = out.trim();
    if out.is_empty() {
        return Err(CoreError::Invalid("empty summary"));
    }
    Ok(out.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answer_scores_are_parsed_from_fenced_reply() {
        let gen = ScriptedGenerator::new().reply(
            "Here you go:\n```json\n{\"score\": 7.4, \"structure\": 12, \"content\": 0, \"feedback\": \" Add examples. \"}\n```",
        );
        let fb = evaluate_answer(&gen, "Q?", "A.").await.unwrap();
        assert_eq!(fb.score, 7);
        assert_eq!(fb.structure, SCORE_MAX);
        assert_eq!(fb.content, SCORE_MIN);
        assert_eq!(fb.feedback, "Add examples.");
        assert!(gen.prompts()[0].contains("Question: Q?"));
    }

    #[tokio::test]
    async fn interview_overall_defaults_to_mean() {
        let gen = ScriptedGenerator::new()
            .reply(r#"{"confidence": 6, "clarity": 8, "content": 7, "feedback": "ok"}"#);
        let fb = evaluate_interview_response(&gen, "Q", "R", &["Economy".into()])
            .await
            .unwrap();
        assert_eq!(fb.overall, 7);
        assert!(gen.prompts()[0].contains("Economy"));
    }

    #[tokio::test]
    async fn prose_reply_is_rejected() {
        let gen = ScriptedGenerator::new().reply("Great answer!");
        let err = evaluate_answer(&gen, "Q", "A").await.unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
    }
}
