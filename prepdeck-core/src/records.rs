//! Plain study records. These carry no derived invariants beyond
//! last-write-wins on the store; the feature services in `planner`,
//! `practice` and `admin` own the few rules they have.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub subject: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>, subject: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            subject: subject.into(),
            tags: Vec::new(),
            is_favorite: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StudyPlan {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub duration_minutes: u32,
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
    pub priority: Priority,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl StudyPlan {
    pub fn new(title: impl Into<String>, subject: impl Into<String>, duration_minutes: u32, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            subject: subject.into(),
            duration_minutes,
            date,
            completed: false,
            priority: Priority::Medium,
            notes: String::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StudyGoal {
    pub id: Uuid,
    pub title: String,
    pub target_date: NaiveDate,
    /// Percent, 0..=100.
    pub progress: u8,
    #[serde(default)]
    pub achieved: bool,
}

impl StudyGoal {
    pub fn new(title: impl Into<String>, target_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            target_date,
            progress: 0,
            achieved: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PanelType {
    Prelims,
    Mains,
    Personality,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewStatus {
    Preparing,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InterviewQuestion {
    pub id: Uuid,
    pub question: String,
    pub category: String,
    pub expected_duration_secs: u32,
    #[serde(default)]
    pub follow_up: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InterviewResponse {
    pub id: Uuid,
    pub question_id: Uuid,
    pub response: String,
    pub confidence: u8,
    pub clarity: u8,
    pub content: u8,
    pub overall_score: u8,
    pub feedback: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InterviewSession {
    pub id: Uuid,
    pub title: String,
    pub panel: PanelType,
    pub questions: Vec<InterviewQuestion>,
    #[serde(default)]
    pub responses: Vec<InterviewResponse>,
    #[serde(default)]
    pub current_question_index: usize,
    pub started_at: DateTime<Utc>,
    pub status: InterviewStatus,
}

impl InterviewSession {
    pub fn new(title: impl Into<String>, panel: PanelType, questions: Vec<InterviewQuestion>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            panel,
            questions,
            responses: Vec::new(),
            current_question_index: 0,
            started_at: Utc::now(),
            status: InterviewStatus::Preparing,
        }
    }

    pub fn current_question(&self) -> Option<&InterviewQuestion> {
        self.questions.get(self.current_question_index)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PracticeQuestion {
    pub id: Uuid,
    pub question: String,
    pub topic: String,
    pub word_limit: u32,
    pub marks: u32,
    pub subject: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: String,
    pub word_count: u32,
    pub time_taken_secs: u32,
    pub score: u8,
    pub structure_score: u8,
    pub content_score: u8,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnswerSession {
    pub id: Uuid,
    pub title: String,
    pub questions: Vec<PracticeQuestion>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub current_question_index: usize,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl AnswerSession {
    pub fn new(title: impl Into<String>, questions: Vec<PracticeQuestion>, duration_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            questions,
            duration_minutes,
            current_question_index: 0,
            started_at: Utc::now(),
            answers: Vec::new(),
        }
    }

    pub fn current_question(&self) -> Option<&PracticeQuestion> {
        self.questions.get(self.current_question_index)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum VisualizationMode {
    Syllabus,
    ConceptMap,
    Geography3D,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConceptNode {
    pub id: Uuid,
    pub name: String,
    pub topic: String,
    pub position: [f32; 3],
    #[serde(default)]
    pub connected_to: Vec<Uuid>,
    pub color: String,
    pub size: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ArVisualization {
    pub id: Uuid,
    pub title: String,
    pub mode: VisualizationMode,
    #[serde(default)]
    pub nodes: Vec<ConceptNode>,
    #[serde(default)]
    pub saved: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentKind {
    Question,
    Article,
    Note,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentStatus {
    Active,
    Pending,
    Rejected,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Active => "Active",
            ContentStatus::Pending => "Pending",
            ContentStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub kind: ContentKind,
    pub status: ContentStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription_status: Option<String>,
    pub last_active: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Fixed key of the single AI settings row.
pub const AI_SETTINGS_ID: Uuid = Uuid::from_u128(1);

/// Text-generation provider chosen on the admin dashboard.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AiSettings {
    pub id: Uuid,
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub endpoint: String,
}

impl AiSettings {
    pub fn new(provider: &str, api_key: &str, endpoint: &str) -> Self {
        Self {
            id: AI_SETTINGS_ID,
            provider: provider.trim().to_string(),
            api_key: api_key.to_string(),
            endpoint: endpoint.trim().to_string(),
        }
    }
}
