use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::StoreKind;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OrderArg {
    Collection,
    MostOverdue,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PanelArg {
    Prelims,
    Mains,
    Personality,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Syllabus,
    ConceptMap,
    #[value(name = "geography3d")]
    Geography3d,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "prepdeck", version, about = "PrepDeck exam-prep CLI and API")]
pub struct Cli {
    /// Config file (defaults to prepdeck.toml in the config dir)
    #[arg(long, env = "PREPDECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum, env = "PREPDECK_STORE", global = true)]
    pub store: Option<StoreKind>,

    /// SQLite DB path when --store sqlite
    #[arg(long, env = "PREPDECK_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Hosted backend base URL when --store remote
    #[arg(long, env = "PREPDECK_REMOTE_URL", global = true)]
    pub remote_url: Option<String>,

    #[arg(long, env = "PREPDECK_REMOTE_KEY", global = true, hide_env_values = true)]
    pub remote_key: Option<String>,

    /// Text-generation endpoint used to score answers and interviews
    #[arg(long, env = "PREPDECK_AI_URL", global = true)]
    pub ai_url: Option<String>,

    #[arg(long, env = "PREPDECK_AI_KEY", global = true, hide_env_values = true)]
    pub ai_key: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deck operations
    #[command(subcommand)]
    Deck(DeckCmd),
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Review loop over a deck's pending cards
    Review(ReviewCmd),
    /// List due cards
    Due(DueCmd),
    /// Review statistics
    Stats,
    /// Notes
    #[command(subcommand)]
    Note(NoteCmd),
    /// Daily study plans
    #[command(subcommand)]
    Plan(PlanCmd),
    /// Long-term goals
    #[command(subcommand)]
    Goal(GoalCmd),
    /// Timed answer-writing practice for one question
    Answer(AnswerCmd),
    /// Mock interview, one response per question
    Interview(InterviewCmd),
    /// Past answer-writing and interview sessions
    History,
    /// Saved concept maps and syllabus views
    #[command(subcommand)]
    Viz(VizCmd),
    /// Admin dashboard and content moderation
    #[command(subcommand)]
    Admin(AdminCmd),
    /// Launch Axum HTTP API
    Api(ApiCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum DeckCmd {
    Add {
        name: String,
        #[arg(long, default_value = "General")]
        subject: String,
    },
    List,
    Rm { deck: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        #[arg(long)]
        deck: Option<String>,
    },
    Rm { card_id: String },
    Edit(CardEdit),
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub deck: String,
    #[arg(long)]
    pub front: String,
    #[arg(long)]
    pub back: String,
    /// 1 (easy) to 5 (hard)
    #[arg(long, default_value_t = 3)]
    pub difficulty: i64,
}

#[derive(Debug, Args, Clone)]
pub struct CardEdit {
    pub card_id: String,
    #[arg(long)]
    pub front: Option<String>,
    #[arg(long)]
    pub back: Option<String>,
    #[arg(long)]
    pub difficulty: Option<i64>,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewCmd {
    pub deck: String,
    #[arg(long, value_enum, default_value_t = OrderArg::Collection)]
    pub order: OrderArg,
}

#[derive(Debug, Args, Clone)]
pub struct DueCmd {
    #[arg(long)]
    pub deck: Option<String>,
    #[arg(long, default_value_t = 50)]
    pub max: usize,
}

#[derive(Debug, Subcommand, Clone)]
pub enum NoteCmd {
    Add {
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "General")]
        subject: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    List {
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long, default_value = "all")]
        subject: String,
        #[arg(long)]
        favorites: bool,
    },
    Fav { id: String },
    Rm { id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum PlanCmd {
    Add {
        title: String,
        #[arg(long, default_value = "General")]
        subject: String,
        #[arg(long, default_value_t = 60)]
        minutes: u32,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
    },
    List {
        #[arg(long)]
        date: Option<String>,
    },
    Toggle { id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum GoalCmd {
    Add {
        title: String,
        /// YYYY-MM-DD
        #[arg(long)]
        target: String,
    },
    List,
    Progress {
        id: String,
        #[arg(allow_negative_numbers = true)]
        percent: i64,
    },
}

#[derive(Debug, Args, Clone)]
pub struct AnswerCmd {
    #[arg(long)]
    pub question: String,
    #[arg(long, default_value = "General")]
    pub topic: String,
    #[arg(long, default_value = "General")]
    pub subject: String,
    #[arg(long, default_value_t = 150)]
    pub word_limit: u32,
    #[arg(long, default_value_t = 10)]
    pub marks: u32,
}

#[derive(Debug, Args, Clone)]
pub struct InterviewCmd {
    #[arg(long, default_value = "Mock interview")]
    pub title: String,
    #[arg(long, value_enum, default_value_t = PanelArg::Personality)]
    pub panel: PanelArg,
    #[arg(long = "question", required = true)]
    pub questions: Vec<String>,
    #[arg(long = "expertise")]
    pub expertise: Vec<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum VizCmd {
    List {
        #[arg(long)]
        saved: bool,
    },
    /// Create and save an empty visualization
    Add {
        title: String,
        #[arg(long, value_enum, default_value_t = ModeArg::ConceptMap)]
        mode: ModeArg,
    },
    Toggle { id: String },
    Rm { id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum AdminCmd {
    /// User counts
    Stats {
        #[arg(long = "as")]
        admin: String,
    },
    /// Content awaiting review
    Pending {
        #[arg(long = "as")]
        admin: String,
    },
    Approve {
        id: String,
        #[arg(long = "as")]
        admin: String,
    },
    Reject {
        id: String,
        #[arg(long = "as")]
        admin: String,
    },
    /// Show the text-generation provider settings
    ShowAi {
        #[arg(long = "as")]
        admin: String,
    },
    /// Replace the text-generation provider settings
    SetAi {
        provider: String,
        #[arg(long, default_value = "", hide_default_value = true)]
        api_key: String,
        #[arg(long, default_value = "")]
        endpoint: String,
        #[arg(long = "as")]
        admin: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ApiCmd {
    /// Bind address (host:port)
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
}
