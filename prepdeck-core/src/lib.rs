pub mod admin;
pub mod ai;
pub mod errors;
pub mod fallback;
pub mod filters;
pub mod flashcards;
pub mod gallery;
pub mod models;
pub mod notes;
pub mod planner;
pub mod practice;
pub mod records;
pub mod repo;
pub mod scheduler;
pub mod scope;
pub mod session;
pub mod stats;
pub mod sync;

pub use errors::*;
pub use filters::*;
pub use flashcards::{DeckBoard, Flashcards};
pub use models::*;
pub use repo::{memory::MemoryStore, Query, Record, RecordStore, Table};
pub use scheduler::*;
pub use scope::Scope;
pub use session::*;
pub use stats::*;
pub use sync::{Collection, LoadOutcome, SyncState};
