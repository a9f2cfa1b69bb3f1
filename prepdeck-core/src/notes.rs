use crate::filters::{filter_notes_by_subject, filter_notes_by_text};
use crate::records::Note;
use crate::sync::{Collection, LoadOutcome};
use crate::{CoreError, RecordStore, Scope};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct Notebook {
    pub notes: Collection<Note>,
}

impl Notebook {
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope) -> Self {
        Self {
            notes: Collection::new(store, scope),
        }
    }

    pub async fn load(&self) -> LoadOutcome {
        self.notes.load().await
    }

    /// Creates the note, or updates it when the id is already known.
    pub async fn save(&self, mut note: Note) -> Result<Note, CoreError> {
        if note.title.trim().is_empty() || note.content.trim().is_empty() {
            return Err(CoreError::Invalid("note needs a title and content"));
        }
        note.updated_at = Utc::now();
        if self.notes.get(note.id).is_some() {
            self.notes.update(note).await
        } else {
            self.notes.create(note).await
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        self.notes.delete(id).await
    }

    pub async fn toggle_favorite(&self, id: Uuid) -> Result<Note, CoreError> {
        self.notes.toggle(id, "is_favorite").await
    }

    pub fn search(&self, query: &str, subject: &str) -> Vec<Note> {
        let by_subject = filter_notes_by_subject(&self.notes.records(), subject);
        let mut v = filter_notes_by_text(&by_subject, query);
        v.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        v
    }
}
