use crate::records::{ArVisualization, VisualizationMode};
use crate::sync::{Collection, LoadOutcome};
use crate::{CoreError, RecordStore, Scope};
use std::sync::Arc;
use uuid::Uuid;

/// Stored concept maps and syllabus views. A visualization is only written
/// once the user saves it.
pub struct Gallery {
    pub items: Collection<ArVisualization>,
}

impl Gallery {
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope) -> Self {
        Self {
            items: Collection::new(store, scope),
        }
    }

    pub async fn load(&self) -> LoadOutcome {
        self.items.load().await
    }

    /// A fresh, unsaved visualization with no nodes.
    pub fn start(title: &str, mode: VisualizationMode) -> Result<ArVisualization, CoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::Invalid("visualization needs a title"));
        }
        Ok(ArVisualization {
            id: Uuid::new_v4(),
            title: title.to_string(),
            mode,
            nodes: Vec::new(),
            saved: false,
        })
    }

    /// Marks the visualization saved and writes it.
    pub async fn save(&self, mut viz: ArVisualization) -> Result<ArVisualization, CoreError> {
        viz.saved = true;
        if self.items.get(viz.id).is_some() {
            self.items.update(viz).await
        } else {
            self.items.create(viz).await
        }
    }

    pub async fn toggle_saved(&self, id: Uuid) -> Result<ArVisualization, CoreError> {
        self.items.toggle(id, "saved").await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        self.items.delete(id).await
    }

    pub fn saved(&self) -> Vec<ArVisualization> {
        self.items.records().into_iter().filter(|v| v.saved).collect()
    }

    pub fn by_mode(&self, mode: VisualizationMode) -> Vec<ArVisualization> {
        self.items.records().into_iter().filter(|v| v.mode == mode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, Query, Record, Table};

    fn gallery(store: &Arc<MemoryStore>) -> Gallery {
        Gallery::new(store.clone() as Arc<dyn RecordStore>, Scope::new())
    }

    #[test]
    fn start_needs_a_title() {
        assert!(Gallery::start("  ", VisualizationMode::Syllabus).is_err());
        let v = Gallery::start("GS I syllabus", VisualizationMode::Syllabus).unwrap();
        assert!(!v.saved);
        assert!(v.nodes.is_empty());
    }

    #[tokio::test]
    async fn saving_writes_the_row_marked_saved() {
        let store = Arc::new(MemoryStore::new());
        let g = gallery(&store);
        assert!(matches!(g.load().await, LoadOutcome::Empty));

        let v = Gallery::start("Rivers of India", VisualizationMode::Geography3D).unwrap();
        g.save(v.clone()).await.unwrap();
        assert_eq!(g.saved().len(), 1);
        assert_eq!(g.by_mode(VisualizationMode::Geography3D).len(), 1);
        assert!(g.by_mode(VisualizationMode::ConceptMap).is_empty());

        let row = store.select(Table::ArVisualizations, &Query::by_id(v.id)).await.unwrap();
        assert_eq!(row[0]["saved"], true);

        let off = g.toggle_saved(v.id).await.unwrap();
        assert!(!off.saved);
        assert!(g.saved().is_empty());

        g.delete(v.id).await.unwrap();
        assert_eq!(store.count(Table::ArVisualizations, &Query::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_scope_shows_nothing() {
        let store = Arc::new(MemoryStore::new());
        let g = gallery(&store);
        g.items.scope().close();
        assert!(matches!(g.load().await, LoadOutcome::Cancelled));
        assert!(g.items.records().is_empty());
        assert_ne!(ArVisualization::fallback().len(), 0);
    }
}
