use crate::repo::{merge_patch, row_id, Query, RecordStore, Table};
use crate::CoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

/// Rows per table in insertion order. Shared by the in-memory store and
/// the file-backed stores that keep a full image in memory.
#[derive(Clone, Debug, Default)]
pub struct TableSet {
    tables: BTreeMap<Table, Vec<Value>>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: BTreeMap<Table, Vec<Value>>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &BTreeMap<Table, Vec<Value>> {
        &self.tables
    }

    fn rows(&self, table: Table) -> &[Value] {
        self.tables.get(&table).map(|v| v.as_slice()).unwrap_or(&[])
    }

    fn position(&self, table: Table, id: &str) -> Option<usize> {
        self.rows(table)
            .iter()
            .position(|r| r.get("id").and_then(|v| v.as_str()) == Some(id))
    }

    pub fn select(&self, table: Table, query: &Query) -> Vec<Value> {
        query.apply(self.rows(table).iter().cloned())
    }

    pub fn insert(&mut self, table: Table, row: Value) -> Result<Value, CoreError> {
        let id = row_id(&row)?;
        if self.position(table, &id).is_some() {
            return Err(CoreError::Conflict("row id already exists"));
        }
        self.tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    pub fn upsert(&mut self, table: Table, row: Value) -> Result<Value, CoreError> {
        let id = row_id(&row)?;
        match self.position(table, &id) {
            Some(i) => {
                if let Some(rows) = self.tables.get_mut(&table) {
                    rows[i] = row.clone();
                }
            }
            None => self.tables.entry(table).or_default().push(row.clone()),
        }
        Ok(row)
    }

    pub fn update(&mut self, table: Table, query: &Query, patch: &Value) -> Vec<Value> {
        let Some(rows) = self.tables.get_mut(&table) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for row in rows.iter_mut().filter(|r| query.matches(r)) {
            merge_patch(row, patch);
            out.push(row.clone());
        }
        out
    }

    pub fn delete(&mut self, table: Table, query: &Query) -> usize {
        let Some(rows) = self.tables.get_mut(&table) else {
            return 0;
        };
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        before - rows.len()
    }

    pub fn count(&self, table: Table, query: &Query) -> usize {
        self.rows(table).iter().filter(|r| query.matches(r)).count()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<TableSet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, CoreError> {
        Ok(self.state.read().select(table, query))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.state.write().insert(table, row)
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.state.write().upsert(table, row)
    }

    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>, CoreError> {
        Ok(self.state.write().update(table, query, &patch))
    }

    async fn delete(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        Ok(self.state.write().delete(table, query))
    }

    async fn count(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        Ok(self.state.read().count(table, query))
    }
}
