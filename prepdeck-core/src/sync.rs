//! Optimistic local copy of one table.
//!
//! Every write is applied to the local list first, marked pending, sent to
//! the store, and then settled: the server echo replaces the optimistic
//! entry, or the prior entry is restored when the write fails.

use crate::repo::{self, encode, Query, Record, RecordStore};
use crate::{CoreError, Scope};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingOp {
    Create,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Committed,
    Pending(PendingOp),
}

#[derive(Clone, Debug)]
pub struct Entry<T> {
    pub record: T,
    pub state: SyncState,
}

impl<T> Entry<T> {
    fn committed(record: T) -> Self {
        Self {
            record,
            state: SyncState::Committed,
        }
    }
}

/// Result of [`Collection::load`]. A failed read still fills the list with
/// the fallback rows, but says so.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(usize),
    Empty,
    Fallback { error: CoreError },
    Cancelled,
}

impl LoadOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, LoadOutcome::Fallback { .. })
    }
}

pub struct Collection<T: Record> {
    store: Arc<dyn RecordStore>,
    scope: Scope,
    query: Query,
    entries: RwLock<Vec<Entry<T>>>,
}

impl<T: Record> Collection<T> {
    pub fn new(store: Arc<dyn RecordStore>, scope: Scope) -> Self {
        Self::with_query(store, scope, Query::all())
    }

    pub fn with_query(store: Arc<dyn RecordStore>, scope: Scope, query: Query) -> Self {
        Self {
            store,
            scope,
            query,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Visible records: everything except rows with a delete in flight.
    pub fn records(&self) -> Vec<T> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.state != SyncState::Pending(PendingOp::Delete))
            .map(|e| e.record.clone())
            .collect()
    }

    pub fn entries(&self) -> Vec<Entry<T>> {
        self.entries.read().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<T> {
        self.entries
            .read()
            .iter()
            .find(|e| e.record.id() == id)
            .map(|e| e.record.clone())
    }

    pub async fn load(&self) -> LoadOutcome {
        let res = self
            .scope
            .run(repo::fetch_all::<T, _>(&*self.store, &self.query))
            .await;
        match res {
            Ok(rows) => {
                let n = rows.len();
                *self.entries.write() = rows.into_iter().map(Entry::committed).collect();
                debug!(table = %T::TABLE, rows = n, "loaded");
                if n == 0 {
                    LoadOutcome::Empty
                } else {
                    LoadOutcome::Loaded(n)
                }
            }
            Err(CoreError::Cancelled) => LoadOutcome::Cancelled,
            Err(error) => {
                warn!(table = %T::TABLE, %error, "load failed, showing fallback rows");
                *self.entries.write() = T::fallback().into_iter().map(Entry::committed).collect();
                LoadOutcome::Fallback { error }
            }
        }
    }

    /// Idempotent: a repeated create of the same id replaces rather than duplicates.
    pub async fn create(&self, record: T) -> Result<T, CoreError> {
        self.ensure_live()?;
        let id = record.id();
        let prior = self.stage(record.clone(), PendingOp::Create);
        let res = self
            .scope
            .run(repo::save(&*self.store, &record))
            .await
            .map(Some);
        self.settle(id, prior, res, format!("save {}", T::NOUN))
            .map(|r| r.unwrap_or(record))
    }

    pub async fn update(&self, record: T) -> Result<T, CoreError> {
        let id = record.id();
        if self.get(id).is_none() {
            return Err(CoreError::NotFound("record"));
        }
        self.ensure_live()?;
        let prior = self.stage(record.clone(), PendingOp::Update);
        let res = self
            .scope
            .run(repo::save(&*self.store, &record))
            .await
            .map(Some);
        self.settle(id, prior, res, format!("update {}", T::NOUN))
            .map(|r| r.unwrap_or(record))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let Some(current) = self.get(id) else {
            return Err(CoreError::NotFound("record"));
        };
        self.ensure_live()?;
        let prior = self.stage(current, PendingOp::Delete);
        let res = self
            .scope
            .run(repo::remove::<T, _>(&*self.store, id))
            .await;
        let res = match res {
            // already gone remotely
            Err(CoreError::NotFound(_)) | Ok(()) => Ok(None),
            Err(e) => Err(e),
        };
        self.settle(id, prior, res, format!("delete {}", T::NOUN))
            .map(|_| ())
    }

    /// Writes `record` and drops it from the local list, for records that
    /// no longer match the collection's query after the write.
    pub async fn update_and_evict(&self, record: T) -> Result<T, CoreError> {
        let id = record.id();
        if self.get(id).is_none() {
            return Err(CoreError::NotFound("record"));
        }
        self.ensure_live()?;
        let prior = self.stage(record.clone(), PendingOp::Delete);
        let res = self
            .scope
            .run(repo::save(&*self.store, &record))
            .await
            .map(|_| None);
        self.settle(id, prior, res, format!("update {}", T::NOUN))
            .map(|_| record)
    }

    /// Flips a boolean field and sends only that field.
    pub async fn toggle(&self, id: Uuid, field: &str) -> Result<T, CoreError> {
        let current = self.get(id).ok_or(CoreError::NotFound("record"))?;
        let mut row = encode(&current)?;
        let flipped = match row.get(field) {
            Some(Value::Bool(b)) => !*b,
            _ => return Err(CoreError::Invalid("field is not a boolean")),
        };
        row[field] = Value::Bool(flipped);
        let toggled: T = repo::decode(row)?;

        self.ensure_live()?;
        let prior = self.stage(toggled.clone(), PendingOp::Update);
        let res = self
            .scope
            .run(repo::patch::<T, _>(&*self.store, id, json!({ field: flipped })))
            .await
            .map(Some);
        self.settle(id, prior, res, format!("update {}", T::NOUN))
            .map(|r| r.unwrap_or(toggled))
    }

    fn ensure_live(&self) -> Result<(), CoreError> {
        if self.scope.is_live() {
            Ok(())
        } else {
            Err(CoreError::Cancelled)
        }
    }

    /// Applies the optimistic value and returns the entry it displaced.
    fn stage(&self, record: T, op: PendingOp) -> Option<Entry<T>> {
        let id = record.id();
        let mut entries = self.entries.write();
        let entry = Entry {
            record,
            state: SyncState::Pending(op),
        };
        match entries.iter().position(|e| e.record.id() == id) {
            Some(i) => Some(std::mem::replace(&mut entries[i], entry)),
            None => {
                entries.push(entry);
                None
            }
        }
    }

    fn settle(
        &self,
        id: Uuid,
        prior: Option<Entry<T>>,
        res: Result<Option<T>, CoreError>,
        action: String,
    ) -> Result<Option<T>, CoreError> {
        // a closed scope means the owner is gone; leave its state alone
        if !self.scope.is_live() {
            return Err(CoreError::Cancelled);
        }
        let mut entries = self.entries.write();
        let pos = entries.iter().position(|e| e.record.id() == id);
        match res {
            Ok(echo) => {
                if let Some(i) = pos {
                    if entries[i].state == SyncState::Pending(PendingOp::Delete) {
                        entries.remove(i);
                    } else {
                        if let Some(server) = &echo {
                            entries[i].record = server.clone();
                        }
                        entries[i].state = SyncState::Committed;
                    }
                }
                Ok(echo)
            }
            Err(e) => {
                warn!(table = %T::TABLE, %id, error = %e, "{action} failed, rolling back");
                match (pos, prior) {
                    (Some(i), Some(p)) => entries[i] = p,
                    (Some(i), None) => {
                        entries.remove(i);
                    }
                    (None, Some(p)) => entries.push(p),
                    (None, None) => {}
                }
                Err(CoreError::action(action, e))
            }
        }
    }
}
