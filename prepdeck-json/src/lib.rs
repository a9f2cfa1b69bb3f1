use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use prepdeck_core::repo::memory::TableSet;
use prepdeck_core::{CoreError, Query, RecordStore, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;
use tracing::{debug, warn};

pub mod paths;

const FILE_VERSION: u32 = 1;

/// On-disk layout, as read back.
#[derive(Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    tables: BTreeMap<Table, Vec<Value>>,
}

/// Same layout, serialized straight from the in-memory tables.
#[derive(Serialize)]
struct ImageRef<'a> {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tables: &'a BTreeMap<Table, Vec<Value>>,
}

struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    rows: TableSet,
}

impl State {
    fn encode(&self) -> Result<Vec<u8>, CoreError> {
        encode_image(self.created_at, self.updated_at, &self.rows)
    }
}

fn encode_image(created_at: DateTime<Utc>, updated_at: DateTime<Utc>, rows: &TableSet) -> Result<Vec<u8>, CoreError> {
    let image = ImageRef {
        version: FILE_VERSION,
        created_at,
        updated_at,
        tables: rows.tables(),
    };
    serde_json::to_vec_pretty(&image).map_err(|_| CoreError::Storage("encode store file"))
}

/// Whole-file JSON store. A write is applied to a copy of the tables, the
/// copy is written out, and only then does it replace what readers see.
/// The newest `max_backups` images are kept as timestamped copies.
pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
    // one commit at a time; readers never wait on it
    writer: Mutex<()>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        let max_backups = max_backups.max(1);
        let state = open_state(path.clone(), backups_dir.clone(), max_backups).await?;
        debug!(path = %path.display(), "json store opened");
        Ok(Self {
            path,
            backups_dir,
            max_backups,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `apply` on a copy of the tables. When it reports a change the
    /// copy is persisted and swapped in; on any failure the visible tables
    /// stay as they were.
    async fn commit<R, F>(&self, apply: F) -> Result<R, CoreError>
    where
        F: FnOnce(&mut TableSet) -> Result<(R, bool), CoreError>,
    {
        let _writer = self.writer.lock().await;
        let (mut next, created_at) = {
            let s = self.state.read();
            (s.rows.clone(), s.created_at)
        };
        let (out, changed) = apply(&mut next)?;
        if !changed {
            return Ok(out);
        }

        let updated_at = Utc::now();
        let bytes = encode_image(created_at, updated_at, &next)?;
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;
        task::spawn_blocking(move || persist(&path, &backups, keep, &bytes))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|e| {
                warn!(path = %self.path.display(), error = %e, "json store write failed");
                CoreError::Storage("io")
            })?;

        let mut s = self.state.write();
        s.rows = next;
        s.updated_at = updated_at;
        Ok(out)
    }
}

async fn open_state(path: PathBuf, backups_dir: PathBuf, keep: usize) -> Result<State, CoreError> {
    task::spawn_blocking(move || match read_image(&path) {
        Ok(Some(img)) if img.version > FILE_VERSION => Err(CoreError::Storage("store file is from a newer version")),
        Ok(Some(img)) => Ok(State {
            created_at: img.created_at,
            updated_at: img.updated_at,
            rows: TableSet::from_tables(img.tables),
        }),
        Ok(None) => {
            let now = Utc::now();
            let state = State {
                created_at: now,
                updated_at: now,
                rows: TableSet::new(),
            };
            persist(&path, &backups_dir, keep, &state.encode()?).map_err(|_| CoreError::Storage("io"))?;
            Ok(state)
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(CoreError::Storage("corrupt store file")),
        Err(_) => Err(CoreError::Storage("io")),
    })
    .await
    .map_err(|_| CoreError::Storage("io"))?
}

/// `None` when there is no store file yet.
fn read_image(path: &Path) -> io::Result<Option<FileImage>> {
    let buf = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&buf)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Both copies are fully written to temp files before either becomes
/// visible, so a failure up to that point leaves the disk untouched.
fn persist(path: &Path, backups_dir: &Path, keep: usize, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    fs::create_dir_all(backups_dir)?;
    let main = staged(dir, bytes)?;
    let backup = staged(backups_dir, bytes)?;

    main.persist(path).map_err(|e| e.error)?;

    let stamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
    let backup_path = backups_dir.join(format!("prepdeck-{stamp}.json"));
    if let Err(e) = backup.persist(&backup_path) {
        warn!(path = %backup_path.display(), error = %e.error, "backup not kept");
        return Ok(());
    }
    if let Err(e) = prune_backups(backups_dir, keep) {
        warn!(dir = %backups_dir.display(), error = %e, "backup pruning failed");
    }
    Ok(())
}

fn staged(dir: &Path, bytes: &[u8]) -> io::Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Keeps the `keep` newest `prepdeck-*.json` files. Names embed the
/// timestamp, so name order is age order.
fn prune_backups(dir: &Path, keep: usize) -> io::Result<()> {
    let mut names: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("prepdeck-") && n.ends_with(".json"))
        })
        .collect();
    if names.len() <= keep {
        return Ok(());
    }
    names.sort();
    let stale = names.len() - keep;
    for p in names.iter().take(stale) {
        fs::remove_file(p)?;
    }
    Ok(())
}

#[async_trait]
impl RecordStore for JsonStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, CoreError> {
        Ok(self.state.read().rows.select(table, query))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.commit(|rows| rows.insert(table, row).map(|out| (out, true)))
            .await
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        self.commit(|rows| rows.upsert(table, row).map(|out| (out, true)))
            .await
    }

    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>, CoreError> {
        self.commit(|rows| {
            let out = rows.update(table, query, &patch);
            let changed = !out.is_empty();
            Ok((out, changed))
        })
        .await
    }

    async fn delete(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        self.commit(|rows| {
            let n = rows.delete(table, query);
            Ok((n, n > 0))
        })
        .await
    }

    async fn count(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        Ok(self.state.read().rows.count(table, query))
    }
}
