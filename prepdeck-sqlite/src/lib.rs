use prepdeck_core::repo::{merge_patch, row_id, Query, RecordStore, Table};
use prepdeck_core::CoreError;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqliteConnection, SqlitePool};
use std::path::Path;
use tracing::debug;

/// Embedded store: one `records` table holding every row as JSON text,
/// keyed by (table, id). `seq` preserves insertion order.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.as_ref().to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        debug!(path = %path.as_ref().display(), "sqlite store opened");
        Ok(store)
    }

    pub async fn open_memory() -> Result<Self, CoreError> {
        // every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS records (
          tbl   TEXT    NOT NULL,
          id    TEXT    NOT NULL,
          seq   INTEGER NOT NULL,
          body  TEXT    NOT NULL,
          PRIMARY KEY (tbl, id)
        );

        CREATE INDEX IF NOT EXISTS idx_records_tbl_seq ON records (tbl, seq);
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }

    async fn matching(&self, table: Table, query: &Query) -> Result<Vec<(String, Value)>, CoreError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        load_matching(&mut *conn, table, query).await
    }
}

/// Rows of `table` in insertion order, decoded, that satisfy `query`'s filters.
async fn load_matching(
    conn: &mut SqliteConnection,
    table: Table,
    query: &Query,
) -> Result<Vec<(String, Value)>, CoreError> {
    let rows = sqlx::query("SELECT id, body FROM records WHERE tbl=? ORDER BY seq ASC")
        .bind(table.as_str())
        .fetch_all(&mut *conn)
        .await
        .map_err(|_| CoreError::Storage("read records"))?;
    let mut v = Vec::with_capacity(rows.len());
    for row in rows {
        let body = row.get::<String, _>("body");
        let value: Value = serde_json::from_str(&body).map_err(|_| CoreError::Storage("corrupt record"))?;
        if query.matches(&value) {
            v.push((row.get::<String, _>("id"), value));
        }
    }
    Ok(v)
}

fn body_of(row: &Value) -> Result<String, CoreError> {
    serde_json::to_string(row).map_err(|_| CoreError::Storage("encode record"))
}

const NEXT_SEQ: &str = "COALESCE((SELECT MAX(seq) FROM records WHERE tbl=?), 0) + 1";

#[async_trait::async_trait]
impl RecordStore for SqliteStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>, CoreError> {
        let rows = self.matching(table, &Query::all()).await?;
        Ok(query.apply(rows.into_iter().map(|(_, v)| v)))
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        let id = row_id(&row)?;
        let sql = format!("INSERT INTO records (tbl,id,seq,body) VALUES (?,?,{NEXT_SEQ},?)");
        sqlx::query(&sql)
            .bind(table.as_str())
            .bind(&id)
            .bind(table.as_str())
            .bind(body_of(&row)?)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    CoreError::Conflict("row id already exists")
                }
                _ => CoreError::Storage("insert record"),
            })?;
        Ok(row)
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<Value, CoreError> {
        let id = row_id(&row)?;
        let sql = format!(
            "INSERT INTO records (tbl,id,seq,body) VALUES (?,?,{NEXT_SEQ},?) \
             ON CONFLICT(tbl,id) DO UPDATE SET body=excluded.body"
        );
        sqlx::query(&sql)
            .bind(table.as_str())
            .bind(&id)
            .bind(table.as_str())
            .bind(body_of(&row)?)
            .execute(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("upsert record"))?;
        Ok(row)
    }

    async fn update(&self, table: Table, query: &Query, patch: Value) -> Result<Vec<Value>, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("begin tx"))?;
        let hits = load_matching(&mut *tx, table, query).await?;
        let mut out = Vec::with_capacity(hits.len());
        for (id, mut row) in hits {
            merge_patch(&mut row, &patch);
            sqlx::query("UPDATE records SET body=? WHERE tbl=? AND id=?")
                .bind(body_of(&row)?)
                .bind(table.as_str())
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(|_| CoreError::Storage("update record"))?;
            out.push(row);
        }
        tx.commit().await.map_err(|_| CoreError::Storage("commit tx"))?;
        Ok(out)
    }

    async fn delete(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("begin tx"))?;
        let hits = load_matching(&mut *tx, table, query).await?;
        for (id, _) in &hits {
            sqlx::query("DELETE FROM records WHERE tbl=? AND id=?")
                .bind(table.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|_| CoreError::Storage("delete record"))?;
        }
        tx.commit().await.map_err(|_| CoreError::Storage("commit tx"))?;
        Ok(hits.len())
    }

    async fn count(&self, table: Table, query: &Query) -> Result<usize, CoreError> {
        if query.filters.is_empty() {
            let n: i64 = sqlx::query("SELECT COUNT(*) AS n FROM records WHERE tbl=?")
                .bind(table.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("count records"))?
                .get("n");
            return Ok(n as usize);
        }
        Ok(self.matching(table, query).await?.len())
    }
}
