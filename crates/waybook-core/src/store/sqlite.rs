//! SQLite-backed document store
//!
//! Path-addressed JSON documents in a single table, with batch writes
//! applied inside one SQL transaction. This is the store the CLI and
//! integration tests run against; remote backends implement the same
//! [`Datastore`] trait elsewhere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tracing::info;

use super::{is_server_timestamp, split_path, Clock, Datastore, Document, SystemClock, WriteOp};
use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Local document store over SQLite with connection pooling
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
    clock: Arc<dyn Clock>,
    db_path: String,
}

impl SqliteStore {
    /// Open (or create) a store at the given path
    pub fn new(path: &str) -> Result<Self> {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    /// Open a store with an explicit clock (used by tests)
    pub fn with_clock(path: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let store = Self {
            pool,
            clock,
            db_path: path.to_string(),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Create a throwaway store for testing.
    ///
    /// Uses a temporary file rather than `:memory:` because each pooled
    /// connection to `:memory:` would see its own empty database.
    pub fn in_memory() -> Result<Self> {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/waybook_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );
        let _ = std::fs::remove_file(&path);
        Self::new(&path)
    }

    /// Path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS documents (
                path TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
            "#,
        )?;
        info!("Document store schema initialized");
        Ok(())
    }

    /// Replace every server-timestamp sentinel at the top level of a
    /// payload with the current clock reading
    fn resolve_timestamps(&self, data: &Value) -> Value {
        let now = Value::String(
            self.clock
                .now()
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        match data.as_object() {
            Some(map) => {
                let resolved = map
                    .iter()
                    .map(|(k, v)| {
                        let v = if is_server_timestamp(v) { now.clone() } else { v.clone() };
                        (k.clone(), v)
                    })
                    .collect();
                Value::Object(resolved)
            }
            None => data.clone(),
        }
    }

    fn apply_set(&self, conn: &rusqlite::Connection, path: &str, data: &Value, merge: bool) -> Result<()> {
        let (collection, _) = split_path(path);
        let resolved = self.resolve_timestamps(data);

        let payload = if merge {
            let existing: Option<String> = conn
                .query_row("SELECT data FROM documents WHERE path = ?", params![path], |row| {
                    row.get(0)
                })
                .optional()?;

            match existing {
                Some(json) => {
                    let mut base: Value = serde_json::from_str(&json)?;
                    if let (Some(base_map), Some(new_map)) = (base.as_object_mut(), resolved.as_object()) {
                        for (k, v) in new_map {
                            base_map.insert(k.clone(), v.clone());
                        }
                        base
                    } else {
                        resolved
                    }
                }
                None => resolved,
            }
        } else {
            resolved
        };

        conn.execute(
            r#"
            INSERT INTO documents (path, collection, data) VALUES (?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET data = excluded.data
            "#,
            params![path, collection, payload.to_string()],
        )?;
        Ok(())
    }
}

#[async_trait]
impl Datastore for SqliteStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        let conn = self.conn()?;
        let row: Option<String> = conn
            .query_row("SELECT data FROM documents WHERE path = ?", params![path], |row| {
                row.get(0)
            })
            .optional()?;

        match row {
            Some(json) => {
                let (_, id) = split_path(path);
                Ok(Some(Document {
                    id: id.to_string(),
                    path: path.to_string(),
                    data: serde_json::from_str(&json)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT path, data FROM documents WHERE collection = ? ORDER BY path")?;

        let rows: Vec<(String, String)> = stmt
            .query_map(params![collection_path], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(path, json)| {
                let (_, id) = split_path(&path);
                Ok(Document {
                    id: id.to_string(),
                    path: path.clone(),
                    data: serde_json::from_str(&json)?,
                })
            })
            .collect()
    }

    async fn batch_write(&self, ops: &[WriteOp]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for op in ops {
            match op {
                WriteOp::Set { path, data, merge } => self.apply_set(&tx, path, data, *merge)?,
                WriteOp::Delete { path } => {
                    tx.execute("DELETE FROM documents WHERE path = ?", params![path])
                        .map(|_| ())?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn new_document_id(&self, _collection_path: &str) -> String {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let nanos = self
            .clock
            .now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| self.clock.now().timestamp_micros());
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{:x}{:04x}", nanos, seq & 0xffff)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("db_path", &self.db_path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::server_timestamp;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let path = "cohorts/test/explore/a1";

        store
            .batch_write(&[WriteOp::Set {
                path: path.into(),
                data: json!({"name": "Toast Box", "city": "Singapore"}),
                merge: false,
            }])
            .await
            .unwrap();

        let doc = store.get_document(path).await.unwrap().unwrap();
        assert_eq!(doc.id, "a1");
        assert_eq!(doc.data["name"], "Toast Box");

        store
            .batch_write(&[WriteOp::Delete { path: path.into() }])
            .await
            .unwrap();
        assert!(store.get_document(path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_set_preserves_absent_fields() {
        let store = SqliteStore::in_memory().unwrap();
        let path = "cohorts/test/explore/a1";

        store
            .batch_write(&[WriteOp::Set {
                path: path.into(),
                data: json!({"name": "Toast Box", "createdByUid": "u1"}),
                merge: false,
            }])
            .await
            .unwrap();

        store
            .batch_write(&[WriteOp::Set {
                path: path.into(),
                data: json!({"name": "Toast Box SG"}),
                merge: true,
            }])
            .await
            .unwrap();

        let doc = store.get_document(path).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Toast Box SG");
        assert_eq!(doc.data["createdByUid"], "u1");
    }

    #[tokio::test]
    async fn test_server_timestamp_resolution() {
        let store = SqliteStore::in_memory().unwrap();
        let path = "cohorts/test/explore/a1";

        store
            .batch_write(&[WriteOp::Set {
                path: path.into(),
                data: json!({"name": "Toast Box", "createdAt": server_timestamp()}),
                merge: false,
            }])
            .await
            .unwrap();

        let doc = store.get_document(path).await.unwrap().unwrap();
        let created = doc.data["createdAt"].as_str().unwrap();
        assert!(
            chrono::DateTime::parse_from_rfc3339(created).is_ok(),
            "expected RFC3339 timestamp, got {}",
            created
        );
    }

    #[tokio::test]
    async fn test_list_documents_scoped_to_collection() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .batch_write(&[
                WriteOp::Set {
                    path: "cohorts/test/explore/a".into(),
                    data: json!({"name": "A"}),
                    merge: false,
                },
                WriteOp::Set {
                    path: "cohorts/test/admins/u1".into(),
                    data: json!({"enabled": true}),
                    merge: false,
                },
            ])
            .await
            .unwrap();

        let docs = store.list_documents("cohorts/test/explore").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "a");
    }

    #[test]
    fn test_new_document_ids_are_unique() {
        let store = SqliteStore::in_memory().unwrap();
        let a = store.new_document_id("cohorts/test/explore");
        let b = store.new_document_id("cohorts/test/explore");
        assert_ne!(a, b);
    }
}
