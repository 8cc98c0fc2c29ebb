//! Datastore abstraction
//!
//! The import pipeline talks to an abstract document store: path-addressed
//! JSON documents, full-collection scans, and bounded batch writes. The
//! reference deployment is a managed remote store behind security rules;
//! [`SqliteStore`] is the local mirror the CLI and integration tests run
//! against. Server-assigned timestamps are expressed as a sentinel value
//! each backend resolves with its own clock at write time.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::Result;

/// Key of the sentinel object meaning "assign write-time server clock"
pub const SERVER_TIMESTAMP_KEY: &str = "__serverTimestamp__";

/// Build the server-timestamp sentinel value
pub fn server_timestamp() -> Value {
    json!({ SERVER_TIMESTAMP_KEY: true })
}

/// True if a value is the server-timestamp sentinel
pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .map(|m| m.len() == 1 && m.contains_key(SERVER_TIMESTAMP_KEY))
        .unwrap_or(false)
}

/// Wall-clock capability injected into concrete stores so timestamp
/// resolution is controllable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A document fetched from the store
#[derive(Debug, Clone)]
pub struct Document {
    /// Final path segment
    pub id: String,
    /// Full path, e.g. `cohorts/global-84/explore/abc123`
    pub path: String,
    pub data: Value,
}

/// One operation inside a batch write
#[derive(Debug, Clone)]
pub enum WriteOp {
    Set {
        path: String,
        data: Value,
        /// Merge into the existing document instead of replacing it;
        /// fields absent from `data` are left untouched
        merge: bool,
    },
    Delete {
        path: String,
    },
}

impl WriteOp {
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. } | Self::Delete { path } => path,
        }
    }
}

/// Abstract document datastore. Implementations must apply each
/// `batch_write` call atomically as a unit where the backing store
/// supports it; callers keep batches small.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Fetch a single document, or `None` if absent
    async fn get_document(&self, path: &str) -> Result<Option<Document>>;

    /// Full scan of a collection
    async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>>;

    /// Apply a batch of writes as one unit
    async fn batch_write(&self, ops: &[WriteOp]) -> Result<()>;

    /// Mint a fresh document id for a create in the given collection
    fn new_document_id(&self, collection_path: &str) -> String;

    /// Sentinel resolved to the server clock at write time
    fn server_timestamp(&self) -> Value {
        server_timestamp()
    }
}

/// Split a document path into (collection path, document id)
pub(crate) fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((collection, id)) => (collection, id),
        None => ("", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_timestamp_sentinel() {
        let v = server_timestamp();
        assert!(is_server_timestamp(&v));
        assert!(!is_server_timestamp(&json!({"enabled": true})));
        assert!(!is_server_timestamp(&json!("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn test_split_path() {
        assert_eq!(
            split_path("cohorts/global-84/explore/abc"),
            ("cohorts/global-84/explore", "abc")
        );
        assert_eq!(split_path("lonely"), ("", "lonely"));
    }
}
