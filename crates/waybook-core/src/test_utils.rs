//! Test utilities for waybook-core
//!
//! Datastore wrappers used by integration tests: one that records
//! every batch call, and one that rejects writes the way a remote
//! rule layer would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::store::{Datastore, Document, SqliteStore, WriteOp};

/// Wraps a real store and counts batch writes, keeping a copy of every
/// committed batch for assertions
pub struct RecordingStore {
    inner: SqliteStore,
    batches: Arc<Mutex<Vec<Vec<WriteOp>>>>,
}

impl RecordingStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            inner: SqliteStore::in_memory()?,
            batches: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn batches(&self) -> Vec<Vec<WriteOp>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Seed documents directly, bypassing the recorder
    pub async fn seed(&self, ops: &[WriteOp]) -> Result<()> {
        self.inner.batch_write(ops).await
    }
}

#[async_trait]
impl Datastore for RecordingStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        self.inner.get_document(path).await
    }

    async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>> {
        self.inner.list_documents(collection_path).await
    }

    async fn batch_write(&self, ops: &[WriteOp]) -> Result<()> {
        self.inner.batch_write(ops).await?;
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(ops.to_vec());
        }
        Ok(())
    }

    fn new_document_id(&self, collection_path: &str) -> String {
        self.inner.new_document_id(collection_path)
    }
}

/// Wraps a real store and starts rejecting batch writes after a set
/// number of successes, mimicking a rule-layer rejection mid-run
pub struct FailingStore {
    inner: SqliteStore,
    allowed_batches: usize,
    committed: AtomicUsize,
}

impl FailingStore {
    pub fn new(allowed_batches: usize) -> Result<Self> {
        Ok(Self {
            inner: SqliteStore::in_memory()?,
            allowed_batches,
            committed: AtomicUsize::new(0),
        })
    }

    pub fn committed_batches(&self) -> usize {
        self.committed.load(Ordering::SeqCst)
    }

    pub async fn seed(&self, ops: &[WriteOp]) -> Result<()> {
        self.inner.batch_write(ops).await
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }
}

#[async_trait]
impl Datastore for FailingStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        self.inner.get_document(path).await
    }

    async fn list_documents(&self, collection_path: &str) -> Result<Vec<Document>> {
        self.inner.list_documents(collection_path).await
    }

    async fn batch_write(&self, ops: &[WriteOp]) -> Result<()> {
        if self.committed.load(Ordering::SeqCst) >= self.allowed_batches {
            let path = ops.first().map(WriteOp::path).unwrap_or("").to_string();
            return Err(Error::WriteRejected {
                path,
                tenant: "test".into(),
                uid: "test".into(),
            });
        }
        self.inner.batch_write(ops).await?;
        self.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn new_document_id(&self, collection_path: &str) -> String {
        self.inner.new_document_id(collection_path)
    }
}
