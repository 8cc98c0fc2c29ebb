//! Waybook Core Library
//!
//! Shared functionality for the Waybook place-directory tooling:
//! - CSV parsing and import preview
//! - Row normalization and stable-key identity
//! - Reconciliation of incoming rows against existing records
//! - Batched, phased import execution with audit logging
//! - Datastore abstraction with a local SQLite mirror
//! - Standalone duplicate cleanup

pub mod config;
pub mod error;
pub mod import;
pub mod importer;
pub mod models;
pub mod normalize;
pub mod reconcile;
pub mod store;

/// Test utilities (recording/failing datastore doubles)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use error::{Error, Result};
pub use import::{has_required_headers, parse_rows, preview, ImportPreview, RawRow, DEFAULT_PREVIEW_LIMIT};
pub use importer::{
    ExploreImporter, ImportObserver, ImportOptions, WritePhase, WRITE_BATCH_SIZE,
};
pub use models::{
    Caller, Category, CleanupSummary, ExistingRecord, ImportLogEntry, ImportRow, ImportSummary,
    PlaceRecord, PlaceStatus,
};
pub use normalize::{normalize_row, stable_key};
pub use reconcile::{reconcile, surplus_duplicates, PlannedUpsert, ReconciliationPlan};
pub use store::{Datastore, Document, SqliteStore, WriteOp};
