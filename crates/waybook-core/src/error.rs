//! Error types for Waybook

use thiserror::Error;

use crate::importer::WritePhase;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("No tenant configured (set `tenant` in waybook.toml or WAYBOOK_TENANT)")]
    MisconfiguredTarget,

    #[error("Caller {uid} is not an enabled admin for tenant {tenant}")]
    PermissionDenied { uid: String, tenant: String },

    #[error("No valid rows found (need city, type, name)")]
    NoValidRows,

    #[error("Batch write failed in {phase} phase, batch {batch_index}: {source}")]
    BatchWrite {
        phase: WritePhase,
        batch_index: usize,
        #[source]
        source: Box<Error>,
    },

    /// The backend's rule layer rejected a write that passed the preflight
    /// admin check (stale admin flag, rule/config drift). Carries enough
    /// context for an operator to reconcile rule configuration.
    #[error("Write to {path} rejected by server rules (tenant {tenant}, caller {uid})")]
    WriteRejected {
        path: String,
        tenant: String,
        uid: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
