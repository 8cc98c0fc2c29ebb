//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `admins` - Admin access management (grant, revoke, list)
//! - `cleanup` - Standalone duplicate cleanup
//! - `history` - Import run history
//! - `import` - CSV preview and import
//! - `places` - Directory listing

pub mod admins;
pub mod cleanup;
pub mod history;
pub mod import;
pub mod places;

// Re-export command functions for main.rs
pub use admins::*;
pub use cleanup::*;
pub use history::*;
pub use import::*;
pub use places::*;

use anyhow::{Context, Result};
use waybook_core::{Caller, Config, ExploreImporter, SqliteStore};

use crate::cli::Cli;

/// Resolve config, open the local store, and build the importer for
/// the configured tenant
pub fn open_importer(cli: &Cli) -> Result<ExploreImporter<SqliteStore>> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(tenant) = &cli.tenant {
        config.tenant = tenant.clone();
    }
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    let tenant = config.require_tenant()?.to_string();

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let db_path = config
        .db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    let store = SqliteStore::new(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path))?;

    Ok(ExploreImporter::new(store, tenant))
}

/// The acting identity from the global flags
pub fn caller_from(cli: &Cli) -> Caller {
    Caller::new(cli.uid.clone(), cli.name.clone())
}
