//! Configuration loading
//!
//! Settings resolve in order: explicit path, `waybook.toml` in the
//! working directory, the per-user config location, then built-in
//! defaults. Environment variables override files.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Cohort id all paths are scoped under, e.g. `global-84`
    pub tenant: String,
    /// Path to the local document database
    pub db_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tenant: String::new(),
            db_path: default_db_path(),
        }
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    tenant: Option<String>,
    db: Option<String>,
}

/// Per-user config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("waybook").join("waybook.toml"))
}

/// Per-user database location, with a working-directory fallback
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("waybook").join("waybook.db"))
        .unwrap_or_else(|| PathBuf::from("waybook.db"))
}

impl Config {
    /// Load configuration: file (if any), then environment overrides
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let raw = match config_file(override_path) {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                let content = fs::read_to_string(&path)?;
                toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("Invalid config TOML in {}: {}", path.display(), e)))?
            }
            None => RawConfig::default(),
        };

        let mut config = Config {
            tenant: raw.tenant.unwrap_or_default(),
            db_path: raw.db.map(PathBuf::from).unwrap_or_else(default_db_path),
        };

        if let Ok(tenant) = std::env::var("WAYBOOK_TENANT") {
            if !tenant.is_empty() {
                config.tenant = tenant;
            }
        }
        if let Ok(db) = std::env::var("WAYBOOK_DB") {
            if !db.is_empty() {
                config.db_path = PathBuf::from(db);
            }
        }

        Ok(config)
    }

    /// Fail if no tenant is configured; every datastore path needs one
    pub fn require_tenant(&self) -> Result<&str> {
        if self.tenant.is_empty() {
            return Err(Error::MisconfiguredTarget);
        }
        Ok(&self.tenant)
    }
}

fn config_file(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("waybook.toml");
    if local.exists() {
        return Some(local);
    }
    default_config_path().filter(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_config_parses_partial_files() {
        let raw: RawConfig = toml::from_str("tenant = \"global-84\"\n").unwrap();
        assert_eq!(raw.tenant.as_deref(), Some("global-84"));
        assert!(raw.db.is_none());

        let raw: RawConfig = toml::from_str("").unwrap();
        assert!(raw.tenant.is_none());
    }

    #[test]
    fn test_require_tenant() {
        let config = Config {
            tenant: "global-84".into(),
            db_path: PathBuf::from("x.db"),
        };
        assert_eq!(config.require_tenant().unwrap(), "global-84");

        let empty = Config::default();
        assert!(matches!(empty.require_tenant(), Err(Error::MisconfiguredTarget)));
    }
}
