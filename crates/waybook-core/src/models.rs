//! Domain models for Waybook

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived classification for a place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Dining,
    Activity,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dining => "dining",
            Self::Activity => "activity",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dining" => Ok(Self::Dining),
            "activity" => Ok(Self::Activity),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Listing status. Archived records are hidden from normal listings but
/// not physically deleted by ordinary archive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaceStatus {
    #[default]
    Active,
    Archived,
}

impl PlaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl std::str::FromStr for PlaceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

impl std::fmt::Display for PlaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The canonical "Explore" entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRecord {
    /// Datastore-assigned identifier; stable for the record's lifetime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub city: String,
    #[serde(rename = "type")]
    pub place_type: String,
    pub category: Category,
    pub name: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub google_maps_url: String,
    #[serde(default)]
    pub reservation_url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub recommended_by: String,
    /// Derived identity; two records with the same stable key are the same
    /// real-world place and converge to one record after reconciliation.
    pub stable_key: String,
    #[serde(default)]
    pub status: PlaceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by_uid: Option<String>,
}

/// One normalized CSV row. Transient: created per line, consumed by
/// preview/reconciliation, discarded after the import call returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRow {
    /// 1-based position in the original file
    pub row_number: usize,
    pub valid: bool,
    pub city: String,
    pub place_type: String,
    pub category: Category,
    pub name: String,
    pub neighborhood: String,
    pub hours: String,
    pub price: String,
    pub tags: Vec<String>,
    pub google_maps_url: String,
    pub reservation_url: String,
    pub notes: String,
    pub recommended_by: String,
}

/// Append-only audit entry, one per import run. Never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportLogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub admin_uid: String,
    #[serde(default)]
    pub file_name: String,
    pub imported_count: u64,
    pub updated_count: u64,
    pub skipped_count: u64,
    pub removed_duplicates: u64,
}

/// Minimal view of an existing datastore record used by reconciliation.
/// Records missing city/type/name cannot carry a stable key and are
/// ignored for grouping.
#[derive(Debug, Clone)]
pub struct ExistingRecord {
    pub id: String,
    pub city: String,
    pub place_type: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Authenticated identity performing an import or cleanup
#[derive(Debug, Clone)]
pub struct Caller {
    pub uid: String,
    pub display_name: String,
}

impl Caller {
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
        }
    }
}

/// Aggregate counts returned by a completed import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: u64,
    pub updated: u64,
    pub skipped: u64,
    pub removed_duplicates: u64,
}

/// Counts returned by the standalone cleanup job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub removed_duplicates: u64,
}
