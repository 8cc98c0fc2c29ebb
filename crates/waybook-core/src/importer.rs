//! Import execution: auth gate, batched writes, audit logging
//!
//! [`ExploreImporter`] is the write side of the pipeline. It runs the
//! admin preflight, snapshots the directory, asks the reconciler for a
//! plan, then applies the plan in small batches across three ordered
//! phases. A failed batch aborts the run; earlier committed batches
//! stay committed, and re-running the same file is the recovery path
//! because every operation converges on stable keys.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{
    Caller, CleanupSummary, ExistingRecord, ImportLogEntry, ImportRow, ImportSummary, PlaceRecord,
    PlaceStatus,
};
use crate::reconcile::{reconcile, surplus_duplicates, ReconciliationPlan};
use crate::store::{Datastore, Document, WriteOp};

/// Writes per batch. Kept small so one malformed document fails fast
/// and the abort point is easy to locate in the log.
pub const WRITE_BATCH_SIZE: usize = 10;

/// Ordered phases of an import's write stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    DeleteSurplus,
    Upsert,
    WriteLog,
}

impl WritePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeleteSurplus => "delete-surplus",
            Self::Upsert => "upsert",
            Self::WriteLog => "write-log",
        }
    }
}

impl std::fmt::Display for WritePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress callbacks during the write stage. All methods default to
/// no-ops; the CLI uses this for progress output.
pub trait ImportObserver: Send + Sync {
    fn phase_started(&self, _phase: WritePhase, _total_ops: usize) {}
    fn batch_committed(&self, _phase: WritePhase, _batch_index: usize, _ops: usize) {}
    fn phase_completed(&self, _phase: WritePhase) {}
}

struct NoopObserver;

impl ImportObserver for NoopObserver {}

/// Per-run options
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Original file name recorded in the audit log
    pub file_name: String,
}

/// Executes imports and cleanup against one tenant's directory
pub struct ExploreImporter<S: Datastore> {
    store: S,
    tenant: String,
    batch_size: usize,
    observer: Arc<dyn ImportObserver>,
}

impl<S: Datastore> ExploreImporter<S> {
    pub fn new(store: S, tenant: impl Into<String>) -> Self {
        Self {
            store,
            tenant: tenant.into(),
            batch_size: WRITE_BATCH_SIZE,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ImportObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn explore_path(&self) -> String {
        format!("cohorts/{}/explore", self.tenant)
    }

    fn log_path(&self) -> String {
        format!("cohorts/{}/exploreImportLogs", self.tenant)
    }

    fn admin_path(&self, uid: &str) -> String {
        format!("cohorts/{}/admins/{}", self.tenant, uid)
    }

    /// True when the caller has an admin record with `enabled: true`.
    /// Any other shape (absent record, `enabled` false or non-boolean)
    /// is not an admin.
    pub async fn is_admin(&self, uid: &str) -> Result<bool> {
        let doc = self.store.get_document(&self.admin_path(uid)).await?;
        Ok(doc
            .map(|d| d.data.get("enabled").and_then(Value::as_bool).unwrap_or(false))
            .unwrap_or(false))
    }

    async fn ensure_admin(&self, caller: &Caller) -> Result<()> {
        if caller.uid.is_empty() {
            return Err(Error::Unauthenticated);
        }
        if !self.is_admin(&caller.uid).await? {
            warn!(uid = %caller.uid, tenant = %self.tenant, "Import rejected: caller is not an enabled admin");
            return Err(Error::PermissionDenied {
                uid: caller.uid.clone(),
                tenant: self.tenant.clone(),
            });
        }
        Ok(())
    }

    /// Snapshot the directory as reconciliation input
    async fn fetch_existing(&self) -> Result<Vec<ExistingRecord>> {
        let docs = self.store.list_documents(&self.explore_path()).await?;
        Ok(docs.iter().map(existing_from_document).collect())
    }

    /// Run the full import: auth, snapshot, reconcile, batched apply,
    /// audit log. Returns the aggregate counts for the run.
    pub async fn import_items(
        &self,
        rows: &[ImportRow],
        skipped_count: usize,
        caller: &Caller,
        options: &ImportOptions,
    ) -> Result<ImportSummary> {
        if caller.uid.is_empty() {
            return Err(Error::Unauthenticated);
        }
        if self.tenant.is_empty() {
            return Err(Error::MisconfiguredTarget);
        }

        let valid: Vec<ImportRow> = rows.iter().filter(|r| r.valid).cloned().collect();
        if valid.is_empty() {
            return Err(Error::NoValidRows);
        }

        self.ensure_admin(caller).await?;

        let existing = self.fetch_existing().await?;
        let plan = reconcile(&valid, &existing);

        let summary = ImportSummary {
            imported: plan.creates() as u64,
            updated: plan.updates() as u64,
            skipped: skipped_count as u64,
            removed_duplicates: plan.delete_ids.len() as u64,
        };

        self.apply_plan(&plan, caller).await?;
        self.write_log(&summary, caller, options).await?;

        info!(
            tenant = %self.tenant,
            imported = summary.imported,
            updated = summary.updated,
            skipped = summary.skipped,
            removed_duplicates = summary.removed_duplicates,
            "Import completed"
        );
        Ok(summary)
    }

    /// Reconcile without writing: the counts an import of these rows
    /// would produce right now. Read-only, so no auth gate.
    pub async fn plan_summary(&self, rows: &[ImportRow], skipped_count: usize) -> Result<ImportSummary> {
        if self.tenant.is_empty() {
            return Err(Error::MisconfiguredTarget);
        }
        let valid: Vec<ImportRow> = rows.iter().filter(|r| r.valid).cloned().collect();
        if valid.is_empty() {
            return Err(Error::NoValidRows);
        }

        let existing = self.fetch_existing().await?;
        let plan = reconcile(&valid, &existing);
        Ok(ImportSummary {
            imported: plan.creates() as u64,
            updated: plan.updates() as u64,
            skipped: skipped_count as u64,
            removed_duplicates: plan.delete_ids.len() as u64,
        })
    }

    /// Delete every surplus duplicate currently in the directory,
    /// without needing an import file. Same auth gate as an import.
    pub async fn cleanup_duplicates(&self, caller: &Caller) -> Result<CleanupSummary> {
        if caller.uid.is_empty() {
            return Err(Error::Unauthenticated);
        }
        if self.tenant.is_empty() {
            return Err(Error::MisconfiguredTarget);
        }
        self.ensure_admin(caller).await?;

        let existing = self.fetch_existing().await?;
        let surplus = surplus_duplicates(&existing);

        let ops: Vec<WriteOp> = surplus
            .iter()
            .map(|id| WriteOp::Delete {
                path: format!("{}/{}", self.explore_path(), id),
            })
            .collect();
        self.run_phase(WritePhase::DeleteSurplus, &ops).await?;

        info!(
            tenant = %self.tenant,
            removed_duplicates = surplus.len(),
            "Cleanup completed"
        );
        Ok(CleanupSummary {
            removed_duplicates: surplus.len() as u64,
        })
    }

    /// Typed view of the directory, sorted by city then name. Documents
    /// that do not parse as place records are skipped, and archived
    /// records are excluded; they stay in the datastore but are hidden
    /// from normal listings.
    pub async fn list_places(&self) -> Result<Vec<PlaceRecord>> {
        let docs = self.store.list_documents(&self.explore_path()).await?;
        let mut places: Vec<PlaceRecord> = docs
            .into_iter()
            .filter_map(|doc| {
                let mut place: PlaceRecord = serde_json::from_value(doc.data).ok()?;
                place.id = Some(doc.id);
                Some(place)
            })
            .filter(|place| place.status == PlaceStatus::Active)
            .collect();
        places.sort_by(|a, b| a.city.cmp(&b.city).then_with(|| a.name.cmp(&b.name)));
        Ok(places)
    }

    /// Most recent import log entries, newest first
    pub async fn list_import_logs(&self, limit: usize) -> Result<Vec<ImportLogEntry>> {
        let docs = self.store.list_documents(&self.log_path()).await?;
        let mut entries: Vec<ImportLogEntry> = docs
            .into_iter()
            .filter_map(|d| serde_json::from_value(d.data).ok())
            .collect();
        entries.sort_by(|a: &ImportLogEntry, b: &ImportLogEntry| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn apply_plan(&self, plan: &ReconciliationPlan, caller: &Caller) -> Result<()> {
        let delete_ops: Vec<WriteOp> = plan
            .delete_ids
            .iter()
            .map(|id| WriteOp::Delete {
                path: format!("{}/{}", self.explore_path(), id),
            })
            .collect();
        self.run_phase(WritePhase::DeleteSurplus, &delete_ops).await?;

        let upsert_ops: Vec<WriteOp> = plan
            .upserts
            .iter()
            .map(|upsert| {
                let (id, is_create) = match &upsert.existing_id {
                    Some(id) => (id.clone(), false),
                    None => (self.store.new_document_id(&self.explore_path()), true),
                };
                WriteOp::Set {
                    path: format!("{}/{}", self.explore_path(), id),
                    data: self.upsert_payload(&upsert.row, &upsert.stable_key, caller, is_create),
                    merge: !is_create,
                }
            })
            .collect();
        self.run_phase(WritePhase::Upsert, &upsert_ops).await?;
        Ok(())
    }

    /// Document payload for one upsert. Updates merge so fields the
    /// importer does not own (and creation provenance) stay untouched.
    fn upsert_payload(&self, row: &ImportRow, stable_key: &str, caller: &Caller, is_create: bool) -> Value {
        let mut data = Map::new();
        data.insert("city".into(), json!(row.city));
        data.insert("type".into(), json!(row.place_type));
        data.insert("category".into(), json!(row.category));
        data.insert("name".into(), json!(row.name));
        data.insert("neighborhood".into(), json!(row.neighborhood));
        data.insert("hours".into(), json!(row.hours));
        data.insert("price".into(), json!(row.price));
        data.insert("tags".into(), json!(row.tags));
        data.insert("googleMapsUrl".into(), json!(row.google_maps_url));
        data.insert("reservationUrl".into(), json!(row.reservation_url));
        data.insert("notes".into(), json!(row.notes));
        data.insert("recommendedBy".into(), json!(row.recommended_by));
        data.insert("stableKey".into(), json!(stable_key));
        data.insert("status".into(), json!("active"));
        data.insert("updatedAt".into(), self.store.server_timestamp());
        data.insert("updatedByUid".into(), json!(caller.uid));

        if is_create {
            let display_name = if caller.display_name.is_empty() {
                "Admin"
            } else {
                caller.display_name.as_str()
            };
            data.insert("createdAt".into(), self.store.server_timestamp());
            data.insert("createdByUid".into(), json!(caller.uid));
            data.insert("createdByName".into(), json!(display_name));
        }

        Value::Object(data)
    }

    async fn write_log(&self, summary: &ImportSummary, caller: &Caller, options: &ImportOptions) -> Result<()> {
        let id = self.store.new_document_id(&self.log_path());
        let op = WriteOp::Set {
            path: format!("{}/{}", self.log_path(), id),
            data: json!({
                "timestamp": self.store.server_timestamp(),
                "adminUid": caller.uid,
                "fileName": options.file_name,
                "importedCount": summary.imported,
                "updatedCount": summary.updated,
                "skippedCount": summary.skipped,
                "removedDuplicates": summary.removed_duplicates,
            }),
            merge: false,
        };
        self.run_phase(WritePhase::WriteLog, &[op]).await
    }

    /// Commit one phase's operations in batches. A failed batch aborts
    /// the phase; committed batches are not rolled back.
    async fn run_phase(&self, phase: WritePhase, ops: &[WriteOp]) -> Result<()> {
        self.observer.phase_started(phase, ops.len());
        for (batch_index, batch) in ops.chunks(self.batch_size).enumerate() {
            self.store.batch_write(batch).await.map_err(|source| {
                warn!(phase = %phase, batch_index, "Batch write failed, aborting run");
                Error::BatchWrite {
                    phase,
                    batch_index,
                    source: Box::new(source),
                }
            })?;
            self.observer.batch_committed(phase, batch_index, batch.len());
        }
        self.observer.phase_completed(phase);
        Ok(())
    }
}

/// Project a stored document down to the fields reconciliation needs.
/// Missing identity fields come through empty and get filtered during
/// grouping.
fn existing_from_document(doc: &Document) -> ExistingRecord {
    let field = |key: &str| {
        doc.data
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    let created_at = doc
        .data
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc));

    ExistingRecord {
        id: doc.id.clone(),
        city: field("city"),
        place_type: field("type"),
        name: field("name"),
        created_at,
    }
}
