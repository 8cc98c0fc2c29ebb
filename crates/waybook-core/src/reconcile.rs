//! Reconciliation of incoming rows against existing records
//!
//! Pure planning stage: given the valid rows of one file and a snapshot
//! of the existing directory, decide which records to create, which to
//! update in place, and which surplus duplicates to delete. No store
//! access happens here; the plan is applied by the importer afterwards.
//!
//! When several existing records share a stable key, the one with the
//! earliest creation timestamp is the canonical survivor. Records with
//! no creation timestamp sort after any timestamped record; remaining
//! ties break on document id for determinism.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{ExistingRecord, ImportRow};
use crate::normalize::stable_key;

/// One planned create-or-update for a stable key
#[derive(Debug, Clone)]
pub struct PlannedUpsert {
    pub stable_key: String,
    pub row: ImportRow,
    /// Id of the canonical existing record, or `None` for a create
    pub existing_id: Option<String>,
}

/// Full write plan for one import run
#[derive(Debug, Clone, Default)]
pub struct ReconciliationPlan {
    /// Upserts in first-appearance file order
    pub upserts: Vec<PlannedUpsert>,
    /// Ids of surplus duplicate records to delete
    pub delete_ids: Vec<String>,
}

impl ReconciliationPlan {
    pub fn creates(&self) -> usize {
        self.upserts.iter().filter(|u| u.existing_id.is_none()).count()
    }

    pub fn updates(&self) -> usize {
        self.upserts.iter().filter(|u| u.existing_id.is_some()).count()
    }
}

/// Group existing records by stable key. Records missing any identity
/// field are skipped; they cannot collide with anything.
fn group_existing(existing: &[ExistingRecord]) -> HashMap<String, Vec<&ExistingRecord>> {
    let mut groups: HashMap<String, Vec<&ExistingRecord>> = HashMap::new();
    for record in existing {
        if record.city.is_empty() || record.place_type.is_empty() || record.name.is_empty() {
            continue;
        }
        let key = stable_key(&record.city, &record.place_type, &record.name);
        groups.entry(key).or_default().push(record);
    }
    groups
}

/// Order a duplicate group so the canonical survivor comes first:
/// earliest `created_at`, records without one last, ties on id
fn sort_group(group: &mut [&ExistingRecord]) {
    group.sort_by(|a, b| match (&a.created_at, &b.created_at) {
        (Some(x), Some(y)) => x.cmp(y).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

/// Build the write plan for one import run.
///
/// Incoming rows that share a stable key collapse to a single upsert:
/// the last occurrence in file order wins, at the position where the
/// key first appeared. Surplus existing duplicates are scheduled for
/// deletion only for keys the file mentions; untouched drift is the
/// cleanup job's mandate.
pub fn reconcile(valid_rows: &[ImportRow], existing: &[ExistingRecord]) -> ReconciliationPlan {
    let mut groups = group_existing(existing);
    for group in groups.values_mut() {
        sort_group(group);
    }

    // Collapse incoming duplicates: last row wins, first-appearance order
    let mut order: Vec<String> = Vec::new();
    let mut winners: HashMap<String, ImportRow> = HashMap::new();
    for row in valid_rows {
        let key = row.stable_key();
        if !winners.contains_key(&key) {
            order.push(key.clone());
        }
        winners.insert(key, row.clone());
    }

    let mut plan = ReconciliationPlan::default();
    for key in order {
        if let Some(row) = winners.remove(&key) {
            let group = groups.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            let existing_id = group.first().map(|r| r.id.clone());
            for record in group.iter().skip(1) {
                plan.delete_ids.push(record.id.clone());
            }
            plan.upserts.push(PlannedUpsert {
                stable_key: key,
                row,
                existing_id,
            });
        }
    }
    plan.delete_ids.sort();

    debug!(
        creates = plan.creates(),
        updates = plan.updates(),
        deletes = plan.delete_ids.len(),
        "Reconciliation plan built"
    );
    plan
}

/// Surplus duplicates in the current directory, for the standalone
/// cleanup job: every record except each group's canonical survivor
pub fn surplus_duplicates(existing: &[ExistingRecord]) -> Vec<String> {
    let mut groups = group_existing(existing);
    let mut ids = Vec::new();
    for group in groups.values_mut() {
        sort_group(group);
        for record in group.iter().skip(1) {
            ids.push(record.id.clone());
        }
    }
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{TimeZone, Utc};

    fn row(city: &str, place_type: &str, name: &str, notes: &str) -> ImportRow {
        ImportRow {
            row_number: 1,
            valid: true,
            city: city.into(),
            place_type: place_type.into(),
            category: Category::Dining,
            name: name.into(),
            neighborhood: String::new(),
            hours: String::new(),
            price: String::new(),
            tags: Vec::new(),
            google_maps_url: String::new(),
            reservation_url: String::new(),
            notes: notes.into(),
            recommended_by: String::new(),
        }
    }

    fn record(id: &str, name: &str, created_secs: Option<i64>) -> ExistingRecord {
        ExistingRecord {
            id: id.into(),
            city: "Singapore".into(),
            place_type: "Coffee".into(),
            name: name.into(),
            created_at: created_secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
        }
    }

    #[test]
    fn test_new_key_plans_create() {
        let plan = reconcile(&[row("Singapore", "Coffee", "Toast Box", "")], &[]);
        assert_eq!(plan.creates(), 1);
        assert_eq!(plan.updates(), 0);
        assert!(plan.delete_ids.is_empty());
        assert!(plan.upserts[0].existing_id.is_none());
    }

    #[test]
    fn test_existing_key_plans_update_against_earliest() {
        let existing = vec![
            record("newer", "Toast Box", Some(200)),
            record("older", "toast  box", Some(100)),
            record("undated", "TOAST BOX", None),
        ];
        let plan = reconcile(&[row("Singapore", "Coffee", "Toast Box", "")], &existing);

        assert_eq!(plan.updates(), 1);
        assert_eq!(plan.upserts[0].existing_id.as_deref(), Some("older"));
        assert_eq!(plan.delete_ids, vec!["newer", "undated"]);
    }

    #[test]
    fn test_untimestamped_ties_break_on_id() {
        let existing = vec![record("b", "Toast Box", None), record("a", "Toast Box", None)];
        let plan = reconcile(&[row("Singapore", "Coffee", "Toast Box", "")], &existing);
        assert_eq!(plan.upserts[0].existing_id.as_deref(), Some("a"));
        assert_eq!(plan.delete_ids, vec!["b"]);
    }

    #[test]
    fn test_incoming_duplicates_last_wins_first_position() {
        let rows = vec![
            row("Singapore", "Coffee", "Toast Box", "first"),
            row("Singapore", "Bar", "The Loft", ""),
            row("Singapore", "Coffee", "TOAST  BOX", "second"),
        ];
        let plan = reconcile(&rows, &[]);

        assert_eq!(plan.upserts.len(), 2);
        // Winner sits at the first appearance of the key
        assert_eq!(plan.upserts[0].row.notes, "second");
        assert_eq!(plan.upserts[1].row.name, "The Loft");
    }

    #[test]
    fn test_untouched_keys_are_left_for_cleanup() {
        let existing = vec![
            record("keep", "Kopi Corner", Some(10)),
            record("extra", "kopi corner", Some(20)),
        ];
        let plan = reconcile(&[row("Singapore", "Bar", "The Loft", "")], &existing);
        // The file never mentions Kopi Corner: its duplicates survive
        // the import and belong to the standalone cleanup
        assert!(plan.delete_ids.is_empty());
        assert_eq!(plan.creates(), 1);
        assert_eq!(surplus_duplicates(&existing), vec!["extra"]);
    }

    #[test]
    fn test_records_missing_identity_fields_ignored() {
        let mut broken = record("broken", "", Some(5));
        broken.name = String::new();
        let plan = reconcile(&[], &[broken]);
        assert!(plan.delete_ids.is_empty());
        assert!(plan.upserts.is_empty());
    }

    #[test]
    fn test_surplus_duplicates_for_cleanup() {
        let existing = vec![
            record("c", "Toast Box", Some(300)),
            record("a", "Toast Box", Some(100)),
            record("b", "Toast Box", Some(200)),
            record("solo", "Kopi Corner", Some(100)),
        ];
        assert_eq!(surplus_duplicates(&existing), vec!["b", "c"]);
    }

    #[test]
    fn test_cleanup_idempotent_on_clean_directory() {
        let existing = vec![
            record("a", "Toast Box", Some(100)),
            record("solo", "Kopi Corner", Some(100)),
        ];
        assert!(surplus_duplicates(&existing).is_empty());
    }
}
