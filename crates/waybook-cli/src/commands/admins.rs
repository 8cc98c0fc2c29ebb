//! Admin access management commands
//!
//! Admin records live at `cohorts/{tenant}/admins/{uid}` with an
//! `enabled` flag. Revoking sets the flag false instead of deleting so
//! the record keeps its history.

use anyhow::Result;
use serde_json::json;
use waybook_core::{Datastore, WriteOp};

use super::open_importer;
use crate::cli::{AdminAction, Cli};

pub async fn cmd_admins(cli: &Cli, action: &AdminAction) -> Result<()> {
    let importer = open_importer(cli)?;
    let tenant = importer.tenant().to_string();
    let store = importer.store();

    match action {
        AdminAction::Grant { uid } => {
            store
                .batch_write(&[WriteOp::Set {
                    path: format!("cohorts/{}/admins/{}", tenant, uid),
                    data: json!({"enabled": true}),
                    merge: true,
                }])
                .await?;
            println!("✅ {} is now an admin for {}", uid, tenant);
        }
        AdminAction::Revoke { uid } => {
            store
                .batch_write(&[WriteOp::Set {
                    path: format!("cohorts/{}/admins/{}", tenant, uid),
                    data: json!({"enabled": false}),
                    merge: true,
                }])
                .await?;
            println!("✅ {} can no longer import for {}", uid, tenant);
        }
        AdminAction::List => {
            let docs = store
                .list_documents(&format!("cohorts/{}/admins", tenant))
                .await?;
            if docs.is_empty() {
                println!("No admin records for {}", tenant);
                return Ok(());
            }
            println!("👥 Admins for {}", tenant);
            for doc in &docs {
                let enabled = doc
                    .data
                    .get("enabled")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(false);
                let marker = if enabled { "✅" } else { "🚫" };
                println!("{} {}", marker, doc.id);
            }
        }
    }
    Ok(())
}
