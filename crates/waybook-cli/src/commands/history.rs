//! Import history command

use anyhow::Result;

use super::open_importer;
use crate::cli::Cli;

pub async fn cmd_history(cli: &Cli, limit: usize) -> Result<()> {
    let importer = open_importer(cli)?;
    let entries = importer.list_import_logs(limit).await?;

    if entries.is_empty() {
        println!("No import runs recorded for {}", importer.tenant());
        return Ok(());
    }

    println!("📜 Recent imports for {}", importer.tenant());
    println!();
    for entry in &entries {
        let when = entry
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown time".to_string());
        println!(
            "{}  {}  by {}  +{} ~{} -{} dup, {} skipped",
            when,
            if entry.file_name.is_empty() { "(no file name)" } else { &entry.file_name },
            entry.admin_uid,
            entry.imported_count,
            entry.updated_count,
            entry.removed_duplicates,
            entry.skipped_count
        );
    }
    Ok(())
}
