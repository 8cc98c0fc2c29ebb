//! CSV preview and import command implementations

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use waybook_core::{has_required_headers, parse_rows, preview, ImportOptions};

use super::{caller_from, open_importer};
use crate::cli::Cli;

pub fn cmd_preview(file: &Path, limit: usize) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let rows = parse_rows(&text)?;

    if !has_required_headers(&rows) {
        anyhow::bail!("CSV must have city, type, and name columns");
    }

    let p = preview(&rows, limit);

    println!("🔎 Preview of {}", file.display());
    println!();
    for row in &p.preview_rows {
        let marker = if row.valid { "✅" } else { "⚠️ " };
        println!(
            "{} row {:>3}  {} | {} | {} | {}",
            marker,
            row.row_number,
            row.city,
            row.place_type,
            row.name,
            row.category
        );
    }
    println!();
    println!("   Importable: {}", p.importable_count);
    println!("   Skipped (invalid): {}", p.skipped_count);
    Ok(())
}

pub async fn cmd_import(cli: &Cli, file: &Path, dry_run: bool) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let rows = parse_rows(&text)?;

    if !has_required_headers(&rows) {
        anyhow::bail!("CSV must have city, type, and name columns");
    }

    let p = preview(&rows, 0);
    let importer = open_importer(cli)?;

    println!(
        "📥 Importing {} into {} ({} rows, {} skipped)...",
        file.display(),
        importer.tenant(),
        p.importable_count,
        p.skipped_count
    );

    if dry_run {
        let summary = importer.plan_summary(&p.valid_rows, p.skipped_count).await?;
        println!("🧪 Dry run, nothing written");
        println!("   Would create: {}", summary.imported);
        println!("   Would update: {}", summary.updated);
        println!("   Would remove duplicates: {}", summary.removed_duplicates);
        println!("   Skipped (invalid): {}", summary.skipped);
        return Ok(());
    }

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let summary = importer
        .import_items(
            &p.valid_rows,
            p.skipped_count,
            &caller_from(cli),
            &ImportOptions { file_name },
        )
        .await?;

    println!("✅ Import complete!");
    println!("   Created: {}", summary.imported);
    println!("   Updated: {}", summary.updated);
    println!("   Skipped (invalid): {}", summary.skipped);
    println!("   Removed duplicates: {}", summary.removed_duplicates);
    Ok(())
}
