//! Standalone duplicate cleanup command

use anyhow::Result;

use super::{caller_from, open_importer};
use crate::cli::Cli;

pub async fn cmd_cleanup(cli: &Cli) -> Result<()> {
    let importer = open_importer(cli)?;

    println!("🧹 Cleaning up duplicates in {}...", importer.tenant());
    let summary = importer.cleanup_duplicates(&caller_from(cli)).await?;

    if summary.removed_duplicates == 0 {
        println!("✅ No duplicates found");
    } else {
        println!("✅ Removed {} duplicate record(s)", summary.removed_duplicates);
    }
    Ok(())
}
