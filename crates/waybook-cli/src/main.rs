//! Waybook CLI - cohort place-directory import tooling
//!
//! Usage:
//!   waybook preview --file places.csv   Parse and normalize without writing
//!   waybook import --file places.csv    Import places into the directory
//!   waybook cleanup                     Remove surplus duplicate records
//!   waybook history                     Show recent import runs
//!   waybook admins grant UID            Enable an admin

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Preview { ref file, limit } => commands::cmd_preview(file, limit),
        Commands::Import { ref file, dry_run } => commands::cmd_import(&cli, file, dry_run).await,
        Commands::Cleanup => commands::cmd_cleanup(&cli).await,
        Commands::Places { ref city } => commands::cmd_places(&cli, city.as_deref()).await,
        Commands::History { limit } => commands::cmd_history(&cli, limit).await,
        Commands::Admins { ref action } => commands::cmd_admins(&cli, action).await,
    }
}
