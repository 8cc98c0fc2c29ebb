//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Waybook - cohort place-directory import tooling
#[derive(Parser)]
#[command(name = "waybook")]
#[command(about = "Import and maintain a cohort's Explore place directory", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ./waybook.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Local database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Cohort id, e.g. global-84 (overrides config)
    #[arg(long, global = true)]
    pub tenant: Option<String>,

    /// Uid of the acting admin
    #[arg(long, global = true, default_value = "cli-admin")]
    pub uid: String,

    /// Display name recorded on created places
    #[arg(long, global = true, default_value = "")]
    pub name: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse and normalize a CSV without writing anything
    Preview {
        /// CSV file to preview
        #[arg(short, long)]
        file: PathBuf,

        /// Number of rows to display
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Import places from CSV into the directory
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete surplus duplicate records from the directory
    Cleanup,

    /// List the place directory
    Places {
        /// Only show places in this city
        #[arg(long)]
        city: Option<String>,
    },

    /// Show recent import runs
    History {
        /// Number of entries to display
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Manage admin access for the cohort
    Admins {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Enable a uid as admin
    Grant { uid: String },

    /// Disable a uid's admin access
    Revoke { uid: String },

    /// List admin records
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_command() {
        let cli = Cli::try_parse_from([
            "waybook", "--tenant", "global-84", "import", "--file", "places.csv", "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.tenant.as_deref(), Some("global-84"));
        match cli.command {
            Commands::Import { file, dry_run } => {
                assert_eq!(file.to_str(), Some("places.csv"));
                assert!(dry_run);
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn test_preview_defaults() {
        let cli = Cli::try_parse_from(["waybook", "preview", "--file", "places.csv"]).unwrap();
        match cli.command {
            Commands::Preview { limit, .. } => assert_eq!(limit, 10),
            _ => panic!("expected preview command"),
        }
    }

    #[test]
    fn test_admin_subcommands() {
        let cli = Cli::try_parse_from(["waybook", "admins", "grant", "u123"]).unwrap();
        match cli.command {
            Commands::Admins {
                action: AdminAction::Grant { uid },
            } => assert_eq!(uid, "u123"),
            _ => panic!("expected admins grant"),
        }
    }
}
