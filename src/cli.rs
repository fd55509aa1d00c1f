mod commands;
mod prompt;
mod system;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::run;

/// Cloud backup client for the legal CRM
#[derive(Parser)]
#[command(name = "crm-sync")]
#[command(about = "Back up and restore the CRM database through the cloud", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Backend base URL, overriding config.json and the environment
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to config.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show authorization and sync status
    Status,

    /// Connect a cloud account and wait for the authorization code
    Authorize {
        /// Cloud account login
        account: String,

        /// Print the authorization URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Exchange an authorization code obtained earlier
    Exchange { code: String },

    /// Check that the backend can reach the cloud account
    Test,

    /// Upload the current database as a new backup
    Upload,

    /// Replace local data with a cloud backup
    Download {
        /// Remote backup path (latest when omitted)
        #[arg(long)]
        path: Option<String>,
    },

    /// Restore a specific backup
    Restore { path: String },

    /// List stored backups
    Backups,

    /// Delete backups older than the retention window
    Cleanup,

    /// Configure automatic sync
    Auto {
        #[command(subcommand)]
        action: AutoAction,
    },

    /// Refresh the access token held by the backend
    Refresh,

    /// Install and activate an offline cache generation from a manifest
    CacheCheck {
        /// JSON manifest with `generation`, `required` and `offline_fallback`
        manifest: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum AutoAction {
    Enable {
        /// Minutes between uploads
        #[arg(long)]
        interval: Option<u32>,
    },
    Disable,
}
