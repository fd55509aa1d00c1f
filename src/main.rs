//! crm-sync: command-line front end for the CRM's cloud backup.
//!
//! Usage:
//!   crm-sync status               - Show authorization and sync status
//!   crm-sync authorize <login>    - Connect a cloud account
//!   crm-sync upload               - Back up the database to the cloud
//!   crm-sync backups              - List stored backups

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();

    let log_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("crm_cloud_sync={log_level},crm_sync={log_level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}
