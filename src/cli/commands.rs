use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;
use tracing::{info, warn};

use crm_cloud_sync::controller::{
    AuthorizationWait, AutoConfirm, Confirm, Outcome, SyncStatusController,
};
use crm_cloud_sync::offline_cache::{CacheManifest, HttpFetcher, OfflineCache};
use crm_cloud_sync::sync_client::{format_size, state_param, BackupHistory, SyncSnapshot};
use crm_cloud_sync::{Config, SyncError};

use super::prompt::{spawn_code_reader, ConsoleNotifier, TerminalConfirm};
use super::system::open_browser;
use super::{AutoAction, Cli, Command};

pub async fn run(cli: Cli) -> Result<(), SyncError> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path).await,
        None => Config::load().await,
    };
    if let Some(url) = cli.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        config.api_base_url = url.to_string();
    }

    if let Command::CacheCheck { manifest } = &cli.command {
        return cmd_cache_check(&config, manifest).await;
    }

    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(TerminalConfirm)
    };
    let mut controller =
        SyncStatusController::connect(&config, confirm, Arc::new(ConsoleNotifier))?;
    controller.initialize().await;

    match cli.command {
        Command::Status => {
            print_snapshot(&controller.snapshot());
            Ok(())
        }
        Command::Authorize {
            account,
            no_browser,
        } => cmd_authorize(&mut controller, &account, no_browser).await,
        Command::Exchange { code } => {
            controller.exchange(&code).await?;
            print_snapshot(&controller.snapshot());
            Ok(())
        }
        Command::Test => {
            let message = controller.test_connection().await?;
            println!("{message}");
            Ok(())
        }
        Command::Upload => controller.upload().await,
        Command::Download { path } => {
            report_outcome(controller.download(path.as_deref()).await?);
            Ok(())
        }
        Command::Restore { path } => {
            report_outcome(controller.restore_backup(&path).await?);
            Ok(())
        }
        Command::Backups => {
            controller.list_backups().await?;
            print_backups(&controller.snapshot().backups);
            Ok(())
        }
        Command::Cleanup => {
            report_outcome(controller.cleanup_backups().await?);
            Ok(())
        }
        Command::Auto { action } => match action {
            AutoAction::Enable { interval } => controller.toggle_auto_sync(true, interval).await,
            AutoAction::Disable => controller.toggle_auto_sync(false, None).await,
        },
        Command::Refresh => controller.refresh_token().await,
        Command::CacheCheck { .. } => Ok(()),
    }
}

// ============ AUTHORIZE COMMAND ============

async fn cmd_authorize(
    controller: &mut SyncStatusController,
    account: &str,
    no_browser: bool,
) -> Result<(), SyncError> {
    let request = controller.authorize(account).await?;

    println!("Open the following URL to grant access:");
    println!("  {}", request.url);
    if !no_browser {
        if let Err(err) = open_browser(request.url.as_str()).await {
            warn!(error = %err, "Could not open a browser");
        }
    }

    println!();
    println!("Paste the authorization code (or the full redirect URL) and press Enter:");
    spawn_code_reader(request.completion, state_param(request.url.as_str()));

    match controller.await_completion().await? {
        AuthorizationWait::Completed => print_snapshot(&controller.snapshot()),
        AuthorizationWait::TimedOut => {
            println!("No code received yet. Run `crm-sync exchange <code>` once you have it.")
        }
        AuthorizationWait::Abandoned => {
            println!("Authorization was not completed. Run `crm-sync status` to check again.")
        }
    }
    Ok(())
}

// ============ CACHE COMMAND ============

async fn cmd_cache_check(config: &Config, manifest_path: &Path) -> Result<(), SyncError> {
    let contents = fs::read_to_string(manifest_path).await?;
    let manifest: CacheManifest = serde_json::from_str(&contents)
        .map_err(|err| SyncError::Config(format!("Failed to parse cache manifest: {err}")))?;
    let generation = manifest.generation.clone();
    let entries = manifest.required.len();

    let fetcher = HttpFetcher::new(config)?;
    let mut cache = OfflineCache::new();
    cache.install(manifest, &fetcher).await?;
    cache.activate(&generation)?;

    info!(%generation, entries, "Offline cache generation ready");
    println!("Generation {generation} installed with {entries} required entries");
    Ok(())
}

// ============ OUTPUT ============

fn print_snapshot(snapshot: &SyncSnapshot) {
    println!("Cloud account: {}", snapshot.status_label());
    if let Some(line) = snapshot.last_sync_line(Utc::now()) {
        println!("{line}");
    }
    if snapshot.state.auto_sync_enabled {
        match snapshot.state.auto_sync_interval_minutes {
            Some(minutes) => println!("Auto-sync: every {minutes} min"),
            None => println!("Auto-sync: on"),
        }
    } else {
        println!("Auto-sync: off");
    }
    if snapshot.affordances.refresh_token_visible {
        println!("Token is stale: run `crm-sync refresh`");
    }
    if snapshot.can_transfer() {
        print_backups(&snapshot.backups);
    }
}

fn print_backups(history: &BackupHistory) {
    match history {
        BackupHistory::NotLoaded => {}
        BackupHistory::Failed(message) => println!("Backup history unavailable: {message}"),
        BackupHistory::Loaded(entries) if entries.is_empty() => println!("No backups found"),
        BackupHistory::Loaded(entries) => {
            println!("Backups:");
            for entry in entries {
                println!(
                    "  {:<40} {:>10}  {}",
                    entry.name,
                    format_size(entry.size_bytes),
                    entry.remote_path
                );
            }
        }
    }
}

fn report_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Completed { message: Some(message) } => println!("{message}"),
        Outcome::Completed { message: None } => println!("Done"),
        Outcome::Declined => println!("Cancelled"),
    }
}
