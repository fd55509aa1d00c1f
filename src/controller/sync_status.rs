use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::sync_client::{
    state_param, Affordances, BackupEntry, BackupHistory, HttpClient, Phase, SyncApiClient,
    SyncSnapshot, SyncState,
};
use crate::types::SyncError;

use super::completion::{self, AuthorizationUrl, CompletionSender, CompletionSubscription, Delivery};
use super::confirm::{Confirm, ConfirmAction};
use super::notify::{NoticeLevel, Notifier};

/// Backups older than this are removed by `cleanup_backups`. Enforced by the
/// server; the client only names it in the prompt.
pub const BACKUP_RETENTION_DAYS: u32 = 30;

/// Result of a confirmation-gated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { message: Option<String> },
    /// The user declined; nothing was sent.
    Declined,
}

/// Returned by `authorize`: the URL to open and the sender the
/// authorization window reports back through.
#[derive(Debug)]
pub struct AuthorizationRequest {
    pub url: AuthorizationUrl,
    pub completion: CompletionSender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationWait {
    /// The code arrived and was exchanged.
    Completed,
    /// Nothing arrived in time. The request stays pending and can be awaited again.
    TimedOut,
    /// The authorization window went away without reporting back.
    Abandoned,
}

/// Drives the cloud backup account through authorization and exposes the
/// backup actions gated on it.
///
/// Every state change comes from a server reply: mutating calls are always
/// followed by a status refresh issued after their response arrives.
pub struct SyncStatusController {
    api: SyncApiClient,
    confirm: Arc<dyn Confirm>,
    notifier: Arc<dyn Notifier>,
    state: SyncState,
    affordances: Affordances,
    backups: BackupHistory,
    pending: Option<CompletionSubscription>,
    authorization_timeout: Duration,
    default_interval_minutes: u32,
}

impl SyncStatusController {
    pub fn new(
        api: SyncApiClient,
        confirm: Arc<dyn Confirm>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self {
            api,
            confirm,
            notifier,
            state: SyncState::default(),
            affordances: Affordances::default(),
            backups: BackupHistory::NotLoaded,
            pending: None,
            authorization_timeout: config.authorization_timeout(),
            default_interval_minutes: config.default_auto_sync_interval_minutes,
        }
    }

    /// Build a controller talking HTTP to the configured backend.
    pub fn connect(
        config: &Config,
        confirm: Arc<dyn Confirm>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SyncError> {
        let http = HttpClient::new(config)?;
        Ok(Self::new(
            SyncApiClient::new(Arc::new(http)),
            confirm,
            notifier,
            config,
        ))
    }

    pub fn state(&self) -> SyncState {
        self.state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            state: self.state.clone(),
            phase: self.state.phase(),
            affordances: self.affordances,
            backups: self.backups.clone(),
        }
    }

    pub fn is_awaiting_authorization(&self) -> bool {
        self.pending.is_some()
    }

    /// Initial status fetch, plus the backup history when already authorized.
    pub async fn initialize(&mut self) -> SyncSnapshot {
        self.check_status().await;
        if self.state.authorized {
            self.reload_history().await;
        }
        self.snapshot()
    }

    /// Replace local state with the server's view. Never fails: transport
    /// errors are logged, server errors are reported.
    pub async fn check_status(&mut self) -> SyncState {
        match self.api.status().await {
            Ok(status) => {
                let before = self.state.phase();
                self.state.apply_status(&status);
                self.affordances.auto_sync_toggle = self.state.auto_sync_enabled;
                let after = self.state.phase();
                if before != after {
                    info!(from = ?before, to = ?after, "Cloud sync phase changed");
                }
            }
            Err(SyncError::Transport(message)) => {
                warn!(error = %message, "Status refresh failed");
            }
            Err(err) => {
                self.report("Status check", err);
            }
        }
        self.state.clone()
    }

    /// Ask the server for the provider's authorization URL and start
    /// listening for the completion signal. Any earlier pending
    /// authorization is dropped.
    pub async fn authorize(&mut self, account_id: &str) -> Result<AuthorizationRequest, SyncError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(self.report(
                "Authorization",
                SyncError::Validation("Enter the cloud account login".to_string()),
            ));
        }

        self.notifier
            .notify(NoticeLevel::Info, "Generating authorization URL...");
        let url = match self.api.authorize(account_id).await {
            Ok(url) if url.trim().is_empty() => {
                return self
                    .settle(
                        "Authorization",
                        SyncError::Application("Server returned an empty authorization URL".to_string()),
                    )
                    .await
            }
            Ok(url) => url,
            Err(err) => return self.settle("Authorization", err).await,
        };

        let (sender, subscription) = completion::subscribe(state_param(&url));
        if self.pending.replace(subscription).is_some() {
            debug!("Replaced a pending authorization request");
        }
        self.check_status().await;

        info!(account = %account_id, "Authorization started");
        self.notifier.notify(
            NoticeLevel::Info,
            "Open the authorization link, grant access and return here",
        );
        Ok(AuthorizationRequest {
            url: AuthorizationUrl::new(url),
            completion: sender,
        })
    }

    /// Wait for the authorization window to report back, then exchange the
    /// code. Timing out is not an error: the account simply stays pending.
    pub async fn await_completion(&mut self) -> Result<AuthorizationWait, SyncError> {
        let timeout = self.authorization_timeout;
        let Some(subscription) = self.pending.as_mut() else {
            return Err(self.report(
                "Authorization",
                SyncError::Validation("No authorization is in progress".to_string()),
            ));
        };

        let delivery = subscription.wait(timeout).await;
        let completion = match delivery {
            Delivery::Received(completion) => completion,
            Delivery::TimedOut => {
                info!(
                    timeout_secs = timeout.as_secs(),
                    "Authorization window still open, staying pending"
                );
                return Ok(AuthorizationWait::TimedOut);
            }
            Delivery::Closed => {
                self.pending = None;
                info!("Authorization window closed without a result");
                self.notifier.notify(
                    NoticeLevel::Info,
                    "Authorization window closed. If you granted access, refresh the status.",
                );
                return Ok(AuthorizationWait::Abandoned);
            }
        };

        let accepted = self
            .pending
            .take()
            .map(|subscription| subscription.accepts(&completion))
            .unwrap_or(false);
        if !accepted {
            return Err(self.report(
                "Authorization",
                SyncError::Validation(
                    "Authorization response does not match the pending request".to_string(),
                ),
            ));
        }

        self.exchange(&completion.code).await?;
        Ok(AuthorizationWait::Completed)
    }

    /// Trade an authorization code for a token held by the server.
    pub async fn exchange(&mut self, code: &str) -> Result<(), SyncError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(self.report(
                "Authorization",
                SyncError::Validation("Authorization code is empty".to_string()),
            ));
        }

        self.notifier
            .notify(NoticeLevel::Info, "Processing authorization code...");
        match self.api.exchange(code).await {
            Ok(()) => {
                self.pending = None;
                self.check_status().await;
                info!("Authorization code exchanged");
                self.notifier.notify(
                    NoticeLevel::Success,
                    "Authorization complete. Cloud sync can now be configured.",
                );
                Ok(())
            }
            Err(SyncError::Application(message)) | Err(SyncError::ReauthorizationRequired(message)) => {
                Err(self.report("Authorization", SyncError::InvalidCode(message)))
            }
            Err(err) => Err(self.report("Authorization", err)),
        }
    }

    pub async fn test_connection(&mut self) -> Result<String, SyncError> {
        match self.api.test_connection().await {
            Ok(message) => {
                let message = message.unwrap_or_else(|| "Connection OK".to_string());
                self.notifier.notify(NoticeLevel::Success, &message);
                Ok(message)
            }
            Err(err) => self.settle("Connection test", err).await,
        }
    }

    /// Push the current database to the cloud.
    pub async fn upload(&mut self) -> Result<(), SyncError> {
        self.require_authorized()?;

        self.notifier
            .notify(NoticeLevel::Info, "Uploading data to the cloud...");
        if let Err(err) = self.api.upload().await {
            return self.settle("Upload", err).await;
        }

        self.check_status().await;
        self.reload_history().await;
        info!("Backup uploaded");
        self.notifier
            .notify(NoticeLevel::Success, "Data uploaded to the cloud");
        Ok(())
    }

    /// Replace local data with a cloud backup (the latest when `remote_path`
    /// is `None`). Asks for confirmation first.
    pub async fn download(&mut self, remote_path: Option<&str>) -> Result<Outcome, SyncError> {
        self.require_authorized()?;

        if !self.confirm.confirm(&ConfirmAction::ReplaceLocalData).await {
            info!("Download declined");
            return Ok(Outcome::Declined);
        }

        self.notifier
            .notify(NoticeLevel::Info, "Downloading data from the cloud...");
        let remote_path = remote_path.map(str::trim).filter(|path| !path.is_empty());
        if let Err(err) = self.api.download(remote_path).await {
            return self.settle("Download", err).await;
        }

        self.check_status().await;
        info!(path = ?remote_path, "Backup downloaded");
        self.notifier.local_data_replaced();
        self.notifier
            .notify(NoticeLevel::Success, "Data downloaded from the cloud");
        Ok(Outcome::Completed { message: None })
    }

    /// Restore one specific backup. Asks for confirmation first.
    pub async fn restore_backup(&mut self, remote_path: &str) -> Result<Outcome, SyncError> {
        let remote_path = remote_path.trim();
        if remote_path.is_empty() {
            return Err(self.report(
                "Restore",
                SyncError::Validation("Choose a backup to restore".to_string()),
            ));
        }
        self.require_authorized()?;

        let action = ConfirmAction::RestoreBackup {
            remote_path: remote_path.to_string(),
        };
        if !self.confirm.confirm(&action).await {
            info!(path = %remote_path, "Restore declined");
            return Ok(Outcome::Declined);
        }

        self.notifier.notify(NoticeLevel::Info, "Restoring data...");
        let message = match self.api.restore(remote_path).await {
            Ok(message) => message,
            Err(err) => return self.settle("Restore", err).await,
        };

        self.check_status().await;
        info!(path = %remote_path, "Backup restored");
        self.notifier.local_data_replaced();
        self.notifier.notify(
            NoticeLevel::Success,
            message.as_deref().unwrap_or("Backup restored"),
        );
        Ok(Outcome::Completed { message })
    }

    /// Fetch the backup history. An empty list is a success.
    pub async fn list_backups(&mut self) -> Result<Vec<BackupEntry>, SyncError> {
        match self.api.backups().await {
            Ok(records) => {
                let entries: Vec<BackupEntry> = records.into_iter().map(BackupEntry::from).collect();
                debug!(count = entries.len(), "Loaded backup history");
                self.backups = BackupHistory::Loaded(entries.clone());
                Ok(entries)
            }
            Err(err) => {
                self.backups = BackupHistory::Failed(err.to_string());
                self.settle("Loading backup history", err).await
            }
        }
    }

    /// Ask the server to delete backups past the retention window.
    pub async fn cleanup_backups(&mut self) -> Result<Outcome, SyncError> {
        let action = ConfirmAction::CleanupBackups {
            retention_days: BACKUP_RETENTION_DAYS,
        };
        if !self.confirm.confirm(&action).await {
            info!("Cleanup declined");
            return Ok(Outcome::Declined);
        }

        let message = match self.api.cleanup().await {
            Ok(message) => message,
            Err(err) => return self.settle("Cleanup", err).await,
        };

        self.check_status().await;
        self.reload_history().await;
        self.notifier.notify(
            NoticeLevel::Success,
            message.as_deref().unwrap_or("Old backups removed"),
        );
        Ok(Outcome::Completed { message })
    }

    /// Switch server-side recurring uploads on or off. When enabling, a
    /// missing interval falls back to the configured default.
    pub async fn toggle_auto_sync(
        &mut self,
        enable: bool,
        interval_minutes: Option<u32>,
    ) -> Result<(), SyncError> {
        let prior = self.affordances.auto_sync_toggle;

        if enable {
            let minutes = interval_minutes.unwrap_or(self.default_interval_minutes);
            if minutes < 1 {
                self.affordances.auto_sync_toggle = false;
                return Err(self.report(
                    "Auto-sync",
                    SyncError::Validation("Interval must be at least 1 minute".to_string()),
                ));
            }

            self.affordances.auto_sync_toggle = true;
            if let Err(err) = self.api.enable_auto_sync(minutes).await {
                let result = self.settle("Enabling auto-sync", err).await;
                self.affordances.auto_sync_toggle = false;
                return result;
            }
            self.state.auto_sync_enabled = true;
            self.state.auto_sync_interval_minutes = Some(minutes);
            self.check_status().await;
            info!(interval_minutes = minutes, "Auto-sync enabled");
            self.notifier
                .notify(NoticeLevel::Success, "Automatic sync enabled");
        } else {
            self.affordances.auto_sync_toggle = false;
            if let Err(err) = self.api.disable_auto_sync().await {
                self.affordances.auto_sync_toggle = prior;
                return self.settle("Disabling auto-sync", err).await;
            }
            self.state.auto_sync_enabled = false;
            self.state.auto_sync_interval_minutes = None;
            self.check_status().await;
            info!("Auto-sync disabled");
            self.notifier
                .notify(NoticeLevel::Info, "Automatic sync disabled");
        }
        Ok(())
    }

    /// Ask the server to refresh its access token. A rejected refresh is
    /// terminal: the account drops back to pending authorization.
    pub async fn refresh_token(&mut self) -> Result<(), SyncError> {
        self.notifier.notify(NoticeLevel::Info, "Refreshing token...");
        match self.api.refresh_token().await {
            Ok(()) => {
                self.affordances.refresh_token_visible = false;
                self.check_status().await;
                info!("Token refreshed");
                self.notifier
                    .notify(NoticeLevel::Success, "Token refreshed");
                Ok(())
            }
            Err(err @ SyncError::Transport(_)) => Err(self.report("Token refresh", err)),
            Err(err) => {
                let message = match err {
                    SyncError::Application(message)
                    | SyncError::ReauthorizationRequired(message) => message,
                    other => other.to_string(),
                };
                self.check_status().await;
                self.state.revoke_authorization();
                self.affordances.refresh_token_visible = false;
                warn!(error = %message, "Token refresh rejected, re-authorization required");
                self.notifier.notify(
                    NoticeLevel::Error,
                    &format!("Token refresh failed, authorize the account again: {message}"),
                );
                Err(SyncError::ReauthorizationRequired(message))
            }
        }
    }

    fn require_authorized(&mut self) -> Result<(), SyncError> {
        if self.state.authorized {
            Ok(())
        } else {
            Err(self.report("Cloud sync", SyncError::NotAuthorized))
        }
    }

    /// Failures land in `BackupHistory::Failed` and are already reported.
    async fn reload_history(&mut self) {
        let _ = self.list_backups().await;
    }

    /// Finish a failed server call: refresh status when the token went
    /// stale, then report.
    async fn settle<T>(&mut self, context: &str, err: SyncError) -> Result<T, SyncError> {
        if err.requires_reauthorization() {
            self.check_status().await;
        }
        Err(self.report(context, err))
    }

    fn report(&mut self, context: &str, err: SyncError) -> SyncError {
        warn!(context, error = %err, "Cloud sync action failed");
        match &err {
            SyncError::ReauthorizationRequired(_) => {
                self.affordances.refresh_token_visible = true;
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "Re-authorization required. Use \"Refresh token\" to continue.",
                );
            }
            SyncError::Validation(message) => {
                self.notifier.notify(NoticeLevel::Warning, message);
            }
            SyncError::NotAuthorized => {
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "Authorize the cloud account first",
                );
            }
            _ => {
                self.notifier
                    .notify(NoticeLevel::Error, &format!("{context} failed: {err}"));
            }
        }
        err
    }
}
