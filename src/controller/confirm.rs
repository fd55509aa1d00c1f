use async_trait::async_trait;

use crate::sync_client::backup_name;

/// Destructive actions that need the user's go-ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Downloading replaces every locally persisted record.
    ReplaceLocalData,
    RestoreBackup { remote_path: String },
    CleanupBackups { retention_days: u32 },
}

impl ConfirmAction {
    pub fn prompt(&self) -> String {
        match self {
            ConfirmAction::ReplaceLocalData => {
                "Downloading from the cloud will replace the current database. Continue?"
                    .to_string()
            }
            ConfirmAction::RestoreBackup { remote_path } => format!(
                "Restore backup \"{}\"? This will replace the current database!",
                backup_name(remote_path)
            ),
            ConfirmAction::CleanupBackups { retention_days } => {
                format!("Delete backups older than {retention_days} days?")
            }
        }
    }
}

/// Asynchronous yes/no gate, independent of any UI toolkit.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, action: &ConfirmAction) -> bool;
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _action: &ConfirmAction) -> bool {
        self.0
    }
}
