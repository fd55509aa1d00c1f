use serde::Serialize;

use crate::sync_client::api::BackupRecord;

/// One snapshot stored by the cloud provider.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub remote_path: String,
    pub size_bytes: u64,
}

impl From<BackupRecord> for BackupEntry {
    fn from(record: BackupRecord) -> Self {
        Self {
            name: record.name,
            remote_path: record.path,
            size_bytes: record.size,
        }
    }
}

/// Outcome of the most recent history fetch.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum BackupHistory {
    #[default]
    NotLoaded,
    /// May be empty: no backups is a valid answer.
    Loaded(Vec<BackupEntry>),
    Failed(String),
}

impl BackupHistory {
    pub fn entries(&self) -> &[BackupEntry] {
        match self {
            BackupHistory::Loaded(entries) => entries,
            _ => &[],
        }
    }
}
