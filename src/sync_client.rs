mod api;
mod client;
mod core;
mod helpers;
mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{BackupRecord, StatusResponse};
pub use client::SyncApiClient;
pub use self::core::{HttpClient, Transport};
pub use helpers::{backup_name, format_relative_time, format_size, parse_timestamp, state_param};
pub use models::{
    Affordances, BackupEntry, BackupHistory, Phase, SyncSnapshot, SyncState,
};
