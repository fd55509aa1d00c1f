//! Client side of the CRM's cloud backup: authorization lifecycle, backup
//! actions against the REST backend, and the offline asset cache of the web
//! shell.

pub mod config;
pub mod controller;
pub mod offline_cache;
pub mod sync_client;
pub mod types;

pub use config::Config;
pub use controller::SyncStatusController;
pub use types::SyncError;
