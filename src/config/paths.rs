use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::types::SyncError;

use super::Config;

impl Config {
    /// Timeout applied to every HTTP request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Timeout for the out-of-band authorization window
    pub fn authorization_timeout(&self) -> Duration {
        Duration::from_secs(self.authorization_timeout_secs)
    }
}

/// Get the path to the config.json file
/// Looks for config.json in the app directory (parent of the bin folder)
pub(super) fn get_config_path() -> Result<PathBuf, SyncError> {
    // Executable is at: app_root/bin/crm-sync
    // Config should be at: app_root/config.json
    if let Ok(exe_path) = std::env::current_exe() {
        debug!(path = %exe_path.display(), "Executable path detected");

        if let Some(bin_dir) = exe_path.parent() {
            if let Some(app_root) = bin_dir.parent() {
                let config_path = app_root.join("config.json");
                debug!(path = %config_path.display(), "Looking for config");
                if config_path.exists() {
                    return Ok(config_path);
                }
            }
        }
    }

    warn!("Using fallback: looking for config.json in current directory");
    Ok(PathBuf::from("config.json"))
}
