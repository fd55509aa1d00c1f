use std::env;
use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::types::SyncError;

use super::{paths, Config};

pub const API_URL_ENV: &str = "CRM_SYNC_API_URL";

impl Config {
    /// Load configuration from config.json in the app directory
    /// Falls back to defaults if the file doesn't exist or can't be parsed
    pub async fn load() -> Self {
        let mut config = match paths::get_config_path() {
            Ok(path) => Self::load_from(&path).await,
            Err(err) => {
                warn!(error = ?err, "Failed to locate config.json, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// Load configuration from an explicit path, falling back to defaults.
    pub async fn load_from(path: &Path) -> Self {
        match Self::try_load(path).await {
            Ok(config) => {
                info!(
                    api = %config.api_base_url,
                    timeout_secs = config.request_timeout_secs,
                    "Loaded configuration"
                );
                config
            }
            Err(err) => {
                warn!(error = ?err, "Failed to load config.json, using defaults");
                Self::default()
            }
        }
    }

    async fn try_load(config_path: &Path) -> Result<Self, SyncError> {
        if !config_path.exists() {
            warn!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path)
            .await
            .map_err(|err| SyncError::Config(format!("Failed to read config file: {err}")))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|err| SyncError::Config(format!("Failed to parse config.json: {err}")))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SyncError> {
        if self.api_base_url.trim().is_empty() {
            return Err(SyncError::Config("api_base_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.default_auto_sync_interval_minutes == 0 {
            return Err(SyncError::Config(
                "default_auto_sync_interval_minutes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(custom) = env::var(API_URL_ENV) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                info!(api = %trimmed, "Using API URL from environment");
                self.api_base_url = trimmed.to_string();
            }
        }
    }
}
