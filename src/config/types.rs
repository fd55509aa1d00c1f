use serde::{Deserialize, Serialize};

/// Configuration for the cloud backup client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// How long to wait for the out-of-band authorization window before
    /// resting in the pending state.
    #[serde(default = "default_authorization_timeout_secs")]
    pub authorization_timeout_secs: u64,

    #[serde(default = "default_auto_sync_interval_minutes")]
    pub default_auto_sync_interval_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            authorization_timeout_secs: default_authorization_timeout_secs(),
            default_auto_sync_interval_minutes: default_auto_sync_interval_minutes(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_authorization_timeout_secs() -> u64 {
    300
}

fn default_auto_sync_interval_minutes() -> u32 {
    30
}
