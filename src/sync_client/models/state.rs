use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::sync_client::api::StatusResponse;
use crate::sync_client::helpers::parse_timestamp;

/// Where the account sits in the authorization lifecycle.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Unconfigured,
    PendingAuthorization,
    Authorized,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Unconfigured => "Not configured",
            Phase::PendingAuthorization => "Authorization required",
            Phase::Authorized => "Authorized",
        }
    }
}

/// Local copy of the server's view of the cloud backup account.
///
/// `authorized` never holds without `configured`.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct SyncState {
    pub configured: bool,
    pub authorized: bool,
    pub sync_configured: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub auto_sync_enabled: bool,
    pub auto_sync_interval_minutes: Option<u32>,
}

impl SyncState {
    pub fn phase(&self) -> Phase {
        match (self.configured, self.authorized) {
            (false, _) => Phase::Unconfigured,
            (true, false) => Phase::PendingAuthorization,
            (true, true) => Phase::Authorized,
        }
    }

    /// Overwrite with an authoritative status reply.
    ///
    /// Auto-sync fields are only replaced when the server reports them.
    pub fn apply_status(&mut self, status: &StatusResponse) {
        if status.oauth_authorized && !status.oauth_configured {
            warn!("Server reports an authorized but unconfigured account; treating as unauthorized");
        }
        self.configured = status.oauth_configured;
        self.authorized = status.oauth_authorized && status.oauth_configured;
        self.sync_configured = status.sync_configured;
        self.last_sync = status.last_sync.as_deref().and_then(parse_timestamp);

        if let Some(enabled) = status.auto_sync_enabled {
            self.auto_sync_enabled = enabled;
            self.auto_sync_interval_minutes = if enabled {
                status
                    .auto_sync_interval_minutes
                    .or(self.auto_sync_interval_minutes)
            } else {
                None
            };
        }
    }

    /// Drop back to pending after the server declared the token unusable.
    pub fn revoke_authorization(&mut self) {
        self.authorized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(configured: bool, authorized: bool) -> StatusResponse {
        StatusResponse {
            oauth_configured: configured,
            oauth_authorized: authorized,
            ..StatusResponse::default()
        }
    }

    #[test]
    fn phases_follow_flags() {
        let mut state = SyncState::default();
        assert_eq!(state.phase(), Phase::Unconfigured);

        state.apply_status(&status(true, false));
        assert_eq!(state.phase(), Phase::PendingAuthorization);

        state.apply_status(&status(true, true));
        assert_eq!(state.phase(), Phase::Authorized);
    }

    #[test]
    fn authorized_without_configured_is_normalized() {
        let mut state = SyncState::default();
        state.apply_status(&status(false, true));
        assert!(!state.authorized);
        assert_eq!(state.phase(), Phase::Unconfigured);
    }

    #[test]
    fn unparseable_last_sync_is_dropped() {
        let mut state = SyncState::default();
        state.apply_status(&StatusResponse {
            last_sync: Some("sometime".to_string()),
            ..status(true, true)
        });
        assert!(state.last_sync.is_none());
    }

    #[test]
    fn auto_sync_fields_survive_status_without_them() {
        let mut state = SyncState {
            auto_sync_enabled: true,
            auto_sync_interval_minutes: Some(45),
            ..SyncState::default()
        };
        state.apply_status(&status(true, true));
        assert!(state.auto_sync_enabled);
        assert_eq!(state.auto_sync_interval_minutes, Some(45));

        state.apply_status(&StatusResponse {
            auto_sync_enabled: Some(false),
            ..status(true, true)
        });
        assert!(!state.auto_sync_enabled);
        assert_eq!(state.auto_sync_interval_minutes, None);
    }
}
