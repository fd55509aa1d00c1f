use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::sync_client::helpers::format_relative_time;

use super::{BackupHistory, Phase, SyncState};

/// UI affordances the controller owns on behalf of the view.
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Affordances {
    /// Shown after the server asks for re-authorization.
    pub refresh_token_visible: bool,
    /// Visual state of the auto-sync switch.
    pub auto_sync_toggle: bool,
}

/// Read-only copy of everything a view needs to render the sync panel.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub state: SyncState,
    pub phase: Phase,
    pub affordances: Affordances,
    pub backups: BackupHistory,
}

impl SyncSnapshot {
    pub fn status_label(&self) -> &'static str {
        self.phase.label()
    }

    /// Backup actions are offered only once the account is authorized.
    pub fn can_transfer(&self) -> bool {
        self.phase == Phase::Authorized
    }

    pub fn last_sync_line(&self, now: DateTime<Utc>) -> Option<String> {
        if !self.state.sync_configured {
            return None;
        }
        self.state.last_sync.map(|when| {
            format!(
                "Last sync: {} ({})",
                when.format("%Y-%m-%d %H:%M UTC"),
                format_relative_time(when, now)
            )
        })
    }
}
