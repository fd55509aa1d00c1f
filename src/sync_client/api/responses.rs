use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::types::SyncError;

/// The `{success, error, action_required}` wrapper every endpoint replies
/// with. Payload fields sit next to these keys at the top level.
#[derive(Debug, Deserialize, Default)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub action_required: Option<String>,
}

impl ApiEnvelope {
    /// Split a raw reply into either the typed payload or the matching error.
    pub fn interpret<T>(path: &str, value: Value) -> Result<T, SyncError>
    where
        T: DeserializeOwned,
    {
        let envelope: ApiEnvelope = serde_json::from_value(value.clone()).map_err(|err| {
            SyncError::Transport(format!("{path} returned an unexpected body: {err}"))
        })?;

        if !envelope.success {
            return match envelope.action_required {
                Some(action) if !action.trim().is_empty() => {
                    let message = envelope
                        .error
                        .filter(|msg| !msg.trim().is_empty())
                        .unwrap_or(action);
                    Err(SyncError::ReauthorizationRequired(message))
                }
                _ => Err(SyncError::Application(
                    envelope
                        .error
                        .filter(|msg| !msg.trim().is_empty())
                        .unwrap_or_else(|| "Unknown error".to_string()),
                )),
            };
        }

        serde_json::from_value(value).map_err(|err| {
            SyncError::Transport(format!("{path} returned an unexpected payload: {err}"))
        })
    }
}

/// Payload-less success.
#[derive(Debug, Deserialize)]
pub struct Acknowledged {}

#[derive(Debug, Deserialize)]
pub struct AuthorizeResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct StatusResponse {
    #[serde(default)]
    pub oauth_configured: bool,
    #[serde(default)]
    pub oauth_authorized: bool,
    #[serde(default)]
    pub sync_configured: bool,
    #[serde(default)]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub auto_sync_enabled: Option<bool>,
    #[serde(default)]
    pub auto_sync_interval_minutes: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BackupsResponse {
    #[serde(default)]
    pub backups: Vec<BackupRecord>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackupRecord {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_required_wins_over_plain_error() {
        let err = ApiEnvelope::interpret::<Acknowledged>(
            "/api/oauth/upload",
            json!({"success": false, "error": "token expired", "action_required": "Re-authorize"}),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::ReauthorizationRequired(ref m) if m == "token expired"));
    }

    #[test]
    fn bare_action_required_names_the_action() {
        let err = ApiEnvelope::interpret::<Acknowledged>(
            "/api/oauth/upload",
            json!({"success": false, "action_required": "Re-authorize"}),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::ReauthorizationRequired(ref m) if m == "Re-authorize"));
    }

    #[test]
    fn failure_without_message_gets_placeholder() {
        let err =
            ApiEnvelope::interpret::<Acknowledged>("/api/oauth/cleanup", json!({"success": false}))
                .unwrap_err();
        assert!(matches!(err, SyncError::Application(ref m) if m == "Unknown error"));
    }

    #[test]
    fn non_object_body_is_a_transport_error() {
        let err = ApiEnvelope::interpret::<Acknowledged>("/api/oauth/status", json!("oops"))
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }

    #[test]
    fn status_defaults_missing_flags() {
        let status: StatusResponse =
            ApiEnvelope::interpret("/api/oauth/status", json!({"success": true})).unwrap();
        assert_eq!(status, StatusResponse::default());
    }
}
