use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::SyncError;

use super::api::{
    Acknowledged, ApiEnvelope, AuthorizeRequest, AuthorizeResponse, AutoSyncRequest,
    BackupRecord, BackupsResponse, ExchangeRequest, MessageResponse, RemotePathRequest,
    StatusResponse,
};
use super::core::Transport;

const STATUS: &str = "/api/oauth/status";
const AUTHORIZE: &str = "/api/oauth/authorize";
const EXCHANGE: &str = "/api/oauth/exchange";
const TEST: &str = "/api/oauth/test";
const UPLOAD: &str = "/api/oauth/upload";
const DOWNLOAD: &str = "/api/oauth/download";
const RESTORE: &str = "/api/oauth/restore";
const BACKUPS: &str = "/api/oauth/backups";
const CLEANUP: &str = "/api/oauth/cleanup";
const AUTO_ENABLE: &str = "/api/oauth/auto/enable";
const AUTO_DISABLE: &str = "/api/oauth/auto/disable";
const REFRESH: &str = "/api/oauth/refresh";

/// Typed view of the backend's `/api/oauth/*` endpoints.
#[derive(Clone)]
pub struct SyncApiClient {
    transport: Arc<dyn Transport>,
}

impl SyncApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn status(&self) -> Result<StatusResponse, SyncError> {
        self.get(STATUS).await
    }

    /// Returns the provider URL the user must visit.
    pub async fn authorize(&self, account_id: &str) -> Result<String, SyncError> {
        let response: AuthorizeResponse = self
            .post(AUTHORIZE, Some(&AuthorizeRequest { account_id }))
            .await?;
        Ok(response.auth_url)
    }

    pub async fn exchange(&self, code: &str) -> Result<(), SyncError> {
        let _: Acknowledged = self.post(EXCHANGE, Some(&ExchangeRequest { code })).await?;
        Ok(())
    }

    pub async fn test_connection(&self) -> Result<Option<String>, SyncError> {
        let response: MessageResponse = self.post(TEST, None::<&()>).await?;
        Ok(response.message)
    }

    pub async fn upload(&self) -> Result<(), SyncError> {
        let _: Acknowledged = self.post(UPLOAD, None::<&()>).await?;
        Ok(())
    }

    pub async fn download(&self, remote_path: Option<&str>) -> Result<(), SyncError> {
        let _: Acknowledged = self
            .post(DOWNLOAD, Some(&RemotePathRequest { remote_path }))
            .await?;
        Ok(())
    }

    pub async fn restore(&self, remote_path: &str) -> Result<Option<String>, SyncError> {
        let response: MessageResponse = self
            .post(
                RESTORE,
                Some(&RemotePathRequest {
                    remote_path: Some(remote_path),
                }),
            )
            .await?;
        Ok(response.message)
    }

    pub async fn backups(&self) -> Result<Vec<BackupRecord>, SyncError> {
        let response: BackupsResponse = self.get(BACKUPS).await?;
        Ok(response.backups)
    }

    pub async fn cleanup(&self) -> Result<Option<String>, SyncError> {
        let response: MessageResponse = self.post(CLEANUP, None::<&()>).await?;
        Ok(response.message)
    }

    pub async fn enable_auto_sync(&self, interval_minutes: u32) -> Result<(), SyncError> {
        let _: Acknowledged = self
            .post(AUTO_ENABLE, Some(&AutoSyncRequest { interval_minutes }))
            .await?;
        Ok(())
    }

    pub async fn disable_auto_sync(&self) -> Result<(), SyncError> {
        let _: Acknowledged = self.post(AUTO_DISABLE, None::<&()>).await?;
        Ok(())
    }

    pub async fn refresh_token(&self) -> Result<(), SyncError> {
        let _: Acknowledged = self.post(REFRESH, None::<&()>).await?;
        Ok(())
    }

    async fn get<T>(&self, path: &str) -> Result<T, SyncError>
    where
        T: DeserializeOwned,
    {
        let value = self.transport.get_json(path).await?;
        ApiEnvelope::interpret(path, value)
    }

    async fn post<T, B>(&self, path: &str, body: Option<&B>) -> Result<T, SyncError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| SyncError::Validation(format!("Failed to encode request: {err}")))?;
        let value: Value = self.transport.post_json(path, body).await?;
        ApiEnvelope::interpret(path, value)
    }
}
