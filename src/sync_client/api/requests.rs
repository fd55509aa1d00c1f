use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AuthorizeRequest<'a> {
    #[serde(rename = "accountId")]
    pub account_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ExchangeRequest<'a> {
    pub code: &'a str,
}

/// Body for download and restore. A `None` path asks the server for its
/// default (latest) backup.
#[derive(Debug, Serialize)]
pub struct RemotePathRequest<'a> {
    pub remote_path: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct AutoSyncRequest {
    pub interval_minutes: u32,
}
