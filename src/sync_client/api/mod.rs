mod requests;
mod responses;

pub use requests::{AuthorizeRequest, AutoSyncRequest, ExchangeRequest, RemotePathRequest};
pub use responses::{
    Acknowledged, ApiEnvelope, AuthorizeResponse, BackupRecord, BackupsResponse, MessageResponse,
    StatusResponse,
};
