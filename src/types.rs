use thiserror::Error;

/// Errors surfaced by the sync controller and its collaborators.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bad local input. Never sent to the server.
    #[error("{0}")]
    Validation(String),
    /// The request could not complete (no response, or an unreadable one).
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with `success: false`.
    #[error("server error: {0}")]
    Application(String),
    #[error("cloud account is not authorized")]
    NotAuthorized,
    #[error("re-authorization required: {0}")]
    ReauthorizationRequired(String),
    #[error("authorization code rejected: {0}")]
    InvalidCode(String),
    #[error("offline cache error: {0}")]
    Cache(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl SyncError {
    /// True for errors that should flip the UI towards token refresh or
    /// full re-authorization.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(self, SyncError::ReauthorizationRequired(_))
    }
}
