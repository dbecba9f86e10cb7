use reqwest::StatusCode;

pub type Result<T, E = PortalError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {detail}")]
    Http {
        endpoint: String,
        status: StatusCode,
        detail: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0} requires an admin account")]
    Unauthorized(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("store: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl PortalError {
    /// Transport errors and non-2xx answers from a remote service.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Http { .. })
    }
}
