use thiserror::Error;

/// Failure of a single version-source or token call
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Authorization failed with status {status}: {body}")]
    Authorization { status: u16, body: String },

    #[error("No offline token configured")]
    MissingCredentials,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Whether retrying the same call may succeed
    ///
    /// Only timeouts, connection failures and 5xx/408/429 responses qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => is_transient_status(*status),
            FetchError::Authorization { .. }
            | FetchError::MissingCredentials
            | FetchError::InvalidResponse(_) => false,
        }
    }
}

/// 5xx, 408 and 429 are worth retrying; every other non-2xx status is final
pub fn is_transient_status(status: u16) -> bool {
    (500..600).contains(&status) || status == 408 || status == 429
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No versions available for {cluster_type} on channel '{channel}'")]
    NoVersionsAvailable {
        cluster_type: String,
        channel: String,
    },

    #[error(
        "Version '{requested}' is not supported for {cluster_type}. Supported versions: {}. Latest: {latest}",
        supported.join(", ")
    )]
    UnsupportedVersion {
        requested: String,
        cluster_type: String,
        supported: Vec<String>,
        latest: String,
    },

    #[error("Failed to fetch versions for {cluster_type}: {source}")]
    FetchExhausted {
        cluster_type: String,
        #[source]
        source: FetchError,
    },

    #[error("Authorization failed with status {status}: {body}")]
    Authorization { status: u16, body: String },
}
