use dalepata_api::ApiError;
use thiserror::Error;

/// All the ways the notification client can fail
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not fetch adoption requests: {0}")]
    SourceFetchError(String),

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Could not read notification state: {0}")]
    StoreReadError(String),

    #[error("Could not save notification state: {0}")]
    StoreWriteError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Map an API failure hit while fetching adoption requests
    pub fn from_source(err: ApiError) -> Self {
        match err {
            ApiError::SessionExpired => Error::SessionExpired,
            ApiError::NotAuthenticated => Error::AuthError(err.to_string()),
            other => Error::SourceFetchError(other.to_string()),
        }
    }
}
