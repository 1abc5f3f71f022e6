use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::{is_retryable_status, Retryable};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("API request failed: {message}")]
    RequestFailed {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            // Transport trouble: connection refused, timeouts, resets
            ApiError::NetworkError(_) => true,
            ApiError::RequestFailed {
                status: Some(status),
                ..
            } => is_retryable_status(*status),
            _ => false,
        }
    }
}
