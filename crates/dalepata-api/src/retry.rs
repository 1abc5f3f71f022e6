// Retry logic with exponential backoff
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,     // Start with 1 second
            max_delay_ms: 30000,        // Max 30 seconds
            backoff_multiplier: 2.0,    // Double each time
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Errors that know whether another attempt could help
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Execute a function with retry logic
///
/// Uses exponential backoff between attempts. Errors that report
/// themselves as non-retryable (401, validation failures...) are returned
/// straight away.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + Retryable,
{
    let mut attempt = 0;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("Request succeeded after {} retries", attempt);
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_retryable() {
                    return Err(err);
                }

                attempt += 1;

                if attempt > config.max_retries {
                    warn!("Request failed after {} attempts: {}", attempt, err);
                    return Err(err);
                }

                warn!("Request failed (attempt {}/{}): {}. Retrying in {}ms...",
                    attempt, config.max_retries, err, delay_ms);

                sleep(Duration::from_millis(delay_ms)).await;

                delay_ms = ((delay_ms as f64) * config.backoff_multiplier) as u64;
                delay_ms = delay_ms.min(config.max_delay_ms);
            }
        }
    }
}

/// Check if an HTTP status code is retryable
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    // 5xx, 429 rate limited, 408 request timeout
    status.is_server_error()
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
}
