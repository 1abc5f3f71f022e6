use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::models::{AdoptionRequestRecord, ApiEnvelope, ErrorBody, LoginResponse};
use crate::retry::{with_retry, RetryConfig};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

const LOGIN: &str = "/auth/login";
const MY_ADOPTION_REQUESTS: &str = "/solicitudes/mis-solicitudes";

/// Client for the DalePata REST backend
pub struct DalePataClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    retry_config: RetryConfig,
}

impl DalePataClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("DalePata/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            retry_config: RetryConfig::none(),
        })
    }

    /// Attach the bearer token used for authenticated endpoints
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in with email and password
    ///
    /// Not retried: a failed login is almost always bad credentials.
    /// A 401 here means wrong password, not an expired session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self.client.post(self.url(LOGIN)).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(failure_from_body(status, &text));
        }

        let login: LoginResponse = serde_json::from_str(&text)?;
        if !login.success {
            return Err(ApiError::RequestFailed {
                status: None,
                message: login.message.unwrap_or_else(|| "Login failed".to_string()),
            });
        }

        debug!("Login succeeded for {}", email);
        Ok(login)
    }

    /// All adoption requests of the logged-in user
    pub async fn list_my_adoption_requests(&self) -> Result<Vec<AdoptionRequestRecord>> {
        let token = self.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        let url = self.url(MY_ADOPTION_REQUESTS);

        let requests: Vec<AdoptionRequestRecord> = with_retry(&self.retry_config, || async {
            let response = self.client.get(&url).bearer_auth(token).send().await?;
            let status = response.status();
            let text = response.text().await?;

            read_envelope::<Vec<AdoptionRequestRecord>>(
                status,
                &text,
                "Error fetching adoption requests",
            )
        })
        .await?;

        debug!("Fetched {} adoption requests", requests.len());
        Ok(requests)
    }
}

/// Turn an HTTP status + body into the envelope's `data`
///
/// 401 means the session is gone. Other non-2xx codes carry the server's
/// message when it sent one.
pub(crate) fn read_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    fallback: &str,
) -> Result<T> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::SessionExpired);
    }

    if !status.is_success() {
        return Err(failure_from_body(status, body));
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    if !envelope.success {
        return Err(ApiError::RequestFailed {
            status: None,
            message: envelope.message.unwrap_or_else(|| fallback.to_string()),
        });
    }

    envelope.data.ok_or_else(|| ApiError::RequestFailed {
        status: None,
        message: format!("{}: response has no data", fallback),
    })
}

fn failure_from_body(status: StatusCode, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

    ApiError::RequestFailed {
        status: Some(status),
        message,
    }
}
