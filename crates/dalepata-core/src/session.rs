use dalepata_api::{ApiError, DalePataClient};
use dalepata_store::{keys, DeviceStorage};
use std::sync::Arc;
use tracing::info;

use crate::{Error, Result};

/// Who is logged in on this device
///
/// Token and cached user live in device storage next to the read markers.
/// Logging out wipes all three together.
pub struct Session {
    storage: Arc<DeviceStorage>,
}

impl Session {
    pub fn new(storage: Arc<DeviceStorage>) -> Self {
        Self { storage }
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.storage
            .get_item(keys::AUTH_TOKEN)
            .map_err(|e| Error::StoreReadError(e.to_string()))
    }

    /// Cached user profile as the backend returned it
    pub fn user(&self) -> Result<Option<serde_json::Value>> {
        self.storage
            .get_json(keys::USER_DATA)
            .map_err(|e| Error::StoreReadError(e.to_string()))
    }

    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self.token()?.is_some())
    }

    /// Remember a token and, optionally, the user it belongs to
    pub fn save(&self, token: &str, user: Option<&serde_json::Value>) -> Result<()> {
        self.storage
            .set_item(keys::AUTH_TOKEN, token)
            .map_err(|e| Error::StoreWriteError(e.to_string()))?;

        if let Some(user) = user {
            self.storage
                .set_json(keys::USER_DATA, user)
                .map_err(|e| Error::StoreWriteError(e.to_string()))?;
        }

        Ok(())
    }

    /// Log in against the backend and persist the session
    pub async fn login(
        &self,
        client: &DalePataClient,
        email: &str,
        password: &str,
    ) -> Result<Option<serde_json::Value>> {
        let response = client.login(email, password).await.map_err(|e| match e {
            ApiError::RequestFailed { message, .. } => Error::AuthError(message),
            other => Error::AuthError(other.to_string()),
        })?;

        let token = response
            .token
            .ok_or_else(|| Error::AuthError("Login response did not include a token".into()))?;

        self.save(&token, response.user.as_ref())?;
        info!("Logged in as {}", email);

        Ok(response.user)
    }

    /// Forget token, user and read markers
    pub fn logout(&self) -> Result<()> {
        self.storage
            .multi_remove(&keys::SESSION_KEYS)
            .map_err(|e| Error::StoreWriteError(e.to_string()))?;
        info!("Session cleared");
        Ok(())
    }
}
