use crate::{models::AdoptionRequest, Result};

/// Where adoption requests come from
///
/// The real implementation talks to the backend
/// ([`crate::providers::RemoteRequestSource`]); tests plug in fakes.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AdoptionRequestSource: Send + Sync {
    /// Every adoption request of the current user
    async fn list_my_requests(&self) -> Result<Vec<AdoptionRequest>>;
}
