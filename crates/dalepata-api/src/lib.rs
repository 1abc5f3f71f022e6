// HTTP client for the DalePata adoption backend
pub mod client;
pub mod error;
pub mod models;
pub mod retry;

pub use client::DalePataClient;
pub use error::{ApiError, Result};
pub use models::{AdoptionRequestRecord, LoginResponse, PetSummary};
pub use retry::RetryConfig;
