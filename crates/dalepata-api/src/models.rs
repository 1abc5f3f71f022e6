use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard response wrapper used by the backend: `{success, data, message}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body the backend sends with non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Adoption request as the backend returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdoptionRequestRecord {
    pub id: i64,
    /// pendiente | enviada | aprobada | rechazada | cancelada
    pub estado: String,
    pub mascota: PetSummary,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comentario: Option<String>,
}

/// The pet embedded in an adoption request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetSummary {
    #[serde(default)]
    pub id: Option<i64>,
    pub nombre: String,
    #[serde(default)]
    pub especie: Option<String>,
    #[serde(default)]
    pub raza: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
}

/// `POST /auth/login` answer. Token and user sit at the top level, not under `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<serde_json::Value>,
}
