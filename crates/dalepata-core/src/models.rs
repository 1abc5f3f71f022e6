use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an adoption request stands: pendiente → enviada → {aprobada | rechazada | cancelada}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pendiente,
    Enviada,
    Aprobada,
    Rechazada,
    Cancelada,
    /// Anything the backend sends that we don't know about
    #[serde(other)]
    Unknown,
}

impl RequestStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pendiente" => RequestStatus::Pendiente,
            "enviada" => RequestStatus::Enviada,
            "aprobada" => RequestStatus::Aprobada,
            "rechazada" => RequestStatus::Rechazada,
            "cancelada" => RequestStatus::Cancelada,
            _ => RequestStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pendiente => "pendiente",
            RequestStatus::Enviada => "enviada",
            RequestStatus::Aprobada => "aprobada",
            RequestStatus::Rechazada => "rechazada",
            RequestStatus::Cancelada => "cancelada",
            RequestStatus::Unknown => "unknown",
        }
    }

    /// The shelter has decided: approved or rejected
    pub fn is_decision(&self) -> bool {
        matches!(self, RequestStatus::Aprobada | RequestStatus::Rechazada)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The pet an adoption request is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetRef {
    pub id: Option<i64>,
    pub name: String,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub image_url: Option<String>,
}

/// A user's application to adopt a pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionRequest {
    pub id: i64,
    pub status: RequestStatus,
    pub pet: PetRef,
    pub created_at: DateTime<Utc>,
    /// Shelter's note on the decision
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(RequestStatus::parse("aprobada"), RequestStatus::Aprobada);
        assert_eq!(RequestStatus::parse(" Rechazada "), RequestStatus::Rechazada);
        assert_eq!(RequestStatus::parse("en_revision"), RequestStatus::Unknown);
    }

    #[test]
    fn test_only_decisions_count() {
        assert!(RequestStatus::Aprobada.is_decision());
        assert!(RequestStatus::Rechazada.is_decision());
        assert!(!RequestStatus::Pendiente.is_decision());
        assert!(!RequestStatus::Enviada.is_decision());
        assert!(!RequestStatus::Cancelada.is_decision());
        assert!(!RequestStatus::Unknown.is_decision());
    }

    #[test]
    fn test_status_serde_uses_wire_names() {
        assert_eq!(serde_json::to_string(&RequestStatus::Aprobada).unwrap(), "\"aprobada\"");
        let status: RequestStatus = serde_json::from_str("\"archivada\"").unwrap();
        assert_eq!(status, RequestStatus::Unknown);
    }
}
