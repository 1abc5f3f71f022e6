// DalePata backend source - bridges the API client with AdoptionRequestSource
use async_trait::async_trait;
use dalepata_api::{AdoptionRequestRecord, DalePataClient};
use tracing::debug;

use crate::{
    models::{AdoptionRequest, PetRef, RequestStatus},
    source::AdoptionRequestSource,
    Error, Result,
};

/// Wrapper around DalePataClient that implements AdoptionRequestSource
pub struct RemoteRequestSource {
    client: DalePataClient,
}

impl RemoteRequestSource {
    pub fn new(client: DalePataClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AdoptionRequestSource for RemoteRequestSource {
    async fn list_my_requests(&self) -> Result<Vec<AdoptionRequest>> {
        let records = self
            .client
            .list_my_adoption_requests()
            .await
            .map_err(Error::from_source)?;

        Ok(records.into_iter().map(record_to_request).collect())
    }
}

/// Convert the backend's adoption request to our internal model
fn record_to_request(record: AdoptionRequestRecord) -> AdoptionRequest {
    let status = RequestStatus::parse(&record.estado);
    if status == RequestStatus::Unknown {
        debug!("Request {} has unrecognised estado '{}'", record.id, record.estado);
    }

    AdoptionRequest {
        id: record.id,
        status,
        pet: PetRef {
            id: record.mascota.id,
            name: record.mascota.nombre,
            species: record.mascota.especie,
            breed: record.mascota.raza,
            // Empty strings show up for pets without a photo
            image_url: record.mascota.imagen_url.filter(|url| !url.trim().is_empty()),
        },
        created_at: record.created_at,
        comment: record.comentario,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dalepata_api::PetSummary;

    fn record(estado: &str, imagen_url: Option<&str>) -> AdoptionRequestRecord {
        AdoptionRequestRecord {
            id: 9,
            estado: estado.to_string(),
            mascota: PetSummary {
                id: Some(3),
                nombre: "Canela".to_string(),
                especie: Some("Gato".to_string()),
                raza: None,
                imagen_url: imagen_url.map(str::to_string),
            },
            created_at: chrono::Utc::now(),
            comentario: Some("Todo en orden".to_string()),
        }
    }

    #[test]
    fn test_record_conversion() {
        let request = record_to_request(record("aprobada", Some("https://img/canela.png")));

        assert_eq!(request.id, 9);
        assert_eq!(request.status, RequestStatus::Aprobada);
        assert_eq!(request.pet.id, Some(3));
        assert_eq!(request.pet.name, "Canela");
        assert_eq!(request.pet.image_url.as_deref(), Some("https://img/canela.png"));
        assert_eq!(request.comment.as_deref(), Some("Todo en orden"));
    }

    #[test]
    fn test_blank_image_becomes_none() {
        let request = record_to_request(record("rechazada", Some("  ")));
        assert_eq!(request.pet.image_url, None);
    }

    #[test]
    fn test_unknown_status_is_kept_as_unknown() {
        let request = record_to_request(record("en_revision", None));
        assert_eq!(request.status, RequestStatus::Unknown);
    }
}
