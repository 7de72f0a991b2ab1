use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::contract::PhotoRef;
use crate::utils::validation::validate_not_blank;

/// Foto subida en base64 (se acepta también una data URL)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PhotoUpload {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,

    pub content_type: Option<String>,

    #[validate(length(min = 1))]
    pub data: String,
}

// Request para crear un contrato. `photos[0]` es el documento de contrato.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContractRequest {
    pub car_id: Uuid,

    #[validate(length(max = 200), custom = "validate_not_blank")]
    pub customer_name: String,

    pub rental_start_date: String,
    pub rental_end_date: String,

    #[serde(default)]
    #[validate]
    pub photos: Vec<PhotoUpload>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReturnRequest {
    /// El mínimo (> 0 y >= odómetro) lo comprueba el ciclo de vida
    #[validate(range(max = 10000000))]
    pub return_mileage: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddPhotosRequest {
    #[validate]
    pub photos: Vec<PhotoUpload>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContractPhotoRequest {
    #[validate]
    pub photo: PhotoUpload,
}

#[derive(Debug, Deserialize)]
pub struct RemovePhotoQuery {
    pub photo: PhotoRef,
}

#[derive(Debug, Deserialize)]
pub struct ContractListQuery {
    pub car_id: Option<Uuid>,
    #[serde(default)]
    pub future: bool,
}

#[derive(Debug, Serialize)]
pub struct PhotosResponse {
    pub photos: Vec<PhotoRef>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_customer_name_is_rejected() {
        let request = CreateContractRequest {
            car_id: Uuid::new_v4(),
            customer_name: " ".to_string(),
            rental_start_date: "2024-01-10".to_string(),
            rental_end_date: "2024-01-15".to_string(),
            photos: Vec::new(),
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("customer_name"));
    }

    #[test]
    fn test_nested_photo_is_validated() {
        let request = AddPhotosRequest {
            photos: vec![PhotoUpload {
                file_name: String::new(),
                content_type: None,
                data: "aGVsbG8=".to_string(),
            }],
        };
        assert!(request.validate().is_err());
    }
}
