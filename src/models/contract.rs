//! Modelo de Contract
//!
//! Contratos de location con sus fotos y su estado en el ciclo de vida
//! `active -> pending_return -> archived`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::errors::DomainError;

/// Índice de la foto del documento de contrato dentro de `photos`
pub const CONTRACT_PHOTO_INDEX: usize = 0;

/// Referencia a una foto en el almacén de fotos (p. ej. `/uploads/123-contrat.jpg`)
pub type PhotoRef = String;

/// Estado del contrato
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    PendingReturn,
    Archived,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::PendingReturn => "pending_return",
            ContractStatus::Archived => "archived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ContractStatus::Archived)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(ContractStatus::Active),
            "pending_return" => Ok(ContractStatus::PendingReturn),
            "archived" => Ok(ContractStatus::Archived),
            other => Err(DomainError::Validation(format!(
                "Unknown contract status '{}' (expected active, pending_return or archived)",
                other
            ))),
        }
    }
}

/// Contract principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub car_id: Uuid,
    pub customer_name: String,
    pub rental_start_date: DateTime<Utc>,
    pub rental_end_date: DateTime<Utc>,
    /// `photos[0]` es el documento de contrato, el resto son fotos del vehículo
    pub photos: Vec<PhotoRef>,
    pub return_mileage: Option<i64>,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

/// Contrato enriquecido con los datos del coche (vista de recordatorios)
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingContract {
    #[serde(flatten)]
    pub contract: Contract,
    pub car_name: String,
    pub car_model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ContractStatus::Active,
            ContractStatus::PendingReturn,
            ContractStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<ContractStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_validation_error() {
        assert!(matches!(
            "en attente".parse::<ContractStatus>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ContractStatus::PendingReturn).unwrap();
        assert_eq!(json, "\"pending_return\"");
    }
}
