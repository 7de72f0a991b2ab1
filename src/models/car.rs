//! Modelo de Car
//!
//! Este módulo contiene el struct Car y la vista con disponibilidad derivada.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Car principal - mapea exactamente a la tabla cars
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub name: String,
    /// Serie/modelo, único en el inventario
    pub model: String,
    pub year: i32,
    /// Kilometraje actual, nunca decrece
    pub mileage: i64,
    pub created_at: DateTime<Utc>,
}

impl Car {
    pub fn new(name: String, model: String, year: i32, mileage: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            model,
            year,
            mileage,
            created_at: Utc::now(),
        }
    }
}

/// Etiqueta de disponibilidad, derivada al leer (no se persiste)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarAvailability {
    Available,
    Rented,
}

/// Car con su disponibilidad calculada respecto a "ahora"
#[derive(Debug, Clone, Serialize)]
pub struct CarView {
    #[serde(flatten)]
    pub car: Car,
    pub is_available: bool,
    pub status: CarAvailability,
}

impl CarView {
    pub fn new(car: Car, rented: bool) -> Self {
        Self {
            car,
            is_available: !rented,
            status: if rented {
                CarAvailability::Rented
            } else {
                CarAvailability::Available
            },
        }
    }
}
