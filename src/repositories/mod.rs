//! Repositorios
//!
//! Contratos de persistencia usados por los servicios. Hay dos
//! implementaciones: PostgreSQL (`sqlx`) y en memoria (desarrollo y tests).
//! Todas las escrituras condicionales ("sólo si no está archivado") son
//! atómicas por registro.

pub mod car_repository;
pub mod contract_repository;
pub mod entretien_repository;
pub mod memory_repository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::car::Car;
use crate::models::contract::{Contract, ContractStatus, PhotoRef};
use crate::models::entretien::Entretien;
use crate::utils::errors::AppResult;

pub use car_repository::PgCarRepository;
pub use contract_repository::PgContractRepository;
pub use entretien_repository::PgEntretienRepository;
pub use memory_repository::MemoryStore;

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn create(&self, car: &Car) -> AppResult<Car>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Car>>;
    async fn find_all(&self) -> AppResult<Vec<Car>>;
    /// `exclude` permite ignorar el propio coche al editar
    async fn model_exists(&self, model: &str, exclude: Option<Uuid>) -> AppResult<bool>;
    async fn update(&self, car: &Car) -> AppResult<Option<Car>>;
    async fn get_mileage(&self, id: Uuid) -> AppResult<Option<i64>>;
    /// Borra el coche con sus contratos y su entretien en una sola unidad.
    /// `None` si el coche no existe.
    async fn delete_with_dependents(&self, id: Uuid) -> AppResult<Option<CarRemoval>>;
}

/// Lo que se llevó el borrado de un coche
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarRemoval {
    pub contracts: u64,
    /// Fotos de los contratos borrados, para limpiar el almacén después
    pub photos: Vec<PhotoRef>,
}

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn create(&self, contract: &Contract) -> AppResult<Contract>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Contract>>;
    /// Ordenados por inicio descendente
    async fn find_by_car(&self, car_id: Uuid) -> AppResult<Vec<Contract>>;
    /// Contratos que empiezan en o después de `from`, por inicio ascendente
    async fn find_starting_from(&self, from: DateTime<Utc>) -> AppResult<Vec<Contract>>;
    /// Sólo si el contrato no está archivado; `None` si no existe o ya está archivado
    async fn update_photos(&self, id: Uuid, photos: &[PhotoRef]) -> AppResult<Option<Contract>>;
    /// Sólo si el contrato no está archivado
    async fn update_status(&self, id: Uuid, status: ContractStatus, photos: &[PhotoRef]) -> AppResult<Option<Contract>>;
    /// Archiva el contrato y sube el odómetro del coche en una sola unidad.
    /// `None` si el contrato ya estaba archivado (o no existe).
    async fn archive_with_return(
        &self,
        id: Uuid,
        return_mileage: i64,
        photos: &[PhotoRef],
    ) -> AppResult<Option<Contract>>;
    /// `active` con fin < now => `pending_return`; devuelve cuántos cambiaron
    async fn mark_pending_returns(&self, now: DateTime<Utc>) -> AppResult<u64>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait EntretienRepository: Send + Sync {
    async fn upsert(&self, entretien: &Entretien) -> AppResult<Entretien>;
    async fn find_by_car(&self, car_id: Uuid) -> AppResult<Option<Entretien>>;
    async fn find_all(&self) -> AppResult<Vec<Entretien>>;
    async fn delete_by_car(&self, car_id: Uuid) -> AppResult<bool>;
}

/// Conjunto de repositorios compartido en el estado de la aplicación
#[derive(Clone)]
pub struct Repositories {
    pub cars: Arc<dyn CarRepository>,
    pub contracts: Arc<dyn ContractRepository>,
    pub entretiens: Arc<dyn EntretienRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            cars: Arc::new(PgCarRepository::new(pool.clone())),
            contracts: Arc::new(PgContractRepository::new(pool.clone())),
            entretiens: Arc::new(PgEntretienRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = MemoryStore::new();
        Self {
            cars: Arc::new(store.clone()),
            contracts: Arc::new(store.clone()),
            entretiens: Arc::new(store),
        }
    }
}
