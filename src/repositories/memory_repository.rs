//! Store en memoria
//!
//! Implementa los tres repositorios sobre mapas protegidos por un único
//! `RwLock`, así las operaciones compuestas (reserva, retour) son atómicas
//! igual que en PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CarRemoval, CarRepository, ContractRepository, EntretienRepository};
use crate::models::car::Car;
use crate::models::contract::{Contract, ContractStatus, PhotoRef};
use crate::models::entretien::Entretien;
use crate::services::contract_lifecycle;
use crate::utils::errors::{AppError, AppResult};

#[derive(Debug, Default)]
struct MemoryData {
    cars: HashMap<Uuid, Car>,
    contracts: HashMap<Uuid, Contract>,
    entretiens: HashMap<Uuid, Entretien>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn model_taken(data: &MemoryData, model: &str, exclude: Option<Uuid>) -> bool {
    data.cars
        .values()
        .any(|car| car.model == model && Some(car.id) != exclude)
}

#[async_trait]
impl CarRepository for MemoryStore {
    async fn create(&self, car: &Car) -> AppResult<Car> {
        let mut data = self.data.write().await;
        if model_taken(&data, &car.model, None) {
            return Err(AppError::Conflict("A car with this model already exists".to_string()));
        }
        data.cars.insert(car.id, car.clone());
        Ok(car.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Car>> {
        Ok(self.data.read().await.cars.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Car>> {
        let data = self.data.read().await;
        let mut cars: Vec<Car> = data.cars.values().cloned().collect();
        cars.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cars)
    }

    async fn model_exists(&self, model: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        Ok(model_taken(&*self.data.read().await, model, exclude))
    }

    async fn update(&self, car: &Car) -> AppResult<Option<Car>> {
        let mut data = self.data.write().await;
        if !data.cars.contains_key(&car.id) {
            return Ok(None);
        }
        if model_taken(&data, &car.model, Some(car.id)) {
            return Err(AppError::Conflict("A car with this model already exists".to_string()));
        }

        let Some(stored) = data.cars.get_mut(&car.id) else {
            return Ok(None);
        };
        stored.name = car.name.clone();
        stored.model = car.model.clone();
        stored.year = car.year;
        stored.mileage = stored.mileage.max(car.mileage);
        Ok(Some(stored.clone()))
    }

    async fn get_mileage(&self, id: Uuid) -> AppResult<Option<i64>> {
        Ok(self.data.read().await.cars.get(&id).map(|car| car.mileage))
    }

    async fn delete_with_dependents(&self, id: Uuid) -> AppResult<Option<CarRemoval>> {
        let mut data = self.data.write().await;
        if data.cars.remove(&id).is_none() {
            return Ok(None);
        }

        let mut removal = CarRemoval::default();
        data.contracts.retain(|_, c| {
            if c.car_id != id {
                return true;
            }
            removal.contracts += 1;
            removal.photos.extend(c.photos.iter().cloned());
            false
        });
        data.entretiens.remove(&id);

        Ok(Some(removal))
    }
}

#[async_trait]
impl ContractRepository for MemoryStore {
    async fn create(&self, contract: &Contract) -> AppResult<Contract> {
        let mut data = self.data.write().await;

        // Comprobación y escritura bajo el mismo lock
        let same_car = data.contracts.values().filter(|c| c.car_id == contract.car_id);
        if contract_lifecycle::find_overlap(same_car, contract.rental_start_date, contract.rental_end_date).is_some() {
            return Err(AppError::Conflict(
                "A contract already exists for the selected dates".to_string(),
            ));
        }

        data.contracts.insert(contract.id, contract.clone());
        Ok(contract.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Contract>> {
        Ok(self.data.read().await.contracts.get(&id).cloned())
    }

    async fn find_by_car(&self, car_id: Uuid) -> AppResult<Vec<Contract>> {
        let data = self.data.read().await;
        let mut contracts: Vec<Contract> = data
            .contracts
            .values()
            .filter(|c| c.car_id == car_id)
            .cloned()
            .collect();
        contracts.sort_by(|a, b| b.rental_start_date.cmp(&a.rental_start_date));
        Ok(contracts)
    }

    async fn find_starting_from(&self, from: DateTime<Utc>) -> AppResult<Vec<Contract>> {
        let data = self.data.read().await;
        let mut contracts: Vec<Contract> = data
            .contracts
            .values()
            .filter(|c| c.rental_start_date >= from)
            .cloned()
            .collect();
        contracts.sort_by(|a, b| a.rental_start_date.cmp(&b.rental_start_date));
        Ok(contracts)
    }

    async fn update_photos(&self, id: Uuid, photos: &[PhotoRef]) -> AppResult<Option<Contract>> {
        let mut data = self.data.write().await;
        Ok(data
            .contracts
            .get_mut(&id)
            .filter(|c| !c.status.is_terminal())
            .map(|c| {
                c.photos = photos.to_vec();
                c.clone()
            }))
    }

    async fn update_status(&self, id: Uuid, status: ContractStatus, photos: &[PhotoRef]) -> AppResult<Option<Contract>> {
        let mut data = self.data.write().await;
        Ok(data
            .contracts
            .get_mut(&id)
            .filter(|c| !c.status.is_terminal())
            .map(|c| {
                c.status = status;
                c.photos = photos.to_vec();
                c.clone()
            }))
    }

    async fn archive_with_return(
        &self,
        id: Uuid,
        return_mileage: i64,
        photos: &[PhotoRef],
    ) -> AppResult<Option<Contract>> {
        let mut data = self.data.write().await;

        let archived = match data.contracts.get_mut(&id) {
            Some(c) if !c.status.is_terminal() => {
                c.status = ContractStatus::Archived;
                c.return_mileage = Some(return_mileage);
                c.photos = photos.to_vec();
                c.clone()
            }
            _ => return Ok(None),
        };

        if let Some(car) = data.cars.get_mut(&archived.car_id) {
            car.mileage = car.mileage.max(return_mileage);
        }

        Ok(Some(archived))
    }

    async fn mark_pending_returns(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut data = self.data.write().await;
        let mut changed = 0;
        for contract in data.contracts.values_mut() {
            if contract_lifecycle::needs_refresh(contract, now) {
                contract.status = contract_lifecycle::observe(contract.status, contract.rental_end_date, now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.data.write().await.contracts.remove(&id).is_some())
    }
}

#[async_trait]
impl EntretienRepository for MemoryStore {
    async fn upsert(&self, entretien: &Entretien) -> AppResult<Entretien> {
        let mut data = self.data.write().await;
        let stored = match data.entretiens.get(&entretien.car_id) {
            // Se conserva la identidad y la fecha de creación del registro existente
            Some(existing) => Entretien {
                id: existing.id,
                created_at: existing.created_at,
                ..entretien.clone()
            },
            None => entretien.clone(),
        };
        data.entretiens.insert(stored.car_id, stored.clone());
        Ok(stored)
    }

    async fn find_by_car(&self, car_id: Uuid) -> AppResult<Option<Entretien>> {
        Ok(self.data.read().await.entretiens.get(&car_id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Entretien>> {
        let data = self.data.read().await;
        let mut entretiens: Vec<Entretien> = data.entretiens.values().cloned().collect();
        entretiens.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entretiens)
    }

    async fn delete_by_car(&self, car_id: Uuid) -> AppResult<bool> {
        Ok(self.data.write().await.entretiens.remove(&car_id).is_some())
    }
}
