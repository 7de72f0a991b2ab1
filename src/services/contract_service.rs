//! Servicio de contratos
//!
//! Orquesta el store, el motor de ciclo de vida y el almacén de fotos para
//! cada operación sobre contratos.

use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::contract_dto::{CreateContractRequest, PhotoUpload};
use crate::models::contract::{Contract, ContractStatus, PhotoRef, UpcomingContract, CONTRACT_PHOTO_INDEX};
use crate::repositories::{CarRepository, ContractRepository, Repositories};
use crate::services::contract_lifecycle::{self, ReturnPlan, StatusChange};
use crate::services::photo_store::PhotoStore;
use crate::utils::errors::{field_error, not_found_error, AppError, AppResult};
use crate::utils::validation::parse_timestamp;

const UNKNOWN_CAR_NAME: &str = "Inconnue";
const UNKNOWN_CAR_MODEL: &str = "N/A";

pub struct ContractService {
    contracts: Arc<dyn ContractRepository>,
    cars: Arc<dyn CarRepository>,
    photos: Arc<dyn PhotoStore>,
}

impl ContractService {
    pub fn new(repositories: &Repositories, photos: Arc<dyn PhotoStore>) -> Self {
        Self {
            contracts: repositories.contracts.clone(),
            cars: repositories.cars.clone(),
            photos,
        }
    }

    pub async fn create_contract(&self, request: CreateContractRequest, now: DateTime<Utc>) -> AppResult<Contract> {
        request.validate()?;

        let start = parse_timestamp(&request.rental_start_date)
            .map_err(|e| field_error("rental_start_date", e))?;
        let end = parse_timestamp(&request.rental_end_date)
            .map_err(|e| field_error("rental_end_date", e))?;
        contract_lifecycle::validate_window(start, end)?;

        if self.cars.find_by_id(request.car_id).await?.is_none() {
            return Err(not_found_error("Car", &request.car_id.to_string()));
        }

        let existing = self.contracts.find_by_car(request.car_id).await?;
        contract_lifecycle::check_booking(&existing, start, end)?;

        let photos = self.save_uploads(&request.photos).await?;

        let contract = Contract {
            id: Uuid::new_v4(),
            car_id: request.car_id,
            customer_name: request.customer_name.trim().to_string(),
            rental_start_date: start,
            rental_end_date: end,
            photos,
            return_mileage: None,
            status: contract_lifecycle::initial_status(end, now),
            created_at: now,
        };

        match self.contracts.create(&contract).await {
            Ok(created) => {
                tracing::info!(
                    "📝 Contrato {} creado para el coche {} ({})",
                    created.id,
                    created.car_id,
                    created.status
                );
                Ok(created)
            }
            Err(e) => {
                // La reserva no se guardó: las fotos quedarían huérfanas
                self.photos.delete_all(&contract.photos).await;
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Contract> {
        self.contracts
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Contract", &id.to_string()))
    }

    pub async fn list_for_car(&self, car_id: Uuid) -> AppResult<Vec<Contract>> {
        self.contracts.find_by_car(car_id).await
    }

    /// Contratos que empiezan hoy (00:00 UTC) o después, con los datos del coche
    pub async fn upcoming(&self, now: DateTime<Utc>) -> AppResult<Vec<UpcomingContract>> {
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let contracts = self.contracts.find_starting_from(today).await?;

        let mut upcoming = Vec::with_capacity(contracts.len());
        for contract in contracts {
            let (car_name, car_model) = match self.cars.find_by_id(contract.car_id).await? {
                Some(car) => (car.name, car.model),
                None => (UNKNOWN_CAR_NAME.to_string(), UNKNOWN_CAR_MODEL.to_string()),
            };
            upcoming.push(UpcomingContract {
                contract,
                car_name,
                car_model,
            });
        }
        Ok(upcoming)
    }

    /// Contrato en curso del coche: el más reciente no archivado cuyo fin no ha pasado
    pub async fn active_contract(&self, car_id: Uuid, now: DateTime<Utc>) -> AppResult<Contract> {
        if self.cars.find_by_id(car_id).await?.is_none() {
            return Err(not_found_error("Car", &car_id.to_string()));
        }

        self.contracts
            .find_by_car(car_id)
            .await?
            .into_iter()
            .find(|c| !c.status.is_terminal() && c.rental_end_date >= now)
            .ok_or_else(|| AppError::NotFound(format!("No active contract for car '{}'", car_id)))
    }

    pub async fn record_return(&self, contract_id: Uuid, return_mileage: i64) -> AppResult<Contract> {
        let contract = self.get(contract_id).await?;
        let car_mileage = self
            .cars
            .get_mileage(contract.car_id)
            .await?
            .ok_or_else(|| not_found_error("Car", &contract.car_id.to_string()))?;

        let (return_mileage, photos) = match contract_lifecycle::plan_return(&contract, car_mileage, return_mileage)? {
            ReturnPlan::AlreadyArchived => return Ok(contract),
            ReturnPlan::Archive {
                return_mileage,
                photos,
                ..
            } => (return_mileage, photos),
        };

        match self
            .contracts
            .archive_with_return(contract_id, return_mileage, &photos.kept)
            .await?
        {
            Some(archived) => {
                self.photos.delete_all(&photos.discarded).await;
                tracing::info!(
                    "🏁 Retour del contrato {}: {} km, coche {}",
                    archived.id,
                    return_mileage,
                    archived.car_id
                );
                Ok(archived)
            }
            // Otro retour ganó la carrera: devolver el registro ya archivado
            None => self.get(contract_id).await,
        }
    }

    pub async fn refresh_statuses(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let updated = self.contracts.mark_pending_returns(now).await?;
        if updated > 0 {
            tracing::info!("🔄 {} contrato(s) pasan a pending_return", updated);
        }
        Ok(updated)
    }

    pub async fn set_status(&self, contract_id: Uuid, status: &str) -> AppResult<Contract> {
        let target: ContractStatus = status.parse()?;
        let contract = self.get(contract_id).await?;

        let (status, photos) = match contract_lifecycle::plan_status_override(&contract, target) {
            StatusChange::Unchanged => return Ok(contract),
            StatusChange::Apply { status, photos } => (status, photos),
        };

        match self.contracts.update_status(contract_id, status, &photos.kept).await? {
            Some(updated) => {
                self.photos.delete_all(&photos.discarded).await;
                tracing::info!("✏️ Contrato {}: {} -> {}", contract_id, contract.status, status);
                Ok(updated)
            }
            None => self.get(contract_id).await,
        }
    }

    pub async fn add_photos(&self, contract_id: Uuid, uploads: &[PhotoUpload], now: DateTime<Utc>) -> AppResult<Contract> {
        if uploads.is_empty() {
            return Err(AppError::InvalidInput("No photos provided".to_string()));
        }

        let contract = self.get(contract_id).await?;
        contract_lifecycle::ensure_accepts_new_photos(&contract, now)?;

        let saved = self.save_uploads(uploads).await?;
        let mut photos = contract.photos.clone();
        photos.extend(saved.iter().cloned());

        self.apply_photos(&contract, photos, &saved).await
    }

    /// Reemplaza la foto del documento de contrato (o la añade si no hay fotos)
    pub async fn replace_contract_photo(&self, contract_id: Uuid, upload: &PhotoUpload) -> AppResult<Contract> {
        let contract = self.get(contract_id).await?;
        contract_lifecycle::ensure_photos_editable(&contract)?;

        let saved = self.photos.save(upload).await?;
        let mut photos = contract.photos.clone();
        let previous = if photos.is_empty() {
            photos.push(saved.clone());
            None
        } else {
            Some(std::mem::replace(&mut photos[CONTRACT_PHOTO_INDEX], saved.clone()))
        };

        let updated = self.apply_photos(&contract, photos, &[saved]).await?;
        if let Some(previous) = previous {
            self.photos.delete_all(&[previous]).await;
        }
        Ok(updated)
    }

    pub async fn remove_photo(&self, contract_id: Uuid, photo: &str) -> AppResult<Contract> {
        let contract = self.get(contract_id).await?;
        contract_lifecycle::ensure_photos_editable(&contract)?;

        if !contract.photos.iter().any(|p| p == photo) {
            return Err(AppError::NotFound(format!(
                "Photo '{}' is not attached to contract '{}'",
                photo, contract_id
            )));
        }

        let photos: Vec<PhotoRef> = contract.photos.iter().filter(|p| *p != photo).cloned().collect();
        let updated = self.apply_photos(&contract, photos, &[]).await?;
        self.photos.delete(photo).await?;
        Ok(updated)
    }

    pub async fn delete(&self, contract_id: Uuid) -> AppResult<()> {
        let contract = self.get(contract_id).await?;
        if !self.contracts.delete(contract_id).await? {
            return Err(not_found_error("Contract", &contract_id.to_string()));
        }
        self.photos.delete_all(&contract.photos).await;
        tracing::info!("🗑️ Contrato {} eliminado", contract_id);
        Ok(())
    }

    async fn save_uploads(&self, uploads: &[PhotoUpload]) -> AppResult<Vec<PhotoRef>> {
        let mut saved = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.photos.save(upload).await {
                Ok(photo) => saved.push(photo),
                Err(e) => {
                    self.photos.delete_all(&saved).await;
                    return Err(e);
                }
            }
        }
        Ok(saved)
    }

    // Guarda la nueva lista de fotos; si el contrato se archivó entretanto,
    // descarta los ficheros recién subidos
    async fn apply_photos(&self, contract: &Contract, photos: Vec<PhotoRef>, fresh: &[PhotoRef]) -> AppResult<Contract> {
        match self.contracts.update_photos(contract.id, &photos).await? {
            Some(updated) => Ok(updated),
            None => {
                self.photos.delete_all(fresh).await;
                Err(AppError::Precondition("Archived contracts are immutable".to_string()))
            }
        }
    }
}
