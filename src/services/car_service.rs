//! Servicio del inventario de coches

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::car_dto::{CreateCarRequest, UpdateCarRequest};
use crate::models::car::{Car, CarView};
use crate::models::contract::Contract;
use crate::repositories::{CarRepository, ContractRepository, Repositories};
use crate::services::contract_lifecycle;
use crate::services::photo_store::PhotoStore;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub struct CarService {
    cars: Arc<dyn CarRepository>,
    contracts: Arc<dyn ContractRepository>,
    photos: Arc<dyn PhotoStore>,
}

impl CarService {
    pub fn new(repositories: &Repositories, photos: Arc<dyn PhotoStore>) -> Self {
        Self {
            cars: repositories.cars.clone(),
            contracts: repositories.contracts.clone(),
            photos,
        }
    }

    pub async fn create_car(&self, request: CreateCarRequest) -> AppResult<Car> {
        request.validate()?;

        let model = request.model.trim().to_string();
        if self.cars.model_exists(&model, None).await? {
            return Err(conflict_error("Car", "model", &model));
        }

        let car = Car::new(request.name.trim().to_string(), model, request.year, request.mileage);
        let created = self.cars.create(&car).await?;
        tracing::info!("🚗 Coche {} ({}) añadido", created.name, created.model);
        Ok(created)
    }

    pub async fn model_exists(&self, model: &str) -> AppResult<bool> {
        self.cars.model_exists(model.trim(), None).await
    }

    pub async fn list_cars(&self, now: DateTime<Utc>) -> AppResult<Vec<CarView>> {
        let cars = self.cars.find_all().await?;
        let mut views = Vec::with_capacity(cars.len());
        for car in cars {
            let contracts = self.contracts.find_by_car(car.id).await?;
            views.push(view(car, &contracts, now));
        }
        Ok(views)
    }

    pub async fn get_car(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<CarView> {
        let car = self.find(id).await?;
        let contracts = self.contracts.find_by_car(id).await?;
        Ok(view(car, &contracts, now))
    }

    pub async fn update_car(&self, id: Uuid, request: UpdateCarRequest) -> AppResult<Car> {
        request.validate()?;
        let mut car = self.find(id).await?;

        if let Some(mileage) = request.mileage {
            if mileage < car.mileage {
                return Err(AppError::Precondition(format!(
                    "Mileage cannot decrease ({} -> {})",
                    car.mileage, mileage
                )));
            }
            car.mileage = mileage;
        }

        if let Some(model) = request.model {
            let model = model.trim().to_string();
            if model != car.model && self.cars.model_exists(&model, Some(id)).await? {
                return Err(conflict_error("Car", "model", &model));
            }
            car.model = model;
        }

        if let Some(name) = request.name {
            car.name = name.trim().to_string();
        }
        if let Some(year) = request.year {
            car.year = year;
        }

        self.cars
            .update(&car)
            .await?
            .ok_or_else(|| not_found_error("Car", &id.to_string()))
    }

    /// Borra el coche con sus contratos y su entretien; las fotos se limpian
    /// sólo cuando el borrado en el store ha terminado
    pub async fn delete_car(&self, id: Uuid) -> AppResult<()> {
        let removal = self
            .cars
            .delete_with_dependents(id)
            .await?
            .ok_or_else(|| not_found_error("Car", &id.to_string()))?;

        self.photos.delete_all(&removal.photos).await;

        tracing::info!("🗑️ Coche {} eliminado ({} contrato(s))", id, removal.contracts);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Car> {
        self.cars
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Car", &id.to_string()))
    }
}

fn view(car: Car, contracts: &[Contract], now: DateTime<Utc>) -> CarView {
    let rented = contracts.iter().any(|c| contract_lifecycle::covers(c, now));
    CarView::new(car, rented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contract::ContractStatus;
    use crate::models::car::CarAvailability;
    use crate::services::photo_store::LocalPhotoStore;
    use chrono::{Duration, TimeZone};

    fn service(repositories: &Repositories) -> CarService {
        let photos: Arc<dyn PhotoStore> = Arc::new(LocalPhotoStore::new(std::env::temp_dir().join("rental-car-tests")));
        CarService::new(repositories, photos)
    }

    fn create(model: &str) -> CreateCarRequest {
        CreateCarRequest {
            name: "Clio".to_string(),
            model: model.to_string(),
            year: 2021,
            mileage: 10_000,
        }
    }

    #[tokio::test]
    async fn test_model_must_be_unique() {
        let repositories = Repositories::in_memory();
        let cars = service(&repositories);
        cars.create_car(create("AB-123-CD")).await.unwrap();

        assert!(cars.model_exists("AB-123-CD").await.unwrap());
        let result = cars.create_car(create("AB-123-CD")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_refuses_lower_mileage() {
        let repositories = Repositories::in_memory();
        let cars = service(&repositories);
        let car = cars.create_car(create("AB-123-CD")).await.unwrap();

        let lower = UpdateCarRequest {
            mileage: Some(9_000),
            ..Default::default()
        };
        assert!(matches!(cars.update_car(car.id, lower).await, Err(AppError::Precondition(_))));

        let higher = UpdateCarRequest {
            mileage: Some(12_000),
            name: Some("Clio V".to_string()),
            ..Default::default()
        };
        let updated = cars.update_car(car.id, higher).await.unwrap();
        assert_eq!(updated.mileage, 12_000);
        assert_eq!(updated.name, "Clio V");
    }

    #[tokio::test]
    async fn test_availability_is_derived_from_contracts() {
        let repositories = Repositories::in_memory();
        let cars = service(&repositories);
        let car = cars.create_car(create("AB-123-CD")).await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 12, 9, 0, 0).unwrap();

        let view = cars.get_car(car.id, now).await.unwrap();
        assert!(view.is_available);

        let contract = Contract {
            id: Uuid::new_v4(),
            car_id: car.id,
            customer_name: "Karim".to_string(),
            rental_start_date: now - Duration::days(2),
            rental_end_date: now + Duration::days(2),
            photos: Vec::new(),
            return_mileage: None,
            status: ContractStatus::Active,
            created_at: now,
        };
        repositories.contracts.create(&contract).await.unwrap();

        let view = cars.get_car(car.id, now).await.unwrap();
        assert!(!view.is_available);
        assert_eq!(view.status, CarAvailability::Rented);
    }

    #[tokio::test]
    async fn test_delete_car_cascades() {
        let repositories = Repositories::in_memory();
        let cars = service(&repositories);
        let car = cars.create_car(create("AB-123-CD")).await.unwrap();
        let now = Utc::now();

        let contract = Contract {
            id: Uuid::new_v4(),
            car_id: car.id,
            customer_name: "Karim".to_string(),
            rental_start_date: now,
            rental_end_date: now + Duration::days(3),
            photos: Vec::new(),
            return_mileage: None,
            status: ContractStatus::Active,
            created_at: now,
        };
        repositories.contracts.create(&contract).await.unwrap();

        cars.delete_car(car.id).await.unwrap();
        assert!(repositories.contracts.find_by_car(car.id).await.unwrap().is_empty());
        assert!(matches!(cars.get_car(car.id, now).await, Err(AppError::NotFound(_))));
        assert!(matches!(cars.delete_car(car.id).await, Err(AppError::NotFound(_))));
    }
}
