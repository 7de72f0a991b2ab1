//! Servicio de entretien
//!
//! Registro de mantenimiento por coche y vista de alertas calculada con
//! `maintenance_calculator`.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::entretien_dto::{
    DateTaskInput, DateTaskSummary, EntretienSummary, KmTaskInput, KmTaskSummary, RecordServiceRequest,
    UpsertEntretienRequest,
};
use crate::models::car::Car;
use crate::models::entretien::{Cadence, DateMaintenance, DateTask, Entretien, KmMaintenance, KmTask, MaintenanceTask};
use crate::repositories::{CarRepository, EntretienRepository, Repositories};
use crate::services::maintenance_calculator::{self as calculator, Severity};
use crate::utils::errors::{field_error, not_found_error, AppError, AppResult};
use crate::utils::validation::parse_date;

pub struct EntretienService {
    entretiens: Arc<dyn EntretienRepository>,
    cars: Arc<dyn CarRepository>,
}

impl EntretienService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            entretiens: repositories.entretiens.clone(),
            cars: repositories.cars.clone(),
        }
    }

    pub async fn upsert(&self, request: UpsertEntretienRequest, now: DateTime<Utc>) -> AppResult<Entretien> {
        request.validate()?;
        let car = self.find_car(request.car_id).await?;
        let today = now.date_naive();

        let existing = self.entretiens.find_by_car(car.id).await?;
        let entretien = Entretien {
            id: existing.as_ref().map(|e| e.id).unwrap_or_else(Uuid::new_v4),
            car_id: car.id,
            vidange: km_task(&request.vidange, car.mileage),
            bougie: km_task(&request.bougie, car.mileage),
            filtre_huile: km_task(&request.filtre_huile, car.mileage),
            filtre_air: km_task(&request.filtre_air, car.mileage),
            autre_entretien: request.autre_entretien,
            visite_technique: date_task("visite_technique", &request.visite_technique, today)?,
            assurance: date_task("assurance", &request.assurance, today)?,
            created_at: existing.as_ref().map(|e| e.created_at).unwrap_or(now),
            updated_at: now,
        };

        let saved = self.entretiens.upsert(&entretien).await?;
        tracing::info!("🔧 Entretien guardado para el coche {}", car.id);
        Ok(saved)
    }

    pub async fn get(&self, car_id: Uuid) -> AppResult<Entretien> {
        self.entretiens
            .find_by_car(car_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No maintenance record for car '{}'", car_id)))
    }

    /// Registrar un servicio hecho hoy para una tarea
    pub async fn record_service(&self, car_id: Uuid, request: RecordServiceRequest, now: DateTime<Utc>) -> AppResult<Entretien> {
        request.validate()?;
        let task: MaintenanceTask = request.task.parse()?;
        let mut entretien = self.get(car_id).await?;

        match task {
            MaintenanceTask::Km(task) => {
                let last_km = match request.last_mileage {
                    Some(km) => km,
                    None => self.find_car(car_id).await?.mileage,
                };
                entretien.km_task_mut(task).last_maintenance_km = last_km;
                tracing::info!("🔧 {} hecho a {} km (coche {})", task.as_str(), last_km, car_id);
            }
            MaintenanceTask::Date(task) => {
                let today = now.date_naive();
                let slot = entretien.date_task_mut(task);
                slot.date = today;
                slot.next = calculator::next_due_date(today, slot.intervale)?;
                tracing::info!("🔧 {} renovado, próximo {} (coche {})", task.as_str(), slot.next, car_id);
            }
        }

        entretien.updated_at = now;
        self.entretiens.upsert(&entretien).await
    }

    pub async fn set_notes(&self, car_id: Uuid, notes: String, now: DateTime<Utc>) -> AppResult<Entretien> {
        let mut entretien = self.get(car_id).await?;
        entretien.autre_entretien = notes;
        entretien.updated_at = now;
        self.entretiens.upsert(&entretien).await
    }

    pub async fn delete(&self, car_id: Uuid) -> AppResult<()> {
        if !self.entretiens.delete_by_car(car_id).await? {
            return Err(AppError::NotFound(format!("No maintenance record for car '{}'", car_id)));
        }
        Ok(())
    }

    /// Vista de alertas de todos los coches con entretien
    pub async fn summaries(&self, now: DateTime<Utc>) -> AppResult<Vec<EntretienSummary>> {
        let entretiens = self.entretiens.find_all().await?;
        let mut summaries = Vec::with_capacity(entretiens.len());

        for entretien in entretiens {
            let Some(car) = self.cars.find_by_id(entretien.car_id).await? else {
                tracing::warn!("⚠️ Entretien {} sin coche asociado", entretien.id);
                continue;
            };
            summaries.push(summarize(car, entretien, now)?);
        }

        Ok(summaries)
    }

    async fn find_car(&self, car_id: Uuid) -> AppResult<Car> {
        self.cars
            .find_by_id(car_id)
            .await?
            .ok_or_else(|| not_found_error("Car", &car_id.to_string()))
    }
}

fn km_task(input: &KmTaskInput, car_mileage: i64) -> KmMaintenance {
    KmMaintenance {
        interval_km: input.interval,
        last_maintenance_km: input.last_maintenance_km.unwrap_or(car_mileage),
    }
}

fn date_task(field: &'static str, input: &DateTaskInput, today: NaiveDate) -> AppResult<DateMaintenance> {
    let date = match input.date.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(raw) => parse_date(raw).map_err(|e| field_error(field, e))?,
        None => today,
    };
    let intervale = match input.intervale.as_deref() {
        Some(raw) => raw.parse::<Cadence>()?,
        None => Cadence::default(),
    };

    Ok(DateMaintenance {
        date,
        next: calculator::next_due_date(date, intervale)?,
        intervale,
    })
}

/// Estado de todas las tareas de un coche
pub fn summarize(car: Car, entretien: Entretien, now: DateTime<Utc>) -> AppResult<EntretienSummary> {
    let mut km_tasks = Vec::with_capacity(KmTask::ALL.len());
    for task in KmTask::ALL {
        let maintenance = entretien.km_task(task);
        km_tasks.push(KmTaskSummary {
            task,
            interval_km: maintenance.interval_km,
            last_maintenance_km: maintenance.last_maintenance_km,
            state: calculator::compute_maintenance_state(maintenance, car.mileage)?,
        });
    }

    let mut date_tasks = Vec::with_capacity(DateTask::ALL.len());
    for task in DateTask::ALL {
        let maintenance = entretien.date_task(task);
        date_tasks.push(DateTaskSummary {
            task,
            date: maintenance.date,
            intervale: maintenance.intervale,
            state: calculator::compute_date_maintenance_state(maintenance, now)?,
        });
    }

    let worst: Severity = calculator::worst(
        km_tasks
            .iter()
            .map(|t| t.state.severity)
            .chain(date_tasks.iter().map(|t| t.state.severity)),
    );

    Ok(EntretienSummary {
        car,
        km_tasks,
        date_tasks,
        autre_entretien: entretien.autre_entretien,
        worst,
    })
}
