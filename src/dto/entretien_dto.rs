use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::car::Car;
use crate::models::entretien::{Cadence, DateTask, KmTask};
use crate::services::maintenance_calculator::{DateMaintenanceState, KmMaintenanceState, Severity};

/// Tarea por kilometraje tal como llega del formulario
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct KmTaskInput {
    #[validate(range(min = 0, max = 10000000))]
    pub interval: i64,

    /// Por defecto el kilometraje actual del coche
    #[validate(range(min = 0, max = 10000000))]
    pub last_maintenance_km: Option<i64>,
}

/// Tarea por fecha: `date` en `YYYY-MM-DD`, `intervale` en `6mois` / `1an`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateTaskInput {
    pub date: Option<String>,
    pub intervale: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertEntretienRequest {
    pub car_id: Uuid,

    #[validate]
    pub vidange: KmTaskInput,
    #[validate]
    pub bougie: KmTaskInput,
    #[validate]
    pub filtre_huile: KmTaskInput,
    #[validate]
    pub filtre_air: KmTaskInput,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub autre_entretien: String,

    #[serde(default)]
    pub visite_technique: DateTaskInput,
    #[serde(default)]
    pub assurance: DateTaskInput,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordServiceRequest {
    /// Nombre de la tarea (`vidange`, `filtreHuile`, `assurance`...)
    pub task: String,

    #[validate(range(min = 0, max = 10000000))]
    pub last_mileage: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NotesRequest {
    #[validate(length(max = 2000))]
    pub autre_entretien: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KmTaskSummary {
    pub task: KmTask,
    pub interval_km: i64,
    pub last_maintenance_km: i64,
    #[serde(flatten)]
    pub state: KmMaintenanceState,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateTaskSummary {
    pub task: DateTask,
    pub date: NaiveDate,
    pub intervale: Cadence,
    #[serde(flatten)]
    pub state: DateMaintenanceState,
}

/// Vista de alertas de un coche
#[derive(Debug, Clone, Serialize)]
pub struct EntretienSummary {
    pub car: Car,
    pub km_tasks: Vec<KmTaskSummary>,
    pub date_tasks: Vec<DateTaskSummary>,
    pub autre_entretien: String,
    pub worst: Severity,
}
