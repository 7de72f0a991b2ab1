//! Modelo de Entretien
//!
//! Registro de mantenimiento por coche: tareas por kilometraje
//! (vidange, bougie, filtre huile, filtre air) y tareas por fecha
//! (visite technique, assurance).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::errors::DomainError;

/// Tareas basadas en distancia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KmTask {
    Vidange,
    Bougie,
    FiltreHuile,
    FiltreAir,
}

impl KmTask {
    pub const ALL: [KmTask; 4] = [
        KmTask::Vidange,
        KmTask::Bougie,
        KmTask::FiltreHuile,
        KmTask::FiltreAir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KmTask::Vidange => "vidange",
            KmTask::Bougie => "bougie",
            KmTask::FiltreHuile => "filtre_huile",
            KmTask::FiltreAir => "filtre_air",
        }
    }
}

/// Tareas basadas en fecha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTask {
    VisiteTechnique,
    Assurance,
}

impl DateTask {
    pub const ALL: [DateTask; 2] = [DateTask::VisiteTechnique, DateTask::Assurance];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateTask::VisiteTechnique => "visite_technique",
            DateTask::Assurance => "assurance",
        }
    }
}

/// Cualquier tarea de mantenimiento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceTask {
    Km(KmTask),
    Date(DateTask),
}

impl FromStr for MaintenanceTask {
    type Err = DomainError;

    /// Acepta snake_case y los nombres camelCase de los formularios
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "vidange" => Ok(MaintenanceTask::Km(KmTask::Vidange)),
            "bougie" => Ok(MaintenanceTask::Km(KmTask::Bougie)),
            "filtre_huile" | "filtreHuile" => Ok(MaintenanceTask::Km(KmTask::FiltreHuile)),
            "filtre_air" | "filtreAir" => Ok(MaintenanceTask::Km(KmTask::FiltreAir)),
            "visite_technique" | "visiteTechnique" => {
                Ok(MaintenanceTask::Date(DateTask::VisiteTechnique))
            }
            "assurance" => Ok(MaintenanceTask::Date(DateTask::Assurance)),
            other => Err(DomainError::Validation(format!(
                "Unknown maintenance task '{}'",
                other
            ))),
        }
    }
}

/// Cadencia de renovación de las tareas por fecha
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    #[serde(rename = "6mois")]
    SixMonths,
    #[default]
    #[serde(rename = "1an")]
    OneYear,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::SixMonths => "6mois",
            Cadence::OneYear => "1an",
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            Cadence::SixMonths => 6,
            Cadence::OneYear => 12,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cadence {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "6mois" => Ok(Cadence::SixMonths),
            "1an" => Ok(Cadence::OneYear),
            other => Err(DomainError::Validation(format!(
                "Unknown cadence '{}' (expected 6mois or 1an)",
                other
            ))),
        }
    }
}

/// Tarea por kilometraje: intervalo y último kilometraje de servicio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmMaintenance {
    pub interval_km: i64,
    pub last_maintenance_km: i64,
}

/// Tarea por fecha: última fecha, cadencia y próxima fecha calculada
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateMaintenance {
    pub date: NaiveDate,
    pub next: NaiveDate,
    pub intervale: Cadence,
}

/// Registro de entretien (uno por coche)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entretien {
    pub id: Uuid,
    pub car_id: Uuid,
    pub vidange: KmMaintenance,
    pub bougie: KmMaintenance,
    pub filtre_huile: KmMaintenance,
    pub filtre_air: KmMaintenance,
    pub autre_entretien: String,
    pub visite_technique: DateMaintenance,
    pub assurance: DateMaintenance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entretien {
    pub fn km_task(&self, task: KmTask) -> &KmMaintenance {
        match task {
            KmTask::Vidange => &self.vidange,
            KmTask::Bougie => &self.bougie,
            KmTask::FiltreHuile => &self.filtre_huile,
            KmTask::FiltreAir => &self.filtre_air,
        }
    }

    pub fn km_task_mut(&mut self, task: KmTask) -> &mut KmMaintenance {
        match task {
            KmTask::Vidange => &mut self.vidange,
            KmTask::Bougie => &mut self.bougie,
            KmTask::FiltreHuile => &mut self.filtre_huile,
            KmTask::FiltreAir => &mut self.filtre_air,
        }
    }

    pub fn date_task(&self, task: DateTask) -> &DateMaintenance {
        match task {
            DateTask::VisiteTechnique => &self.visite_technique,
            DateTask::Assurance => &self.assurance,
        }
    }

    pub fn date_task_mut(&mut self, task: DateTask) -> &mut DateMaintenance {
        match task {
            DateTask::VisiteTechnique => &mut self.visite_technique,
            DateTask::Assurance => &mut self.assurance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_names_accept_form_spelling() {
        assert_eq!(
            "filtreHuile".parse::<MaintenanceTask>().unwrap(),
            MaintenanceTask::Km(KmTask::FiltreHuile)
        );
        assert_eq!(
            "visite_technique".parse::<MaintenanceTask>().unwrap(),
            MaintenanceTask::Date(DateTask::VisiteTechnique)
        );
        assert!("pneus".parse::<MaintenanceTask>().is_err());
    }

    #[test]
    fn test_cadence_serde_uses_french_labels() {
        assert_eq!(serde_json::to_string(&Cadence::SixMonths).unwrap(), "\"6mois\"");
        let parsed: Cadence = serde_json::from_str("\"1an\"").unwrap();
        assert_eq!(parsed, Cadence::OneYear);
        assert!("2ans".parse::<Cadence>().is_err());
    }
}
