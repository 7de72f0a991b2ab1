//! Cálculo de vencimientos de entretien
//!
//! Funciones puras: próximo vencimiento por kilometraje o por fecha,
//! distancia/días restantes y banda de severidad para las alertas.

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::models::entretien::{Cadence, DateMaintenance, KmMaintenance};
use crate::utils::errors::DomainError;

/// Umbral "bientôt" para las tareas por kilometraje
pub const DUE_SOON_KM: i64 = 500;
/// Umbral "bientôt" para las tareas por fecha
pub const DUE_SOON_DAYS: i64 = 10;

const SECONDS_PER_DAY: i64 = 86_400;

/// Banda de severidad (el orden va de la peor a la mejor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Overdue,
    DueSoon,
    Safe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KmMaintenanceState {
    pub next_due_km: i64,
    /// Negativo => vencido por `|remaining|` km
    pub remaining: i64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateMaintenanceState {
    pub next_due_date: NaiveDate,
    pub days_until: i64,
    pub severity: Severity,
}

/// Límite superior de cualquier kilometraje o intervalo aceptado
pub const MAX_KM: i64 = 10_000_000;

pub fn next_due_distance(last_serviced_km: i64, interval_km: i64) -> Result<i64, DomainError> {
    last_serviced_km
        .checked_add(interval_km)
        .ok_or_else(|| km_out_of_range(last_serviced_km, interval_km))
}

pub fn remaining(car_mileage: i64, next_due_km: i64) -> Result<i64, DomainError> {
    next_due_km
        .checked_sub(car_mileage)
        .ok_or_else(|| km_out_of_range(next_due_km, car_mileage))
}

fn km_out_of_range(a: i64, b: i64) -> DomainError {
    DomainError::Validation(format!("Kilometer values out of range: {} / {}", a, b))
}

pub fn distance_severity(remaining: i64) -> Severity {
    if remaining <= 0 {
        Severity::Overdue
    } else if remaining <= DUE_SOON_KM {
        Severity::DueSoon
    } else {
        Severity::Safe
    }
}

/// Suma 6 meses o 1 año calendario. El día se recorta al final de mes
/// (31 de agosto + 6 meses = 28/29 de febrero).
pub fn next_due_date(last_date: NaiveDate, cadence: Cadence) -> Result<NaiveDate, DomainError> {
    last_date
        .checked_add_months(Months::new(cadence.months()))
        .ok_or_else(|| DomainError::Validation(format!("Date out of range: {}", last_date)))
}

/// `ceil((due@00:00 UTC - now) / 1 día)`
pub fn days_until(due_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    let due = due_date.and_time(chrono::NaiveTime::MIN).and_utc();
    let seconds = (due - now).num_seconds();
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    if seconds.rem_euclid(SECONDS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

pub fn date_severity(days_until: i64) -> Severity {
    if days_until <= 0 {
        Severity::Overdue
    } else if days_until <= DUE_SOON_DAYS {
        Severity::DueSoon
    } else {
        Severity::Safe
    }
}

pub fn compute_maintenance_state(task: &KmMaintenance, car_mileage: i64) -> Result<KmMaintenanceState, DomainError> {
    if task.interval_km < 0 || task.last_maintenance_km < 0 || car_mileage < 0 {
        return Err(DomainError::Validation(
            "Kilometer values must be non-negative".to_string(),
        ));
    }

    let next_due_km = next_due_distance(task.last_maintenance_km, task.interval_km)?;
    let remaining = remaining(car_mileage, next_due_km)?;

    Ok(KmMaintenanceState {
        next_due_km,
        remaining,
        severity: distance_severity(remaining),
    })
}

pub fn compute_date_maintenance_state(task: &DateMaintenance, now: DateTime<Utc>) -> Result<DateMaintenanceState, DomainError> {
    let next_due_date = next_due_date(task.date, task.intervale)?;
    let days_until = days_until(next_due_date, now);

    Ok(DateMaintenanceState {
        next_due_date,
        days_until,
        severity: date_severity(days_until),
    })
}

/// La peor severidad de un conjunto (o `Safe` si está vacío)
pub fn worst<I: IntoIterator<Item = Severity>>(severities: I) -> Severity {
    severities.into_iter().min().unwrap_or(Severity::Safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_distance_math() {
        assert_eq!(next_due_distance(10_000, 5_000).unwrap(), 15_000);
        assert_eq!(remaining(14_800, 15_000).unwrap(), 200);
        assert_eq!(distance_severity(200), Severity::DueSoon);
        assert_eq!(remaining(15_200, 15_000).unwrap(), -200);
        assert_eq!(distance_severity(-200), Severity::Overdue);
    }

    #[test]
    fn test_huge_interval_is_validation_error_not_overflow() {
        assert!(matches!(next_due_distance(10, i64::MAX), Err(DomainError::Validation(_))));
        let task = KmMaintenance {
            interval_km: i64::MAX,
            last_maintenance_km: 10,
        };
        assert!(matches!(compute_maintenance_state(&task, 10), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_distance_bands_edges() {
        assert_eq!(distance_severity(0), Severity::Overdue);
        assert_eq!(distance_severity(1), Severity::DueSoon);
        assert_eq!(distance_severity(500), Severity::DueSoon);
        assert_eq!(distance_severity(501), Severity::Safe);
    }

    #[test]
    fn test_next_due_date_cadences() {
        assert_eq!(next_due_date(date(2024, 1, 1), Cadence::SixMonths).unwrap(), date(2024, 7, 1));
        assert_eq!(next_due_date(date(2024, 1, 1), Cadence::OneYear).unwrap(), date(2025, 1, 1));
    }

    #[test]
    fn test_next_due_date_clamps_month_end() {
        assert_eq!(next_due_date(date(2024, 8, 31), Cadence::SixMonths).unwrap(), date(2025, 2, 28));
        assert_eq!(next_due_date(date(2024, 2, 29), Cadence::OneYear).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_days_until_rounds_up() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(days_until(date(2024, 1, 2), now), 1);
        assert_eq!(days_until(date(2024, 1, 11), now), 10);
        assert_eq!(days_until(date(2024, 1, 1), now), 0);
        assert_eq!(days_until(date(2023, 12, 30), now), -2);

        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(days_until(date(2024, 1, 3), midnight), 2);
    }

    #[test]
    fn test_date_bands() {
        assert_eq!(date_severity(-1), Severity::Overdue);
        assert_eq!(date_severity(0), Severity::Overdue);
        assert_eq!(date_severity(10), Severity::DueSoon);
        assert_eq!(date_severity(11), Severity::Safe);
    }

    #[test]
    fn test_maintenance_scenario_crossing_due_soon() {
        let task = KmMaintenance { interval_km: 10_000, last_maintenance_km: 12_000 };

        let state = compute_maintenance_state(&task, 20_000).unwrap();
        assert_eq!(state.next_due_km, 22_000);
        assert_eq!(state.remaining, 2_000);
        assert_eq!(state.severity, Severity::Safe);

        let state = compute_maintenance_state(&task, 21_600).unwrap();
        assert_eq!(state.remaining, 400);
        assert_eq!(state.severity, Severity::DueSoon);
    }

    #[test]
    fn test_negative_km_is_rejected() {
        let task = KmMaintenance { interval_km: -1, last_maintenance_km: 0 };
        assert!(matches!(compute_maintenance_state(&task, 0), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_date_state_from_last_date() {
        let task = DateMaintenance {
            date: date(2024, 1, 1),
            next: date(2024, 7, 1),
            intervale: Cadence::SixMonths,
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 25, 8, 0, 0).unwrap();
        let state = compute_date_maintenance_state(&task, now).unwrap();
        assert_eq!(state.next_due_date, date(2024, 7, 1));
        assert_eq!(state.days_until, 6);
        assert_eq!(state.severity, Severity::DueSoon);
    }

    #[test]
    fn test_worst_severity() {
        assert_eq!(worst([Severity::Safe, Severity::Overdue, Severity::DueSoon]), Severity::Overdue);
        assert_eq!(worst(std::iter::empty()), Severity::Safe);
    }
}
