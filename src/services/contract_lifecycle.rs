//! Motor del ciclo de vida de contratos
//!
//! Lógica pura (sin I/O, sin logs) sobre el estado de un contrato:
//!
//! ```text
//! active ──(fin < ahora)──> pending_return ──(retour)──> archived
//!    └───────────────(retour anticipado / override)────────┘
//! ```
//!
//! `archived` es terminal: cualquier transición sobre él es un no-op.
//! Los servicios llaman a estas funciones y aplican el resultado en el store.

use chrono::{DateTime, Utc};

use crate::models::contract::{Contract, ContractStatus, PhotoRef, CONTRACT_PHOTO_INDEX};
use crate::utils::errors::DomainError;

/// Estado inicial al crear: `pending_return` si el fin ya pasó
pub fn initial_status(rental_end: DateTime<Utc>, now: DateTime<Utc>) -> ContractStatus {
    if rental_end < now {
        ContractStatus::PendingReturn
    } else {
        ContractStatus::Active
    }
}

/// Estado tras observar el reloj (pasada de refresco)
pub fn observe(status: ContractStatus, rental_end: DateTime<Utc>, now: DateTime<Utc>) -> ContractStatus {
    match status {
        ContractStatus::Active if rental_end < now => ContractStatus::PendingReturn,
        other => other,
    }
}

/// `true` si la pasada de refresco cambiaría este contrato
pub fn needs_refresh(contract: &Contract, now: DateTime<Utc>) -> bool {
    observe(contract.status, contract.rental_end_date, now) != contract.status
}

/// Validar la ventana de alquiler (`start < end`)
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), DomainError> {
    if start >= end {
        return Err(DomainError::Validation(
            "Start date must be before end date".to_string(),
        ));
    }
    Ok(())
}

/// Solapamiento de intervalos semiabiertos `[start, end)`.
/// Tocarse en un extremo no cuenta como solapamiento.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Primer contrato existente que solapa con `[start, end)`
pub fn find_overlap<'a, I>(existing: I, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<&'a Contract>
where
    I: IntoIterator<Item = &'a Contract>,
{
    existing
        .into_iter()
        .find(|c| overlaps(c.rental_start_date, c.rental_end_date, start, end))
}

/// `true` si `[start, end)` está libre respecto a los contratos del coche
pub fn can_book<'a, I>(existing: I, start: DateTime<Utc>, end: DateTime<Utc>) -> bool
where
    I: IntoIterator<Item = &'a Contract>,
{
    find_overlap(existing, start, end).is_none()
}

/// Validación completa de una nueva reserva: ventana y disponibilidad
pub fn check_booking<'a, I>(existing: I, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), DomainError>
where
    I: IntoIterator<Item = &'a Contract>,
{
    validate_window(start, end)?;
    if let Some(conflict) = find_overlap(existing, start, end) {
        return Err(DomainError::Conflict(format!(
            "A contract already exists for the selected dates ({} -> {})",
            conflict.rental_start_date.to_rfc3339(),
            conflict.rental_end_date.to_rfc3339()
        )));
    }
    Ok(())
}

/// `true` si el contrato ocupa el coche en el instante `now`
pub fn covers(contract: &Contract, now: DateTime<Utc>) -> bool {
    contract.status != ContractStatus::Archived
        && contract.rental_start_date <= now
        && now < contract.rental_end_date
}

/// Resultado de podar las fotos de un contrato archivado
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhotoPruning {
    pub kept: Vec<PhotoRef>,
    pub discarded: Vec<PhotoRef>,
}

/// Conservar únicamente la foto del documento de contrato
pub fn prune_photos(photos: &[PhotoRef]) -> PhotoPruning {
    let mut pruning = PhotoPruning::default();
    for (index, photo) in photos.iter().enumerate() {
        if index == CONTRACT_PHOTO_INDEX {
            pruning.kept.push(photo.clone());
        } else {
            pruning.discarded.push(photo.clone());
        }
    }
    pruning
}

/// Plan de registro de retour
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnPlan {
    /// Contrato ya archivado con un retour compatible: nada que hacer
    AlreadyArchived,
    Archive {
        return_mileage: i64,
        new_car_mileage: i64,
        photos: PhotoPruning,
    },
}

/// Planificar el registro del kilometraje de retour.
///
/// Un kilometraje igual al actual del coche se acepta.
pub fn plan_return(contract: &Contract, car_mileage: i64, return_mileage: i64) -> Result<ReturnPlan, DomainError> {
    if return_mileage <= 0 {
        return Err(DomainError::Validation(
            "Return mileage must be a positive number".to_string(),
        ));
    }

    if contract.status.is_terminal() {
        let recorded = contract.return_mileage.unwrap_or(0);
        if return_mileage >= recorded {
            return Ok(ReturnPlan::AlreadyArchived);
        }
        return Err(DomainError::Precondition(format!(
            "Contract is archived with return mileage {}; {} would move the odometer backward",
            recorded, return_mileage
        )));
    }

    if return_mileage < car_mileage {
        return Err(DomainError::Precondition(format!(
            "Return mileage {} is lower than the car's current mileage {}",
            return_mileage, car_mileage
        )));
    }

    Ok(ReturnPlan::Archive {
        return_mileage,
        new_car_mileage: car_mileage.max(return_mileage),
        photos: prune_photos(&contract.photos),
    })
}

/// Plan de cambio manual de estado
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    Apply {
        status: ContractStatus,
        photos: PhotoPruning,
    },
}

/// Planificar un override manual de estado. Un contrato archivado no cambia.
pub fn plan_status_override(contract: &Contract, target: ContractStatus) -> StatusChange {
    if contract.status.is_terminal() || contract.status == target {
        return StatusChange::Unchanged;
    }

    let photos = if target == ContractStatus::Archived {
        prune_photos(&contract.photos)
    } else {
        PhotoPruning {
            kept: contract.photos.clone(),
            discarded: Vec::new(),
        }
    };

    StatusChange::Apply { status: target, photos }
}

/// Las fotos sólo se pueden modificar en contratos no archivados
pub fn ensure_photos_editable(contract: &Contract) -> Result<(), DomainError> {
    if contract.status.is_terminal() {
        return Err(DomainError::Precondition(
            "Archived contracts are immutable".to_string(),
        ));
    }
    Ok(())
}

/// Sólo los contratos activos aceptan nuevas fotos del vehículo. Se mira el
/// estado observado en `now`: un contrato vencido que la pasada de refresco
/// aún no tocó ya no está activo.
pub fn ensure_accepts_new_photos(contract: &Contract, now: DateTime<Utc>) -> Result<(), DomainError> {
    if observe(contract.status, contract.rental_end_date, now) != ContractStatus::Active {
        return Err(DomainError::Precondition(
            "Only active contracts can add photos".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn contract(start: u32, end: u32, status: ContractStatus) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            car_id: Uuid::nil(),
            customer_name: "Client".to_string(),
            rental_start_date: at(start),
            rental_end_date: at(end),
            photos: vec![
                "/uploads/contrat.jpg".to_string(),
                "/uploads/avant.jpg".to_string(),
                "/uploads/arriere.jpg".to_string(),
            ],
            return_mileage: None,
            status,
            created_at: at(1),
        }
    }

    #[test]
    fn test_initial_status_depends_on_end_date() {
        assert_eq!(initial_status(at(10), at(5)), ContractStatus::Active);
        assert_eq!(initial_status(at(10), at(11)), ContractStatus::PendingReturn);
        // fin == ahora todavía no ha pasado
        assert_eq!(initial_status(at(10), at(10)), ContractStatus::Active);
    }

    #[test]
    fn test_observe_only_moves_active_contracts() {
        assert_eq!(observe(ContractStatus::Active, at(10), at(11)), ContractStatus::PendingReturn);
        assert_eq!(observe(ContractStatus::Active, at(10), at(9)), ContractStatus::Active);
        assert_eq!(observe(ContractStatus::Archived, at(10), at(11)), ContractStatus::Archived);
        assert_eq!(
            observe(ContractStatus::PendingReturn, at(10), at(11)),
            ContractStatus::PendingReturn
        );
    }

    #[test]
    fn test_observe_is_idempotent() {
        let once = observe(ContractStatus::Active, at(10), at(12));
        assert_eq!(observe(once, at(10), at(12)), once);
    }

    #[test]
    fn test_touching_windows_do_not_overlap() {
        let existing = [contract(10, 15, ContractStatus::Active)];
        assert!(can_book(&existing, at(15), at(20)));
        assert!(can_book(&existing, at(5), at(10)));
    }

    #[test]
    fn test_nested_window_overlaps() {
        let existing = [contract(10, 20, ContractStatus::Active)];
        assert!(!can_book(&existing, at(15), at(18)));
        assert!(matches!(
            check_booking(&existing, at(15), at(18)),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn test_archived_contracts_still_block_their_window() {
        let existing = [contract(10, 20, ContractStatus::Archived)];
        assert!(!can_book(&existing, at(12), at(14)));
    }

    #[test]
    fn test_invalid_window_is_validation_error() {
        assert!(matches!(validate_window(at(10), at(10)), Err(DomainError::Validation(_))));
        assert!(matches!(
            check_booking(std::iter::empty(), at(12), at(10)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_prune_keeps_contract_document_only() {
        let c = contract(1, 2, ContractStatus::Active);
        let pruning = prune_photos(&c.photos);
        assert_eq!(pruning.kept, vec!["/uploads/contrat.jpg".to_string()]);
        assert_eq!(pruning.discarded.len(), 2);
        assert_eq!(prune_photos(&[]), PhotoPruning::default());
    }

    #[test]
    fn test_plan_return_below_odometer_fails() {
        let c = contract(1, 5, ContractStatus::PendingReturn);
        assert!(matches!(plan_return(&c, 20_000, 19_999), Err(DomainError::Precondition(_))));
    }

    #[test]
    fn test_plan_return_rejects_non_positive() {
        let c = contract(1, 5, ContractStatus::PendingReturn);
        assert!(matches!(plan_return(&c, 0, 0), Err(DomainError::Validation(_))));
        assert!(matches!(plan_return(&c, 0, -3), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_plan_return_archives_and_prunes() {
        let c = contract(1, 5, ContractStatus::PendingReturn);
        let plan = plan_return(&c, 20_000, 20_000).unwrap();
        match plan {
            ReturnPlan::Archive { return_mileage, new_car_mileage, photos } => {
                assert_eq!(return_mileage, 20_000);
                assert_eq!(new_car_mileage, 20_000);
                assert_eq!(photos.kept, vec!["/uploads/contrat.jpg".to_string()]);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_plan_return_on_archived_is_idempotent() {
        let mut c = contract(1, 5, ContractStatus::Archived);
        c.return_mileage = Some(21_000);
        assert_eq!(plan_return(&c, 30_000, 21_000).unwrap(), ReturnPlan::AlreadyArchived);
        assert_eq!(plan_return(&c, 30_000, 22_000).unwrap(), ReturnPlan::AlreadyArchived);
        assert!(matches!(plan_return(&c, 30_000, 20_000), Err(DomainError::Precondition(_))));
    }

    #[test]
    fn test_status_override_on_archived_is_noop() {
        let c = contract(1, 5, ContractStatus::Archived);
        assert_eq!(plan_status_override(&c, ContractStatus::Active), StatusChange::Unchanged);
    }

    #[test]
    fn test_status_override_to_archived_prunes() {
        let c = contract(1, 5, ContractStatus::Active);
        match plan_status_override(&c, ContractStatus::Archived) {
            StatusChange::Apply { status, photos } => {
                assert_eq!(status, ContractStatus::Archived);
                assert_eq!(photos.kept.len(), 1);
                assert_eq!(photos.discarded.len(), 2);
            }
            StatusChange::Unchanged => panic!("expected a change"),
        }
    }

    #[test]
    fn test_covers_uses_half_open_window() {
        let c = contract(10, 15, ContractStatus::Active);
        assert!(covers(&c, at(10)));
        assert!(!covers(&c, at(15)));
        let archived = contract(10, 15, ContractStatus::Archived);
        assert!(!covers(&archived, at(12)));
    }

    #[test]
    fn test_photo_guards() {
        let pending = contract(1, 5, ContractStatus::PendingReturn);
        assert!(ensure_photos_editable(&pending).is_ok());
        assert!(ensure_accepts_new_photos(&pending, at(2)).is_err());
        let archived = contract(1, 5, ContractStatus::Archived);
        assert!(ensure_photos_editable(&archived).is_err());
    }

    #[test]
    fn test_expired_active_contract_refuses_new_photos_before_any_sweep() {
        let stale = contract(10, 15, ContractStatus::Active);
        assert!(ensure_accepts_new_photos(&stale, at(12)).is_ok());
        assert!(matches!(
            ensure_accepts_new_photos(&stale, at(20)),
            Err(DomainError::Precondition(_))
        ));
    }
}
