use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::EntretienRepository;
use crate::models::entretien::{Cadence, DateMaintenance, Entretien, KmMaintenance};
use crate::utils::errors::{AppError, AppResult};

// Las tareas se guardan aplanadas en columnas
#[derive(Debug, sqlx::FromRow)]
struct EntretienRow {
    id: Uuid,
    car_id: Uuid,
    vidange_interval_km: i64,
    vidange_last_km: i64,
    bougie_interval_km: i64,
    bougie_last_km: i64,
    filtre_huile_interval_km: i64,
    filtre_huile_last_km: i64,
    filtre_air_interval_km: i64,
    filtre_air_last_km: i64,
    autre_entretien: String,
    visite_technique_date: NaiveDate,
    visite_technique_next: NaiveDate,
    visite_technique_intervale: String,
    assurance_date: NaiveDate,
    assurance_next: NaiveDate,
    assurance_intervale: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_cadence(raw: &str, id: Uuid) -> AppResult<Cadence> {
    raw.parse::<Cadence>()
        .map_err(|e| AppError::Internal(format!("Corrupted entretien {}: {}", id, e)))
}

impl TryFrom<EntretienRow> for Entretien {
    type Error = AppError;

    fn try_from(row: EntretienRow) -> Result<Self, Self::Error> {
        Ok(Entretien {
            id: row.id,
            car_id: row.car_id,
            vidange: KmMaintenance {
                interval_km: row.vidange_interval_km,
                last_maintenance_km: row.vidange_last_km,
            },
            bougie: KmMaintenance {
                interval_km: row.bougie_interval_km,
                last_maintenance_km: row.bougie_last_km,
            },
            filtre_huile: KmMaintenance {
                interval_km: row.filtre_huile_interval_km,
                last_maintenance_km: row.filtre_huile_last_km,
            },
            filtre_air: KmMaintenance {
                interval_km: row.filtre_air_interval_km,
                last_maintenance_km: row.filtre_air_last_km,
            },
            autre_entretien: row.autre_entretien,
            visite_technique: DateMaintenance {
                date: row.visite_technique_date,
                next: row.visite_technique_next,
                intervale: parse_cadence(&row.visite_technique_intervale, row.id)?,
            },
            assurance: DateMaintenance {
                date: row.assurance_date,
                next: row.assurance_next,
                intervale: parse_cadence(&row.assurance_intervale, row.id)?,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgEntretienRepository {
    pool: PgPool,
}

impl PgEntretienRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntretienRepository for PgEntretienRepository {
    async fn upsert(&self, e: &Entretien) -> AppResult<Entretien> {
        let row = sqlx::query_as::<_, EntretienRow>(
            r#"
            INSERT INTO entretiens (
                id, car_id,
                vidange_interval_km, vidange_last_km,
                bougie_interval_km, bougie_last_km,
                filtre_huile_interval_km, filtre_huile_last_km,
                filtre_air_interval_km, filtre_air_last_km,
                autre_entretien,
                visite_technique_date, visite_technique_next, visite_technique_intervale,
                assurance_date, assurance_next, assurance_intervale,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (car_id) DO UPDATE SET
                vidange_interval_km = EXCLUDED.vidange_interval_km,
                vidange_last_km = EXCLUDED.vidange_last_km,
                bougie_interval_km = EXCLUDED.bougie_interval_km,
                bougie_last_km = EXCLUDED.bougie_last_km,
                filtre_huile_interval_km = EXCLUDED.filtre_huile_interval_km,
                filtre_huile_last_km = EXCLUDED.filtre_huile_last_km,
                filtre_air_interval_km = EXCLUDED.filtre_air_interval_km,
                filtre_air_last_km = EXCLUDED.filtre_air_last_km,
                autre_entretien = EXCLUDED.autre_entretien,
                visite_technique_date = EXCLUDED.visite_technique_date,
                visite_technique_next = EXCLUDED.visite_technique_next,
                visite_technique_intervale = EXCLUDED.visite_technique_intervale,
                assurance_date = EXCLUDED.assurance_date,
                assurance_next = EXCLUDED.assurance_next,
                assurance_intervale = EXCLUDED.assurance_intervale,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(e.id)
        .bind(e.car_id)
        .bind(e.vidange.interval_km)
        .bind(e.vidange.last_maintenance_km)
        .bind(e.bougie.interval_km)
        .bind(e.bougie.last_maintenance_km)
        .bind(e.filtre_huile.interval_km)
        .bind(e.filtre_huile.last_maintenance_km)
        .bind(e.filtre_air.interval_km)
        .bind(e.filtre_air.last_maintenance_km)
        .bind(&e.autre_entretien)
        .bind(e.visite_technique.date)
        .bind(e.visite_technique.next)
        .bind(e.visite_technique.intervale.as_str())
        .bind(e.assurance.date)
        .bind(e.assurance.next)
        .bind(e.assurance.intervale.as_str())
        .bind(e.created_at)
        .bind(e.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_car(&self, car_id: Uuid) -> AppResult<Option<Entretien>> {
        let row = sqlx::query_as::<_, EntretienRow>("SELECT * FROM entretiens WHERE car_id = $1")
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Entretien::try_from).transpose()
    }

    async fn find_all(&self) -> AppResult<Vec<Entretien>> {
        let rows = sqlx::query_as::<_, EntretienRow>("SELECT * FROM entretiens ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Entretien::try_from).collect()
    }

    async fn delete_by_car(&self, car_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM entretiens WHERE car_id = $1")
            .bind(car_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
