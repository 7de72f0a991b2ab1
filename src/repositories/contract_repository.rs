use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::ContractRepository;
use crate::models::contract::{Contract, ContractStatus, PhotoRef};
use crate::utils::errors::{AppError, AppResult};

/// Código SQLSTATE de violación de la restricción de exclusión (solapamiento)
const EXCLUSION_VIOLATION: &str = "23P01";

// Fila tal como está en la tabla contracts
#[derive(Debug, sqlx::FromRow)]
struct ContractRow {
    id: Uuid,
    car_id: Uuid,
    customer_name: String,
    rental_start_date: DateTime<Utc>,
    rental_end_date: DateTime<Utc>,
    photos: Vec<String>,
    return_mileage: Option<i64>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = AppError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ContractStatus>()
            .map_err(|e| AppError::Internal(format!("Corrupted contract {}: {}", row.id, e)))?;

        Ok(Contract {
            id: row.id,
            car_id: row.car_id,
            customer_name: row.customer_name,
            rental_start_date: row.rental_start_date,
            rental_end_date: row.rental_end_date,
            photos: row.photos,
            return_mileage: row.return_mileage,
            status,
            created_at: row.created_at,
        })
    }
}

fn into_contracts(rows: Vec<ContractRow>) -> AppResult<Vec<Contract>> {
    rows.into_iter().map(Contract::try_from).collect()
}

pub struct PgContractRepository {
    pool: PgPool,
}

impl PgContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractRepository for PgContractRepository {
    async fn create(&self, contract: &Contract) -> AppResult<Contract> {
        let row = sqlx::query_as::<_, ContractRow>(
            r#"
            INSERT INTO contracts (
                id, car_id, customer_name, rental_start_date, rental_end_date,
                photos, return_mileage, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(contract.id)
        .bind(contract.car_id)
        .bind(&contract.customer_name)
        .bind(contract.rental_start_date)
        .bind(contract.rental_end_date)
        .bind(contract.photos.clone())
        .bind(contract.return_mileage)
        .bind(contract.status.as_str())
        .bind(contract.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // Dos reservas concurrentes: la restricción de exclusión decide
            sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION) => {
                AppError::Conflict("A contract already exists for the selected dates".to_string())
            }
            _ => AppError::Database(e),
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>("SELECT * FROM contracts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Contract::try_from).transpose()
    }

    async fn find_by_car(&self, car_id: Uuid) -> AppResult<Vec<Contract>> {
        let rows = sqlx::query_as::<_, ContractRow>(
            "SELECT * FROM contracts WHERE car_id = $1 ORDER BY rental_start_date DESC",
        )
        .bind(car_id)
        .fetch_all(&self.pool)
        .await?;

        into_contracts(rows)
    }

    async fn find_starting_from(&self, from: DateTime<Utc>) -> AppResult<Vec<Contract>> {
        let rows = sqlx::query_as::<_, ContractRow>(
            "SELECT * FROM contracts WHERE rental_start_date >= $1 ORDER BY rental_start_date ASC",
        )
        .bind(from)
        .fetch_all(&self.pool)
        .await?;

        into_contracts(rows)
    }

    async fn update_photos(&self, id: Uuid, photos: &[PhotoRef]) -> AppResult<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>(
            "UPDATE contracts SET photos = $2 WHERE id = $1 AND status <> 'archived' RETURNING *",
        )
        .bind(id)
        .bind(photos.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Contract::try_from).transpose()
    }

    async fn update_status(&self, id: Uuid, status: ContractStatus, photos: &[PhotoRef]) -> AppResult<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>(
            r#"
            UPDATE contracts
            SET status = $2, photos = $3
            WHERE id = $1 AND status <> 'archived'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(photos.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Contract::try_from).transpose()
    }

    async fn archive_with_return(
        &self,
        id: Uuid,
        return_mileage: i64,
        photos: &[PhotoRef],
    ) -> AppResult<Option<Contract>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ContractRow>(
            r#"
            UPDATE contracts
            SET status = 'archived', return_mileage = $2, photos = $3
            WHERE id = $1 AND status <> 'archived'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(return_mileage)
        .bind(photos.to_vec())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("UPDATE cars SET mileage = GREATEST(mileage, $2) WHERE id = $1")
            .bind(row.car_id)
            .bind(return_mileage)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Contract::try_from(row).map(Some)
    }

    async fn mark_pending_returns(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE contracts SET status = 'pending_return' WHERE status = 'active' AND rental_end_date < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM contracts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
