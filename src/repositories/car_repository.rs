use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CarRemoval, CarRepository};
use crate::models::car::Car;
use crate::utils::errors::{AppError, AppResult};

pub struct PgCarRepository {
    pool: PgPool,
}

impl PgCarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CarRepository for PgCarRepository {
    async fn create(&self, car: &Car) -> AppResult<Car> {
        let created = sqlx::query_as::<_, Car>(
            r#"
            INSERT INTO cars (id, name, model, year, mileage, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(car.id)
        .bind(&car.name)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.mileage)
        .bind(car.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Car>> {
        let car = sqlx::query_as::<_, Car>("SELECT * FROM cars WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(car)
    }

    async fn find_all(&self) -> AppResult<Vec<Car>> {
        let cars = sqlx::query_as::<_, Car>("SELECT * FROM cars ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(cars)
    }

    async fn model_exists(&self, model: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM cars WHERE model = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(model)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    async fn update(&self, car: &Car) -> AppResult<Option<Car>> {
        let updated = sqlx::query_as::<_, Car>(
            r#"
            UPDATE cars
            SET name = $2, model = $3, year = $4, mileage = GREATEST(mileage, $5)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(car.id)
        .bind(&car.name)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.mileage)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(updated)
    }

    async fn get_mileage(&self, id: Uuid) -> AppResult<Option<i64>> {
        let mileage: Option<(i64,)> = sqlx::query_as("SELECT mileage FROM cars WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(mileage.map(|row| row.0))
    }

    async fn delete_with_dependents(&self, id: Uuid) -> AppResult<Option<CarRemoval>> {
        let mut tx = self.pool.begin().await?;

        // Bloquea el coche: una reserva concurrente no puede colarse entre los DELETE
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM cars WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let photos: Vec<(Vec<String>,)> = sqlx::query_as("DELETE FROM contracts WHERE car_id = $1 RETURNING photos")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM entretiens WHERE car_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(CarRemoval {
            contracts: photos.len() as u64,
            photos: photos.into_iter().flat_map(|(refs,)| refs).collect(),
        }))
    }
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("A car with this model already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}
