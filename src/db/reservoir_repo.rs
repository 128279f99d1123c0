// src/db/reservoir_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, db::ReservoirStore, models::reservoir::Reservoir};

// Postgres-backed reservoir store (table `water_reservoirs`, see schema.sql).
#[derive(Clone)]
pub struct ReservoirRepository {
    pool: PgPool,
}

impl ReservoirRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, filter: &str, value: &str) -> Result<Vec<Reservoir>, AppError> {
        let sql = format!("SELECT * FROM water_reservoirs WHERE {filter} ORDER BY id ASC");
        let reservoirs = sqlx::query_as::<_, Reservoir>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;
        Ok(reservoirs)
    }

    async fn insert(&self, r: &Reservoir) -> Result<Reservoir, AppError> {
        let saved = sqlx::query_as::<_, Reservoir>(
            r#"
            INSERT INTO water_reservoirs (
                name, county, sub_county, ward, specific_location,
                latitude, longitude, total_capacity_m3, current_level_m3,
                current_level_percentage, water_quality, last_updated,
                estimated_runout_date, is_active, description, managed_by,
                contact_phone, contact_email
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(&r.name)
        .bind(&r.county)
        .bind(&r.sub_county)
        .bind(&r.ward)
        .bind(&r.specific_location)
        .bind(r.latitude)
        .bind(r.longitude)
        .bind(r.total_capacity_m3())
        .bind(r.current_level_m3())
        .bind(r.current_level_percentage())
        .bind(r.water_quality)
        .bind(r.last_updated())
        .bind(r.estimated_runout_date())
        .bind(r.is_active)
        .bind(&r.description)
        .bind(&r.managed_by)
        .bind(&r.contact_phone)
        .bind(&r.contact_email)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn update(&self, id: i64, r: &Reservoir) -> Result<Reservoir, AppError> {
        sqlx::query_as::<_, Reservoir>(
            r#"
            UPDATE water_reservoirs SET
                name = $2, county = $3, sub_county = $4, ward = $5,
                specific_location = $6, latitude = $7, longitude = $8,
                total_capacity_m3 = $9, current_level_m3 = $10,
                current_level_percentage = $11, water_quality = $12,
                last_updated = $13, estimated_runout_date = $14, is_active = $15,
                description = $16, managed_by = $17, contact_phone = $18,
                contact_email = $19
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&r.name)
        .bind(&r.county)
        .bind(&r.sub_county)
        .bind(&r.ward)
        .bind(&r.specific_location)
        .bind(r.latitude)
        .bind(r.longitude)
        .bind(r.total_capacity_m3())
        .bind(r.current_level_m3())
        .bind(r.current_level_percentage())
        .bind(r.water_quality)
        .bind(r.last_updated())
        .bind(r.estimated_runout_date())
        .bind(r.is_active)
        .bind(&r.description)
        .bind(&r.managed_by)
        .bind(&r.contact_phone)
        .bind(&r.contact_email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::ReservoirNotFound(id))
    }
}

#[async_trait]
impl ReservoirStore for ReservoirRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Reservoir>, AppError> {
        let reservoir = sqlx::query_as::<_, Reservoir>("SELECT * FROM water_reservoirs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(reservoir)
    }

    async fn find_all(&self) -> Result<Vec<Reservoir>, AppError> {
        let reservoirs = sqlx::query_as::<_, Reservoir>("SELECT * FROM water_reservoirs ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(reservoirs)
    }

    async fn find_active(&self) -> Result<Vec<Reservoir>, AppError> {
        let reservoirs = sqlx::query_as::<_, Reservoir>(
            "SELECT * FROM water_reservoirs WHERE is_active = TRUE ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(reservoirs)
    }

    async fn find_by_county(&self, county: &str) -> Result<Vec<Reservoir>, AppError> {
        self.fetch_where("LOWER(county) = $1", county).await
    }

    async fn find_by_sub_county(&self, sub_county: &str) -> Result<Vec<Reservoir>, AppError> {
        self.fetch_where("LOWER(sub_county) = $1", sub_county).await
    }

    async fn find_by_ward(&self, ward: &str) -> Result<Vec<Reservoir>, AppError> {
        self.fetch_where("LOWER(ward) = $1", ward).await
    }

    // strpos instead of LIKE so `%` and `_` in user input match literally.
    async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Reservoir>, AppError> {
        self.fetch_where("strpos(LOWER(name), $1) > 0", fragment).await
    }

    async fn search_free_text(&self, term: &str) -> Result<Vec<Reservoir>, AppError> {
        self.fetch_where(
            "strpos(LOWER(name), $1) > 0 \
             OR strpos(LOWER(county), $1) > 0 \
             OR strpos(LOWER(sub_county), $1) > 0 \
             OR strpos(LOWER(ward), $1) > 0",
            term,
        )
        .await
    }

    async fn save(&self, reservoir: Reservoir) -> Result<Reservoir, AppError> {
        match reservoir.id() {
            None => self.insert(&reservoir).await,
            Some(id) => self.update(id, &reservoir).await,
        }
    }

    async fn count(&self) -> Result<u64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM water_reservoirs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
