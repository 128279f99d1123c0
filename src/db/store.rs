// src/db/store.rs

use async_trait::async_trait;

use crate::{
    common::error::AppError,
    models::{auth::User, reservoir::Reservoir},
};

/// Persistence contract for reservoirs.
///
/// Case-insensitive lookups receive a value the caller has already lower-cased;
/// implementations compare it against the lower-cased column. Every method is a
/// single round trip to the backing store. Errors are returned as-is, never retried.
#[async_trait]
pub trait ReservoirStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Reservoir>, AppError>;

    /// Every record, active or not.
    async fn find_all(&self) -> Result<Vec<Reservoir>, AppError>;

    async fn find_active(&self) -> Result<Vec<Reservoir>, AppError>;

    async fn find_by_county(&self, county: &str) -> Result<Vec<Reservoir>, AppError>;

    async fn find_by_sub_county(&self, sub_county: &str) -> Result<Vec<Reservoir>, AppError>;

    async fn find_by_ward(&self, ward: &str) -> Result<Vec<Reservoir>, AppError>;

    /// Substring match on the name.
    async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Reservoir>, AppError>;

    /// Substring match on name, county, sub-county or ward.
    async fn search_free_text(&self, term: &str) -> Result<Vec<Reservoir>, AppError>;

    /// Inserts when the record has no id yet, otherwise overwrites the stored row.
    async fn save(&self, reservoir: Reservoir) -> Result<Reservoir, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}

/// Persistence contract for users. Email comparisons are exact (case-sensitive).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;

    /// Inserts or updates. A second user with the same email is `EmailTaken`.
    async fn save(&self, user: User) -> Result<User, AppError>;

    async fn count(&self) -> Result<u64, AppError>;
}
