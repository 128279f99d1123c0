// src/db/memory.rs

//! In-process stores used when no database is configured, and by the tests.
//!
//! Each store keeps its rows in a `BTreeMap` behind a [`tokio::sync::RwLock`],
//! so reads run concurrently and a `save` on one record is atomic with respect
//! to every other writer. Ids are handed out sequentially starting at 1.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::{ReservoirStore, UserStore},
    models::{auth::User, reservoir::Reservoir},
};

#[derive(Debug)]
struct Table<T> {
    last_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReservoirStore {
    table: RwLock<Table<Reservoir>>,
}

impl InMemoryReservoirStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching<F>(&self, predicate: F) -> Vec<Reservoir>
    where
        F: Fn(&Reservoir) -> bool,
    {
        let table = self.table.read().await;
        table.rows.values().filter(|r| predicate(r)).cloned().collect()
    }
}

fn lower_contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl ReservoirStore for InMemoryReservoirStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Reservoir>, AppError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Reservoir>, AppError> {
        Ok(self.matching(|_| true).await)
    }

    async fn find_active(&self) -> Result<Vec<Reservoir>, AppError> {
        Ok(self.matching(|r| r.is_active).await)
    }

    async fn find_by_county(&self, county: &str) -> Result<Vec<Reservoir>, AppError> {
        Ok(self.matching(|r| r.county.to_lowercase() == county).await)
    }

    async fn find_by_sub_county(&self, sub_county: &str) -> Result<Vec<Reservoir>, AppError> {
        Ok(self.matching(|r| r.sub_county.to_lowercase() == sub_county).await)
    }

    async fn find_by_ward(&self, ward: &str) -> Result<Vec<Reservoir>, AppError> {
        Ok(self.matching(|r| r.ward.to_lowercase() == ward).await)
    }

    async fn find_by_name_contains(&self, fragment: &str) -> Result<Vec<Reservoir>, AppError> {
        Ok(self.matching(|r| lower_contains(&r.name, fragment)).await)
    }

    async fn search_free_text(&self, term: &str) -> Result<Vec<Reservoir>, AppError> {
        Ok(self
            .matching(|r| {
                lower_contains(&r.name, term)
                    || lower_contains(&r.county, term)
                    || lower_contains(&r.sub_county, term)
                    || lower_contains(&r.ward, term)
            })
            .await)
    }

    async fn save(&self, reservoir: Reservoir) -> Result<Reservoir, AppError> {
        let mut table = self.table.write().await;
        let (id, reservoir) = match reservoir.id() {
            Some(id) if table.rows.contains_key(&id) => (id, reservoir),
            Some(id) => return Err(AppError::ReservoirNotFound(id)),
            None => {
                let id = table.next_id();
                (id, reservoir.with_id(id))
            }
        };
        table.rows.insert(id, reservoir.clone());
        Ok(reservoir)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.table.read().await.rows.len() as u64)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    table: RwLock<Table<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|u| u.email == email).cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().any(|u| u.email == email))
    }

    async fn save(&self, mut user: User) -> Result<User, AppError> {
        let mut table = self.table.write().await;
        // Same check the unique index does in Postgres.
        if table
            .rows
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(AppError::EmailTaken);
        }
        let id = match user.id {
            Some(id) if table.rows.contains_key(&id) => id,
            Some(_) => return Err(AppError::UserNotFound),
            None => table.next_id(),
        };
        user.id = Some(id);
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.table.read().await.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use crate::models::reservoir::NewReservoir;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn reservoir(name: &str, county: &str) -> Reservoir {
        Reservoir::new(
            NewReservoir {
                name: name.into(),
                county: county.into(),
                sub_county: "Central".into(),
                ward: "Township".into(),
                specific_location: None,
                latitude: -1.0,
                longitude: 37.0,
                total_capacity_m3: Decimal::from(1000),
                current_level_m3: Decimal::from(500),
                water_quality: None,
                description: None,
                managed_by: None,
                contact_phone: None,
                contact_email: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn user(email: &str) -> User {
        User {
            id: None,
            full_name: "Jane".into(),
            email: email.into(),
            password_hash: "$2b$04$hash".into(),
            role: UserRole::User,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[tokio::test]
    async fn save_assigns_sequential_ids() {
        let store = InMemoryReservoirStore::new();
        let a = store.save(reservoir("Chania Dam", "Nyeri")).await.unwrap();
        let b = store.save(reservoir("Kitui Dam", "Kitui")).await.unwrap();
        assert_eq!(a.id(), Some(1));
        assert_eq!(b.id(), Some(2));
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn save_existing_overwrites() {
        let store = InMemoryReservoirStore::new();
        let mut saved = store.save(reservoir("Chania Dam", "Nyeri")).await.unwrap();
        saved.is_active = false;
        store.save(saved).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.find_active().await.unwrap().is_empty());
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn region_lookups_expect_lowercased_input() {
        let store = InMemoryReservoirStore::new();
        store.save(reservoir("Chania Dam", "Nyeri")).await.unwrap();

        assert_eq!(store.find_by_county("nyeri").await.unwrap().len(), 1);
        assert!(store.find_by_county("nyer").await.unwrap().is_empty());
        assert_eq!(store.find_by_name_contains("chania").await.unwrap().len(), 1);
        assert_eq!(store.search_free_text("township").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryUserStore::new();
        store.save(user("a@x.com")).await.unwrap();
        let err = store.save(user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
        // Exact match: a different case is a different email.
        assert!(store.save(user("A@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn updating_a_user_keeps_its_id() {
        let store = InMemoryUserStore::new();
        let mut saved = store.save(user("a@x.com")).await.unwrap();
        saved.last_login = Some(Utc::now());
        let updated = store.save(saved.clone()).await.unwrap();
        assert_eq!(updated.id, saved.id);
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.exists_by_email("a@x.com").await.unwrap());
    }
}
