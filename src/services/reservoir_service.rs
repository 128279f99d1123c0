// src/services/reservoir_service.rs

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    common::{error::AppError, geo::distance_km},
    db::ReservoirStore,
    models::reservoir::{
        NewReservoir, Reservoir, ReservoirStatistics, ReservoirStatus, ReservoirView,
    },
};

/// Read/search/update orchestration over a [`ReservoirStore`].
///
/// Listings return active reservoirs only, except `get_by_id`, the three region
/// filters and `within_radius`, which see inactive records too.
#[derive(Clone)]
pub struct ReservoirService {
    store: Arc<dyn ReservoirStore>,
}

fn views(reservoirs: Vec<Reservoir>) -> Vec<ReservoirView> {
    reservoirs.into_iter().map(ReservoirView::from).collect()
}

fn active_views(reservoirs: Vec<Reservoir>) -> Vec<ReservoirView> {
    reservoirs
        .into_iter()
        .filter(|r| r.is_active)
        .map(ReservoirView::from)
        .collect()
}

impl ReservoirService {
    pub fn new(store: Arc<dyn ReservoirStore>) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Result<Vec<ReservoirView>, AppError> {
        Ok(views(self.store.find_active().await?))
    }

    // Ignores the active flag.
    pub async fn get_by_id(&self, id: i64) -> Result<ReservoirView, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .map(ReservoirView::from)
            .ok_or(AppError::ReservoirNotFound(id))
    }

    /// Case-insensitive substring search over name, county, sub-county and ward.
    /// A blank term lists every active reservoir.
    pub async fn search_free_text(&self, term: &str) -> Result<Vec<ReservoirView>, AppError> {
        let term = term.trim();
        if term.is_empty() {
            return self.get_all().await;
        }
        let found = self.store.search_free_text(&term.to_lowercase()).await?;
        tracing::debug!(term, hits = found.len(), "free-text reservoir search");
        Ok(active_views(found))
    }

    pub async fn by_county(&self, county: &str) -> Result<Vec<ReservoirView>, AppError> {
        Ok(views(self.store.find_by_county(&county.to_lowercase()).await?))
    }

    pub async fn by_sub_county(&self, sub_county: &str) -> Result<Vec<ReservoirView>, AppError> {
        Ok(views(
            self.store
                .find_by_sub_county(&sub_county.to_lowercase())
                .await?,
        ))
    }

    pub async fn by_ward(&self, ward: &str) -> Result<Vec<ReservoirView>, AppError> {
        Ok(views(self.store.find_by_ward(&ward.to_lowercase()).await?))
    }

    pub async fn by_name_contains(&self, fragment: &str) -> Result<Vec<ReservoirView>, AppError> {
        Ok(active_views(
            self.store
                .find_by_name_contains(&fragment.to_lowercase())
                .await?,
        ))
    }

    /// Unrecognised status strings yield an empty list rather than an error.
    pub async fn by_status(&self, status: &str) -> Result<Vec<ReservoirView>, AppError> {
        let Ok(wanted) = ReservoirStatus::from_str(status) else {
            tracing::debug!(status, "unknown reservoir status requested");
            return Ok(Vec::new());
        };
        let reservoirs = self.store.find_active().await?;
        Ok(reservoirs
            .into_iter()
            .filter(|r| r.status() == wanted)
            .map(ReservoirView::from)
            .collect())
    }

    pub async fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<ReservoirView>, AppError> {
        let reservoirs = self.store.find_all().await?;
        Ok(reservoirs
            .into_iter()
            .filter(|r| distance_km(latitude, longitude, r.latitude, r.longitude) <= radius_km)
            .map(ReservoirView::from)
            .collect())
    }

    /// Active reservoirs below 40%.
    pub async fn critical(&self) -> Result<Vec<ReservoirView>, AppError> {
        let threshold = Decimal::from(40);
        let reservoirs = self.store.find_active().await?;
        Ok(reservoirs
            .into_iter()
            .filter(|r| r.current_level_percentage().is_some_and(|p| p < threshold))
            .map(ReservoirView::from)
            .collect())
    }

    /// Active reservoirs that carry a runout estimate.
    ///
    /// `_days` is accepted for API compatibility but does not narrow the result:
    /// every estimate sits at the same fixed horizon.
    pub async fn running_out_soon(&self, _days: u32) -> Result<Vec<ReservoirView>, AppError> {
        let reservoirs = self.store.find_active().await?;
        Ok(reservoirs
            .into_iter()
            .filter(|r| r.estimated_runout_date().is_some())
            .map(ReservoirView::from)
            .collect())
    }

    pub async fn statistics(&self) -> Result<ReservoirStatistics, AppError> {
        let reservoirs = self.store.find_active().await?;
        let mut stats = ReservoirStatistics::default();
        for reservoir in &reservoirs {
            stats.total_reservoirs += 1;
            match reservoir.status() {
                ReservoirStatus::Good => stats.good_reservoirs += 1,
                ReservoirStatus::Warning => stats.warning_reservoirs += 1,
                ReservoirStatus::Critical => stats.critical_reservoirs += 1,
                ReservoirStatus::Unknown => {}
            }
        }
        Ok(stats)
    }

    pub async fn update_water_level(
        &self,
        id: i64,
        new_level: Decimal,
        now: DateTime<Utc>,
    ) -> Result<ReservoirView, AppError> {
        let mut reservoir = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AppError::ReservoirNotFound(id))?;

        reservoir.set_current_level(new_level, now)?;
        let saved = self.store.save(reservoir).await?;

        tracing::info!(
            id,
            level = %saved.current_level_m3(),
            status = saved.status().as_str(),
            "water level updated"
        );
        Ok(ReservoirView::from(saved))
    }

    pub async fn create(&self, draft: NewReservoir, now: DateTime<Utc>) -> Result<ReservoirView, AppError> {
        let reservoir = Reservoir::new(draft, now)?;
        let saved = self.store.save(reservoir).await?;
        tracing::info!(id = saved.id(), name = %saved.name, "reservoir created");
        Ok(ReservoirView::from(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryReservoirStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn draft(name: &str, capacity: i64, level: i64) -> NewReservoir {
        NewReservoir {
            name: name.into(),
            county: "Nairobi".into(),
            sub_county: "Ruiru".into(),
            ward: "Ruiru".into(),
            specific_location: None,
            latitude: -1.15,
            longitude: 36.95,
            total_capacity_m3: Decimal::from(capacity),
            current_level_m3: Decimal::from(level),
            water_quality: None,
            description: None,
            managed_by: None,
            contact_phone: None,
            contact_email: None,
        }
    }

    // One reservoir per status, plus one whose percentage was never recorded.
    async fn service_with_unmeasured() -> ReservoirService {
        let store = Arc::new(InMemoryReservoirStore::new());
        for (name, level) in [("Full Dam", 80), ("Half Dam", 50), ("Low Dam", 10)] {
            let reservoir = Reservoir::new(draft(name, 100, level), now()).unwrap();
            store.save(reservoir).await.unwrap();
        }
        let unmeasured = Reservoir::new(draft("Unmeasured Dam", 100, 30), now())
            .unwrap()
            .without_percentage();
        store.save(unmeasured).await.unwrap();
        ReservoirService::new(store)
    }

    #[tokio::test]
    async fn statistics_total_includes_reservoirs_without_percentage() {
        let service = service_with_unmeasured().await;

        let stats = service.statistics().await.unwrap();
        assert_eq!(stats.total_reservoirs, 4);
        assert_eq!(
            (stats.good_reservoirs, stats.warning_reservoirs, stats.critical_reservoirs),
            (1, 1, 1)
        );
        assert_eq!(
            stats.total_reservoirs,
            stats.good_reservoirs + stats.warning_reservoirs + stats.critical_reservoirs + 1
        );
    }

    #[tokio::test]
    async fn unknown_status_matches_reservoirs_without_percentage() {
        let service = service_with_unmeasured().await;

        let unknown = service.by_status("unknown").await.unwrap();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].name, "Unmeasured Dam");
        assert_eq!(unknown[0].status, ReservoirStatus::Unknown);
        assert_eq!(unknown[0].current_level_percentage, None);

        // No percentage, so it is not critical either.
        let critical = service.critical().await.unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].name, "Low Dam");
    }
}
