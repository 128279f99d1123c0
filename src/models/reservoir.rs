// src/models/reservoir.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

// Valid coordinate window for the deployment region (Kenya).
pub const MIN_LATITUDE: f64 = -4.5;
pub const MAX_LATITUDE: f64 = 4.5;
pub const MIN_LONGITUDE: f64 = 33.0;
pub const MAX_LONGITUDE: f64 = 42.0;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 200;

/// Days until runout when the level is drawn down by a fixed share of itself each day.
const FLAT_RUNOUT_DAYS: i64 = 100;

// --- Water quality ---
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "water_quality", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaterQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

// --- Derived status (never persisted) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservoirStatus {
    Good,
    Warning,
    Critical,
    Unknown,
}

impl ReservoirStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservoirStatus::Good => "GOOD",
            ReservoirStatus::Warning => "WARNING",
            ReservoirStatus::Critical => "CRITICAL",
            ReservoirStatus::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for ReservoirStatus {
    type Err = ();

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GOOD" => Ok(ReservoirStatus::Good),
            "WARNING" => Ok(ReservoirStatus::Warning),
            "CRITICAL" => Ok(ReservoirStatus::Critical),
            "UNKNOWN" => Ok(ReservoirStatus::Unknown),
            _ => Err(()),
        }
    }
}

// ---
// Domain rules
// ---

/// `round(level / capacity * 100, 2)` with half-up rounding, in decimal arithmetic.
pub fn derive_percentage(current_level: Decimal, total_capacity: Decimal) -> Result<Decimal, AppError> {
    if total_capacity <= Decimal::ZERO {
        return Err(AppError::DivisionByZero);
    }
    // Scaling first keeps full precision; near the top of the Decimal range
    // the ratio is taken first instead, which cannot overflow for level <= capacity.
    let raw = current_level
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(total_capacity))
        .or_else(|| {
            current_level
                .checked_div(total_capacity)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        })
        .ok_or(AppError::PercentageOverflow)?;
    // Levels are never negative here, so away-from-zero is half-up.
    Ok(raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Lower bounds are inclusive: exactly 70 is GOOD, exactly 40 is WARNING.
pub fn derive_status(percentage: Option<Decimal>) -> ReservoirStatus {
    match percentage {
        None => ReservoirStatus::Unknown,
        Some(p) if p >= Decimal::from(70) => ReservoirStatus::Good,
        Some(p) if p >= Decimal::from(40) => ReservoirStatus::Warning,
        Some(_) => ReservoirStatus::Critical,
    }
}

/// Projects depletion assuming a daily draw of 1% of the *current* level.
///
/// The horizon is therefore always 100 days for any positive level.
pub fn estimate_runout(current_level: Decimal, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if current_level <= Decimal::ZERO {
        return None;
    }
    let daily_draw = current_level * Decimal::new(1, 2);
    let days = current_level
        .checked_div(daily_draw)
        .and_then(|d| d.floor().to_i64())
        .unwrap_or(FLAT_RUNOUT_DAYS);
    Some(now + Duration::days(days))
}

// ---
// Entity
// ---

/// A stored reservoir.
///
/// Level, percentage, timestamps and runout are private: the only way to change
/// them after construction is [`Reservoir::set_current_level`].
#[derive(Debug, Clone, FromRow)]
pub struct Reservoir {
    id: Option<i64>,
    pub name: String,
    pub county: String,
    pub sub_county: String,
    pub ward: String,
    pub specific_location: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    total_capacity_m3: Decimal,
    current_level_m3: Decimal,
    current_level_percentage: Option<Decimal>,
    pub water_quality: Option<WaterQuality>,
    last_updated: DateTime<Utc>,
    estimated_runout_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub description: Option<String>,
    pub managed_by: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

impl Reservoir {
    /// Builds a new, not yet persisted reservoir after checking every field invariant.
    pub fn new(draft: NewReservoir, now: DateTime<Utc>) -> Result<Self, AppError> {
        let name_len = draft.name.trim().chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_len) {
            return Err(AppError::invalid_field(
                "name",
                format!("must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"),
            ));
        }
        for (field, value) in [
            ("county", &draft.county),
            ("subCounty", &draft.sub_county),
            ("ward", &draft.ward),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::invalid_field(field, "is required"));
            }
        }
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&draft.latitude) {
            return Err(AppError::invalid_field(
                "latitude",
                format!("must be between {MIN_LATITUDE} and {MAX_LATITUDE}"),
            ));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&draft.longitude) {
            return Err(AppError::invalid_field(
                "longitude",
                format!("must be between {MIN_LONGITUDE} and {MAX_LONGITUDE}"),
            ));
        }
        if draft.total_capacity_m3 <= Decimal::ZERO {
            return Err(AppError::invalid_field("totalCapacityM3", "must be greater than zero"));
        }
        check_level(draft.current_level_m3, draft.total_capacity_m3)?;

        let percentage = derive_percentage(draft.current_level_m3, draft.total_capacity_m3)?;

        Ok(Self {
            id: None,
            name: draft.name.trim().to_string(),
            county: draft.county.trim().to_string(),
            sub_county: draft.sub_county.trim().to_string(),
            ward: draft.ward.trim().to_string(),
            specific_location: draft.specific_location,
            latitude: draft.latitude,
            longitude: draft.longitude,
            total_capacity_m3: draft.total_capacity_m3,
            current_level_m3: draft.current_level_m3,
            current_level_percentage: Some(percentage),
            water_quality: draft.water_quality,
            last_updated: now,
            estimated_runout_date: estimate_runout(draft.current_level_m3, now),
            is_active: true,
            description: draft.description,
            managed_by: draft.managed_by,
            contact_phone: draft.contact_phone,
            contact_email: draft.contact_email,
        })
    }

    /// Sets the level and everything derived from it in one step.
    ///
    /// Nothing is modified when the level is rejected.
    pub fn set_current_level(&mut self, new_level: Decimal, now: DateTime<Utc>) -> Result<(), AppError> {
        check_level(new_level, self.total_capacity_m3)?;
        let percentage = derive_percentage(new_level, self.total_capacity_m3)?;

        self.current_level_m3 = new_level;
        self.current_level_percentage = Some(percentage);
        self.estimated_runout_date = estimate_runout(new_level, now);
        self.last_updated = now;
        Ok(())
    }

    pub fn status(&self) -> ReservoirStatus {
        derive_status(self.current_level_percentage)
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn total_capacity_m3(&self) -> Decimal {
        self.total_capacity_m3
    }

    pub fn current_level_m3(&self) -> Decimal {
        self.current_level_m3
    }

    pub fn current_level_percentage(&self) -> Option<Decimal> {
        self.current_level_percentage
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn estimated_runout_date(&self) -> Option<DateTime<Utc>> {
        self.estimated_runout_date
    }

    // Rows loaded with a NULL percentage; the public constructors always set one.
    #[cfg(test)]
    pub(crate) fn without_percentage(mut self) -> Self {
        self.current_level_percentage = None;
        self
    }

    // Ids are handed out by the store exactly once.
    pub(crate) fn with_id(mut self, id: i64) -> Self {
        if self.id.is_none() {
            self.id = Some(id);
        }
        self
    }
}

fn check_level(level: Decimal, capacity: Decimal) -> Result<(), AppError> {
    if level < Decimal::ZERO || level > capacity {
        return Err(AppError::InvalidLevel { level, capacity });
    }
    Ok(())
}

// ---
// Payloads
// ---

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("Total capacity must be positive.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("Current level cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_latitude(val: f64) -> Result<(), ValidationError> {
    if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&val) {
        let mut err = ValidationError::new("range");
        err.message = Some("Latitude must be valid for Kenya.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_longitude(val: f64) -> Result<(), ValidationError> {
    if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&val) {
        let mut err = ValidationError::new("range");
        err.message = Some("Longitude must be valid for Kenya.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewReservoir {
    #[validate(length(min = 2, max = 200, message = "Reservoir name must be between 2 and 200 characters."))]
    pub name: String,

    #[validate(length(min = 1, message = "County is required."))]
    pub county: String,

    #[validate(length(min = 1, message = "Sub-county is required."))]
    pub sub_county: String,

    #[validate(length(min = 1, message = "Ward is required."))]
    pub ward: String,

    pub specific_location: Option<String>,

    #[validate(custom(function = "validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64)]
    pub total_capacity_m3: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub current_level_m3: Decimal,

    pub water_quality: Option<WaterQuality>,
    pub description: Option<String>,
    pub managed_by: Option<String>,
    pub contact_phone: Option<String>,

    #[validate(email(message = "Contact email is invalid."))]
    pub contact_email: Option<String>,
}

// ---
// Read views
// ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservoirView {
    pub id: Option<i64>,
    pub name: String,
    pub county: String,
    pub sub_county: String,
    pub ward: String,
    pub specific_location: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[schema(value_type = f64)]
    pub total_capacity_m3: Decimal,
    #[schema(value_type = f64)]
    pub current_level_m3: Decimal,
    #[schema(value_type = Option<f64>)]
    pub current_level_percentage: Option<Decimal>,
    pub water_quality: Option<WaterQuality>,
    pub last_updated: DateTime<Utc>,
    pub estimated_runout_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub description: Option<String>,
    pub managed_by: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub status: ReservoirStatus,
}

impl From<Reservoir> for ReservoirView {
    fn from(r: Reservoir) -> Self {
        let status = r.status();
        Self {
            id: r.id,
            name: r.name,
            county: r.county,
            sub_county: r.sub_county,
            ward: r.ward,
            specific_location: r.specific_location,
            latitude: r.latitude,
            longitude: r.longitude,
            total_capacity_m3: r.total_capacity_m3,
            current_level_m3: r.current_level_m3,
            current_level_percentage: r.current_level_percentage,
            water_quality: r.water_quality,
            last_updated: r.last_updated,
            estimated_runout_date: r.estimated_runout_date,
            is_active: r.is_active,
            description: r.description,
            managed_by: r.managed_by,
            contact_phone: r.contact_phone,
            contact_email: r.contact_email,
            status,
        }
    }
}

/// Counts over active reservoirs. Reservoirs without a percentage count towards
/// `total_reservoirs` only, so the three buckets may sum to less than the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservoirStatistics {
    pub total_reservoirs: u64,
    pub good_reservoirs: u64,
    pub warning_reservoirs: u64,
    pub critical_reservoirs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn draft(capacity: i64, level: i64) -> NewReservoir {
        NewReservoir {
            name: "Ndakaini Dam".into(),
            county: "Nairobi".into(),
            sub_county: "Gatundu North".into(),
            ward: "Ndakaini".into(),
            specific_location: None,
            latitude: -0.9833,
            longitude: 36.8167,
            total_capacity_m3: Decimal::from(capacity),
            current_level_m3: Decimal::from(level),
            water_quality: Some(WaterQuality::Good),
            description: None,
            managed_by: None,
            contact_phone: None,
            contact_email: None,
        }
    }

    #[test]
    fn percentage_of_ndakaini_is_exactly_seventy() {
        let p = derive_percentage(Decimal::from(49_000_000), Decimal::from(70_000_000)).unwrap();
        assert_eq!(p, Decimal::new(7000, 2));
        assert_eq!(derive_status(Some(p)), ReservoirStatus::Good);
    }

    #[test]
    fn percentage_rounds_half_up() {
        // 1 / 8 * 100 = 12.5 -> no rounding needed
        assert_eq!(
            derive_percentage(Decimal::ONE, Decimal::from(8)).unwrap(),
            Decimal::new(1250, 2)
        );
        // 1 / 16 * 100 = 6.25
        assert_eq!(
            derive_percentage(Decimal::ONE, Decimal::from(16)).unwrap(),
            Decimal::new(625, 2)
        );
        // 1 / 32 * 100 = 3.125 -> 3.13
        assert_eq!(
            derive_percentage(Decimal::ONE, Decimal::from(32)).unwrap(),
            Decimal::new(313, 2)
        );
        // 1 / 3 * 100 = 33.333.. -> 33.33
        assert_eq!(
            derive_percentage(Decimal::ONE, Decimal::from(3)).unwrap(),
            Decimal::new(3333, 2)
        );
        // 2 / 3 * 100 = 66.666.. -> 66.67
        assert_eq!(
            derive_percentage(Decimal::from(2), Decimal::from(3)).unwrap(),
            Decimal::new(6667, 2)
        );
    }

    #[test]
    fn percentage_stays_within_bounds() {
        let capacity = Decimal::from(7919);
        for level in [0, 1, 13, 3959, 7918, 7919] {
            let p = derive_percentage(Decimal::from(level), capacity).unwrap();
            assert!(p >= Decimal::ZERO && p <= Decimal::ONE_HUNDRED, "{level} -> {p}");
        }
    }

    #[test]
    fn zero_capacity_is_division_by_zero() {
        for level in [0, 5, -5] {
            let err = derive_percentage(Decimal::from(level), Decimal::ZERO).unwrap_err();
            assert!(matches!(err, AppError::DivisionByZero));
        }
        assert!(matches!(
            derive_percentage(Decimal::ONE, Decimal::from(-10)),
            Err(AppError::DivisionByZero)
        ));
    }

    #[test]
    fn percentage_near_decimal_limit_does_not_overflow() {
        let huge = Decimal::from_i128_with_scale(5 * 10_i128.pow(27), 0);
        assert_eq!(derive_percentage(huge, huge).unwrap(), Decimal::ONE_HUNDRED);

        let half = Decimal::from_i128_with_scale(25 * 10_i128.pow(26), 0);
        assert_eq!(derive_percentage(half, huge).unwrap(), Decimal::from(50));
    }

    #[test]
    fn huge_reservoir_is_built_and_updated() {
        let huge = Decimal::from_i128_with_scale(5 * 10_i128.pow(27), 0);
        let mut d = draft(10, 5);
        d.total_capacity_m3 = huge;
        d.current_level_m3 = huge;

        let mut r = Reservoir::new(d, now()).unwrap();
        assert_eq!(r.current_level_percentage(), Some(Decimal::ONE_HUNDRED));
        assert_eq!(r.estimated_runout_date(), Some(now() + Duration::days(100)));

        r.set_current_level(huge / Decimal::from(4), now()).unwrap();
        assert_eq!(r.current_level_percentage(), Some(Decimal::from(25)));
        assert_eq!(r.status(), ReservoirStatus::Critical);
    }

    #[test]
    fn status_boundaries() {
        assert_eq!(derive_status(Some(Decimal::new(7000, 2))), ReservoirStatus::Good);
        assert_eq!(derive_status(Some(Decimal::new(6999, 2))), ReservoirStatus::Warning);
        assert_eq!(derive_status(Some(Decimal::new(4000, 2))), ReservoirStatus::Warning);
        assert_eq!(derive_status(Some(Decimal::new(3999, 2))), ReservoirStatus::Critical);
        assert_eq!(derive_status(Some(Decimal::ZERO)), ReservoirStatus::Critical);
        assert_eq!(derive_status(None), ReservoirStatus::Unknown);
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("good".parse(), Ok(ReservoirStatus::Good));
        assert_eq!(" Warning ".parse(), Ok(ReservoirStatus::Warning));
        assert_eq!("CRITICAL".parse(), Ok(ReservoirStatus::Critical));
        assert!("full".parse::<ReservoirStatus>().is_err());
    }

    // The horizon does not depend on how much water is left.
    #[test]
    fn runout_is_always_one_hundred_days() {
        for level in [Decimal::new(1, 2), Decimal::ONE, Decimal::from(2_500_000), Decimal::from(70_000_000)] {
            assert_eq!(estimate_runout(level, now()), Some(now() + Duration::days(100)));
        }
    }

    #[test]
    fn empty_reservoir_has_no_runout() {
        assert_eq!(estimate_runout(Decimal::ZERO, now()), None);
        assert_eq!(estimate_runout(Decimal::from(-1), now()), None);
    }

    #[test]
    fn new_reservoir_derives_fields() {
        let r = Reservoir::new(draft(10_000_000, 2_500_000), now()).unwrap();
        assert_eq!(r.id(), None);
        assert!(r.is_active);
        assert_eq!(r.current_level_percentage(), Some(Decimal::new(2500, 2)));
        assert_eq!(r.status(), ReservoirStatus::Critical);
        assert_eq!(r.last_updated(), now());
        assert_eq!(r.estimated_runout_date(), Some(now() + Duration::days(100)));
    }

    #[test]
    fn new_reservoir_rejects_bad_fields() {
        let mut bad_name = draft(100, 10);
        bad_name.name = " x ".into();
        assert!(matches!(
            Reservoir::new(bad_name, now()),
            Err(AppError::InvalidField { field: "name", .. })
        ));

        let mut bad_ward = draft(100, 10);
        bad_ward.ward = "   ".into();
        assert!(matches!(
            Reservoir::new(bad_ward, now()),
            Err(AppError::InvalidField { field: "ward", .. })
        ));

        let mut bad_lat = draft(100, 10);
        bad_lat.latitude = 5.0;
        assert!(matches!(
            Reservoir::new(bad_lat, now()),
            Err(AppError::InvalidField { field: "latitude", .. })
        ));

        let mut bad_lon = draft(100, 10);
        bad_lon.longitude = 32.9;
        assert!(matches!(
            Reservoir::new(bad_lon, now()),
            Err(AppError::InvalidField { field: "longitude", .. })
        ));

        assert!(matches!(
            Reservoir::new(draft(0, 0), now()),
            Err(AppError::InvalidField { field: "totalCapacityM3", .. })
        ));
        assert!(matches!(
            Reservoir::new(draft(100, 101), now()),
            Err(AppError::InvalidLevel { .. })
        ));
    }

    #[test]
    fn set_current_level_updates_derived_fields_together() {
        let mut r = Reservoir::new(draft(10_000_000, 2_500_000), now()).unwrap();
        let later = now() + Duration::hours(6);

        r.set_current_level(Decimal::from(7_500_000), later).unwrap();

        assert_eq!(r.current_level_m3(), Decimal::from(7_500_000));
        assert_eq!(
            r.current_level_percentage(),
            Some(derive_percentage(Decimal::from(7_500_000), Decimal::from(10_000_000)).unwrap())
        );
        assert_eq!(r.status(), ReservoirStatus::Good);
        assert_eq!(r.last_updated(), later);
        assert_eq!(r.estimated_runout_date(), Some(later + Duration::days(100)));
    }

    #[test]
    fn set_current_level_to_zero_clears_runout() {
        let mut r = Reservoir::new(draft(100, 50), now()).unwrap();
        r.set_current_level(Decimal::ZERO, now()).unwrap();
        assert_eq!(r.current_level_percentage(), Some(Decimal::ZERO));
        assert_eq!(r.estimated_runout_date(), None);
    }

    #[test]
    fn set_current_level_rejects_out_of_range_and_leaves_record_untouched() {
        let mut r = Reservoir::new(draft(100, 50), now()).unwrap();
        let later = now() + Duration::days(1);

        let below = r.set_current_level(Decimal::from(-1), later).unwrap_err();
        assert!(matches!(below, AppError::InvalidLevel { .. }));
        assert_eq!(below.kind(), crate::common::error::ErrorKind::Validation);

        let above = r.set_current_level(Decimal::from(101), later).unwrap_err();
        assert!(matches!(above, AppError::InvalidLevel { .. }));

        assert_eq!(r.current_level_m3(), Decimal::from(50));
        assert_eq!(r.current_level_percentage(), Some(Decimal::new(5000, 2)));
        assert_eq!(r.last_updated(), now());
    }

    #[test]
    fn full_reservoir_is_accepted() {
        let mut r = Reservoir::new(draft(100, 0), now()).unwrap();
        r.set_current_level(Decimal::from(100), now()).unwrap();
        assert_eq!(r.current_level_percentage(), Some(Decimal::ONE_HUNDRED));
    }

    #[test]
    fn with_id_is_assigned_once() {
        let r = Reservoir::new(draft(100, 50), now()).unwrap().with_id(4).with_id(9);
        assert_eq!(r.id(), Some(4));
    }

    #[test]
    fn view_carries_status() {
        let r = Reservoir::new(draft(70_000_000, 49_000_000), now()).unwrap();
        let view = ReservoirView::from(r);
        assert_eq!(view.status, ReservoirStatus::Good);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "GOOD");
        assert_eq!(json["subCounty"], "Gatundu North");
    }
}
