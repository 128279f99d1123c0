// src/services/seed.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{ReservoirStore, UserStore},
    models::{
        auth::UserRole,
        reservoir::{NewReservoir, Reservoir, WaterQuality},
    },
    services::auth::AuthService,
};

struct SampleReservoir {
    name: &'static str,
    county: &'static str,
    sub_county: &'static str,
    ward: &'static str,
    latitude: f64,
    longitude: f64,
    capacity_m3: i64,
    level_m3: i64,
    quality: WaterQuality,
    managed_by: &'static str,
    description: &'static str,
    phone: &'static str,
    email: &'static str,
}

const SAMPLE_RESERVOIRS: &[SampleReservoir] = &[
    SampleReservoir {
        name: "Ndakaini Dam",
        county: "Nairobi",
        sub_county: "Gatundu North",
        ward: "Ndakaini",
        latitude: -0.9833,
        longitude: 36.8167,
        capacity_m3: 70_000_000,
        level_m3: 49_000_000,
        quality: WaterQuality::Good,
        managed_by: "Nairobi Water and Sewerage Company",
        description: "Nairobi's main water source",
        phone: "+254-20-123456",
        email: "info@nairobiwater.co.ke",
    },
    SampleReservoir {
        name: "Ruiru Dam",
        county: "Nairobi",
        sub_county: "Ruiru",
        ward: "Ruiru",
        latitude: -1.15,
        longitude: 36.95,
        capacity_m3: 15_000_000,
        level_m3: 9_000_000,
        quality: WaterQuality::Good,
        managed_by: "Nairobi Water and Sewerage Company",
        description: "Secondary water source for Nairobi",
        phone: "+254-20-123457",
        email: "info@nairobiwater.co.ke",
    },
    SampleReservoir {
        name: "Karimenu II Dam",
        county: "Kiambu",
        sub_county: "Gatundu North",
        ward: "Karimenu",
        latitude: -1.0167,
        longitude: 36.8167,
        capacity_m3: 26_000_000,
        level_m3: 18_200_000,
        quality: WaterQuality::Excellent,
        managed_by: "Athwater Limited",
        description: "Major water project for Nairobi metropolitan",
        phone: "+254-20-123458",
        email: "info@athwater.co.ke",
    },
    SampleReservoir {
        name: "Lake Nakuru",
        county: "Nakuru",
        sub_county: "Nakuru East",
        ward: "Nakuru East",
        latitude: -0.3667,
        longitude: 36.0833,
        capacity_m3: 100_000_000,
        level_m3: 35_000_000,
        quality: WaterQuality::Fair,
        managed_by: "Nakuru Water and Sanitation Company",
        description: "Natural lake with water treatment",
        phone: "+254-51-123456",
        email: "info@nakuruwater.co.ke",
    },
    SampleReservoir {
        name: "Mbaraki Reservoir",
        county: "Mombasa",
        sub_county: "Mvita",
        ward: "Mbaraki",
        latitude: -4.05,
        longitude: 39.6667,
        capacity_m3: 50_000_000,
        level_m3: 20_000_000,
        quality: WaterQuality::Good,
        managed_by: "Mombasa Water and Sanitation Company",
        description: "Main water storage for Mombasa",
        phone: "+254-41-123456",
        email: "info@mombasawater.co.ke",
    },
    SampleReservoir {
        name: "Kisumu Water Works",
        county: "Kisumu",
        sub_county: "Kisumu Central",
        ward: "Kisumu Central",
        latitude: -0.1,
        longitude: 34.75,
        capacity_m3: 30_000_000,
        level_m3: 12_000_000,
        quality: WaterQuality::Good,
        managed_by: "Kisumu Water and Sanitation Company",
        description: "Water treatment and storage facility",
        phone: "+254-57-123456",
        email: "info@kisumuwater.co.ke",
    },
    SampleReservoir {
        name: "Eldoret Dam",
        county: "Uasin Gishu",
        sub_county: "Eldoret East",
        ward: "Eldoret East",
        latitude: 0.5167,
        longitude: 35.2833,
        capacity_m3: 25_000_000,
        level_m3: 8_750_000,
        quality: WaterQuality::Good,
        managed_by: "Eldoret Water and Sanitation Company",
        description: "Water storage for Eldoret town",
        phone: "+254-53-123456",
        email: "info@eldoretwater.co.ke",
    },
    SampleReservoir {
        name: "Thika High Level Dam",
        county: "Kiambu",
        sub_county: "Thika Town",
        ward: "Thika Town",
        latitude: -1.0333,
        longitude: 37.0833,
        capacity_m3: 40_000_000,
        level_m3: 28_000_000,
        quality: WaterQuality::Excellent,
        managed_by: "Thika Water and Sewerage Company",
        description: "High-level water storage for Thika",
        phone: "+254-67-123456",
        email: "info@thikawater.co.ke",
    },
    SampleReservoir {
        name: "Chania Dam",
        county: "Nyeri",
        sub_county: "Nyeri Central",
        ward: "Nyeri Central",
        latitude: -0.4167,
        longitude: 36.95,
        capacity_m3: 20_000_000,
        level_m3: 8_000_000,
        quality: WaterQuality::Good,
        managed_by: "Nyeri Water and Sanitation Company",
        description: "Water storage for Nyeri town",
        phone: "+254-61-123456",
        email: "info@nyeriwater.co.ke",
    },
    SampleReservoir {
        name: "Machakos Water Works",
        county: "Machakos",
        sub_county: "Machakos Town",
        ward: "Machakos Town",
        latitude: -1.5167,
        longitude: 37.2667,
        capacity_m3: 15_000_000,
        level_m3: 6_000_000,
        quality: WaterQuality::Fair,
        managed_by: "Machakos Water and Sanitation Company",
        description: "Water treatment and storage",
        phone: "+254-44-123456",
        email: "info@machakoswater.co.ke",
    },
    SampleReservoir {
        name: "Kitui Dam",
        county: "Kitui",
        sub_county: "Kitui Central",
        ward: "Kitui Central",
        latitude: -1.3667,
        longitude: 38.0167,
        capacity_m3: 10_000_000,
        level_m3: 2_500_000,
        quality: WaterQuality::Critical,
        managed_by: "Kitui Water and Sanitation Company",
        description: "Severely low water levels",
        phone: "+254-44-123457",
        email: "info@kituiwater.co.ke",
    },
    SampleReservoir {
        name: "Garissa Reservoir",
        county: "Garissa",
        sub_county: "Garissa Township",
        ward: "Garissa Township",
        latitude: -0.45,
        longitude: 39.65,
        capacity_m3: 8_000_000,
        level_m3: 1_600_000,
        quality: WaterQuality::Critical,
        managed_by: "Garissa Water and Sanitation Company",
        description: "Critical water shortage",
        phone: "+254-46-123456",
        email: "info@garissawater.co.ke",
    },
];

impl SampleReservoir {
    fn to_draft(&self) -> NewReservoir {
        NewReservoir {
            name: self.name.to_string(),
            county: self.county.to_string(),
            sub_county: self.sub_county.to_string(),
            ward: self.ward.to_string(),
            specific_location: None,
            latitude: self.latitude,
            longitude: self.longitude,
            total_capacity_m3: Decimal::from(self.capacity_m3),
            current_level_m3: Decimal::from(self.level_m3),
            water_quality: Some(self.quality),
            description: Some(self.description.to_string()),
            managed_by: Some(self.managed_by.to_string()),
            contact_phone: Some(self.phone.to_string()),
            contact_email: Some(self.email.to_string()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub reservoirs: usize,
    pub users: usize,
}

/// Fills empty stores with the sample Kenyan reservoirs and two accounts
/// (an admin and a regular user). Stores that already hold data are left alone.
pub async fn seed_sample_data(
    reservoir_store: &dyn ReservoirStore,
    user_store: &dyn UserStore,
    auth: &AuthService,
    now: DateTime<Utc>,
) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    if user_store.count().await? == 0 {
        auth.create_account("Admin User", "admin@waterapp.ke", "admin123", UserRole::Admin)
            .await?;
        auth.create_account("John Doe", "john@example.com", "password123", UserRole::User)
            .await?;
        report.users = 2;
    }

    if reservoir_store.count().await? == 0 {
        for sample in SAMPLE_RESERVOIRS {
            let reservoir = Reservoir::new(sample.to_draft(), now)?;
            reservoir_store.save(reservoir).await?;
            report.reservoirs += 1;
        }
    }

    tracing::info!(
        reservoirs = report.reservoirs,
        users = report.users,
        "sample data seeded"
    );
    Ok(report)
}
