// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Reservoirs ---
        handlers::reservoirs::get_all_reservoirs,
        handlers::reservoirs::get_reservoir_by_id,
        handlers::reservoirs::search_reservoirs,
        handlers::reservoirs::get_reservoirs_by_county,
        handlers::reservoirs::get_reservoirs_by_sub_county,
        handlers::reservoirs::get_reservoirs_by_ward,
        handlers::reservoirs::get_reservoirs_by_name,
        handlers::reservoirs::get_reservoirs_by_status,
        handlers::reservoirs::get_reservoirs_nearby,
        handlers::reservoirs::get_critical_reservoirs,
        handlers::reservoirs::get_reservoirs_running_out,
        handlers::reservoirs::get_reservoir_statistics,
        handlers::reservoirs::create_reservoir,
        handlers::reservoirs::update_water_level,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::UserView,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Reservoirs ---
            models::reservoir::WaterQuality,
            models::reservoir::ReservoirStatus,
            models::reservoir::NewReservoir,
            models::reservoir::ReservoirView,
            models::reservoir::ReservoirStatistics,
        )
    ),
    tags(
        (name = "Auth", description = "Sign-up and login"),
        (name = "Users", description = "The authenticated account"),
        (name = "Reservoirs", description = "Reservoir levels, search and statistics")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
