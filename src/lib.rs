// src/lib.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;

/// The full HTTP surface: auth, users, reservoirs and the Swagger UI.
pub fn build_router(app_state: AppState) -> Router {
    // Public
    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/health", get(handlers::auth::health));

    // Bearer token required, enforced by the `AuthenticatedUser` extractor
    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let reservoir_routes = Router::new()
        .route(
            "/",
            get(handlers::reservoirs::get_all_reservoirs)
                .post(handlers::reservoirs::create_reservoir),
        )
        .route("/search", get(handlers::reservoirs::search_reservoirs))
        .route("/county/{county}", get(handlers::reservoirs::get_reservoirs_by_county))
        .route(
            "/subcounty/{sub_county}",
            get(handlers::reservoirs::get_reservoirs_by_sub_county),
        )
        .route("/ward/{ward}", get(handlers::reservoirs::get_reservoirs_by_ward))
        .route("/name/{name}", get(handlers::reservoirs::get_reservoirs_by_name))
        .route("/status/{status}", get(handlers::reservoirs::get_reservoirs_by_status))
        .route("/nearby", get(handlers::reservoirs::get_reservoirs_nearby))
        .route("/critical", get(handlers::reservoirs::get_critical_reservoirs))
        .route("/running-out", get(handlers::reservoirs::get_reservoirs_running_out))
        .route("/statistics", get(handlers::reservoirs::get_reservoir_statistics))
        .route("/health", get(handlers::reservoirs::health))
        .route("/{id}", get(handlers::reservoirs::get_reservoir_by_id))
        .route(
            "/{id}/water-level",
            put(handlers::reservoirs::update_water_level),
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/reservoirs", reservoir_routes)
        .with_state(app_state)
}
