// src/handlers/reservoirs.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::reservoir::{NewReservoir, ReservoirStatistics, ReservoirView},
};

// ---
// Query strings
// ---

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Matched against name, county, sub-county and ward.
    #[serde(default)]
    pub search: String,
}

fn default_radius_km() -> f64 {
    10.0
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Kilometres, defaults to 10.
    #[serde(default = "default_radius_km")]
    pub radius: f64,
}

fn default_days() -> u32 {
    30
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RunningOutQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct WaterLevelQuery {
    #[param(value_type = f64)]
    pub current_level: Decimal,
}

// ---
// Handlers
// ---

#[utoipa::path(
    get,
    path = "/api/reservoirs",
    tag = "Reservoirs",
    responses((status = 200, description = "All active reservoirs", body = Vec<ReservoirView>))
)]
pub async fn get_all_reservoirs(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(app_state.reservoir_service.get_all().await?))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/{id}",
    tag = "Reservoirs",
    params(("id" = i64, Path, description = "Reservoir id")),
    responses(
        (status = 200, description = "The reservoir", body = ReservoirView),
        (status = 404, description = "No such reservoir")
    )
)]
pub async fn get_reservoir_by_id(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReservoirView>, AppError> {
    Ok(Json(app_state.reservoir_service.get_by_id(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/search",
    tag = "Reservoirs",
    params(SearchQuery),
    responses((status = 200, description = "Matching active reservoirs", body = Vec<ReservoirView>))
)]
pub async fn search_reservoirs(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(
        app_state
            .reservoir_service
            .search_free_text(&query.search)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/county/{county}",
    tag = "Reservoirs",
    params(("county" = String, Path, description = "County, case-insensitive")),
    responses((status = 200, description = "Reservoirs in the county", body = Vec<ReservoirView>))
)]
pub async fn get_reservoirs_by_county(
    State(app_state): State<AppState>,
    Path(county): Path<String>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(app_state.reservoir_service.by_county(&county).await?))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/subcounty/{sub_county}",
    tag = "Reservoirs",
    params(("sub_county" = String, Path, description = "Sub-county, case-insensitive")),
    responses((status = 200, description = "Reservoirs in the sub-county", body = Vec<ReservoirView>))
)]
pub async fn get_reservoirs_by_sub_county(
    State(app_state): State<AppState>,
    Path(sub_county): Path<String>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(
        app_state.reservoir_service.by_sub_county(&sub_county).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/ward/{ward}",
    tag = "Reservoirs",
    params(("ward" = String, Path, description = "Ward, case-insensitive")),
    responses((status = 200, description = "Reservoirs in the ward", body = Vec<ReservoirView>))
)]
pub async fn get_reservoirs_by_ward(
    State(app_state): State<AppState>,
    Path(ward): Path<String>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(app_state.reservoir_service.by_ward(&ward).await?))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/name/{name}",
    tag = "Reservoirs",
    params(("name" = String, Path, description = "Part of the reservoir name")),
    responses((status = 200, description = "Active reservoirs whose name matches", body = Vec<ReservoirView>))
)]
pub async fn get_reservoirs_by_name(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(app_state.reservoir_service.by_name_contains(&name).await?))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/status/{status}",
    tag = "Reservoirs",
    params(("status" = String, Path, description = "GOOD, WARNING, CRITICAL or UNKNOWN")),
    responses((status = 200, description = "Active reservoirs with that status", body = Vec<ReservoirView>))
)]
pub async fn get_reservoirs_by_status(
    State(app_state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(app_state.reservoir_service.by_status(&status).await?))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/nearby",
    tag = "Reservoirs",
    params(NearbyQuery),
    responses((status = 200, description = "Reservoirs within the radius", body = Vec<ReservoirView>))
)]
pub async fn get_reservoirs_nearby(
    State(app_state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(
        app_state
            .reservoir_service
            .within_radius(query.latitude, query.longitude, query.radius)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/critical",
    tag = "Reservoirs",
    responses((status = 200, description = "Active reservoirs below 40%", body = Vec<ReservoirView>))
)]
pub async fn get_critical_reservoirs(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(app_state.reservoir_service.critical().await?))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/running-out",
    tag = "Reservoirs",
    params(RunningOutQuery),
    responses((status = 200, description = "Active reservoirs with a runout estimate", body = Vec<ReservoirView>))
)]
pub async fn get_reservoirs_running_out(
    State(app_state): State<AppState>,
    Query(query): Query<RunningOutQuery>,
) -> Result<Json<Vec<ReservoirView>>, AppError> {
    Ok(Json(
        app_state
            .reservoir_service
            .running_out_soon(query.days)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/reservoirs/statistics",
    tag = "Reservoirs",
    responses((status = 200, description = "Status counts over active reservoirs", body = ReservoirStatistics))
)]
pub async fn get_reservoir_statistics(
    State(app_state): State<AppState>,
) -> Result<Json<ReservoirStatistics>, AppError> {
    Ok(Json(app_state.reservoir_service.statistics().await?))
}

#[utoipa::path(
    post,
    path = "/api/reservoirs",
    tag = "Reservoirs",
    request_body = NewReservoir,
    responses(
        (status = 201, description = "Reservoir created", body = ReservoirView),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Not authenticated")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_reservoir(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<NewReservoir>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state
        .reservoir_service
        .create(payload, Utc::now())
        .await?;
    tracing::info!(user_id = user.id, reservoir_id = created.id, "reservoir added");

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/reservoirs/{id}/water-level",
    tag = "Reservoirs",
    params(("id" = i64, Path, description = "Reservoir id"), WaterLevelQuery),
    responses(
        (status = 200, description = "Updated reservoir", body = ReservoirView),
        (status = 400, description = "Level below zero or above capacity"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "No such reservoir")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_water_level(
    State(app_state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<i64>,
    Query(query): Query<WaterLevelQuery>,
) -> Result<Json<ReservoirView>, AppError> {
    Ok(Json(
        app_state
            .reservoir_service
            .update_water_level(id, query.current_level, Utc::now())
            .await?,
    ))
}

pub async fn health() -> &'static str {
    "Water Reservoir Service is running!"
}
