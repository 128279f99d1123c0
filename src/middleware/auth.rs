// src/middleware/auth.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;

use crate::{common::error::AppError, config::AppState, models::auth::UserView};

// Extractor for the authenticated user, straight into the handlers.
// Reads `Authorization: Bearer <token>`, verifies it and loads the account.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserView);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::TokenMalformed)?;

        let email = state
            .auth_service
            .tokens()
            .verify(bearer.token(), Utc::now())?;

        // A valid token for an account that no longer exists is still a bad token.
        let user = state
            .auth_service
            .current_user(&email)
            .await
            .map_err(|e| match e {
                AppError::UserNotFound => AppError::TokenMalformed,
                other => other,
            })?;

        Ok(AuthenticatedUser(user))
    }
}
