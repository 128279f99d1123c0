// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

/// Coarse classification of every [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Auth,
    Arithmetic,
    Store,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("invalid field `{field}`: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("invalid water level {level}: must be between 0 and {capacity}")]
    InvalidLevel { level: Decimal, capacity: Decimal },

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("reservoir {0} not found")]
    ReservoirNotFound(i64),

    #[error("user not found")]
    UserNotFound,

    #[error("a user with this email already exists")]
    EmailTaken,

    // Same error for an unknown email and a wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("malformed token")]
    TokenMalformed,

    #[error("token expired")]
    TokenExpired,

    #[error("division by zero: total capacity must be greater than zero")]
    DivisionByZero,

    #[error("percentage is outside the decimal range")]
    PercentageOverflow,

    #[error("database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("bcrypt error: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("internal server error")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidField { .. }
            | AppError::InvalidLevel { .. }
            | AppError::PasswordMismatch => ErrorKind::Validation,
            AppError::ReservoirNotFound(_) | AppError::UserNotFound => ErrorKind::NotFound,
            AppError::EmailTaken => ErrorKind::Conflict,
            AppError::InvalidCredentials | AppError::TokenMalformed | AppError::TokenExpired => {
                ErrorKind::Auth
            }
            AppError::DivisionByZero | AppError::PercentageOverflow => ErrorKind::Arithmetic,
            AppError::DatabaseError(_)
            | AppError::BcryptError(_)
            | AppError::InternalServerError(_) => ErrorKind::Store,
        }
    }

    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidField {
            field,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Payload validation returns every field error, not just a summary.
        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "One or more fields are invalid.",
                "details": details,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let status = match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Arithmetic | ErrorKind::Store => {
                tracing::error!("internal server error: {:?}", self);
                let body = Json(json!({ "error": "An unexpected error occurred." }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
