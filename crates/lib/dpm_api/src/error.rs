//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dpm_core::auth::{AuthError, jwt::random_id};
use dpm_core::codes;
use dpm_core::models::ErrorResponse;
use dpm_core::validation::ValidationError;
use thiserror::Error;
use tracing::{debug, error};

use crate::store::StoreError;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    fn status_and_codes(&self) -> (StatusCode, Vec<&'static str>) {
        match self {
            AppError::Validation(codes) => (StatusCode::BAD_REQUEST, codes.clone()),
            AppError::NotFound(code) => (StatusCode::NOT_FOUND, vec![*code]),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, vec![codes::UNAUTHORIZED]),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, vec![codes::UNAUTHORIZED]),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, vec![codes::BAD_REQUEST]),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, codes) = self.status_and_codes();
        let id = random_id(12);
        match &self {
            AppError::Internal(msg) => error!(%id, %msg, "request failed"),
            other => debug!(%id, status = status.as_u16(), error = %other, "request rejected"),
        }
        let body: Vec<ErrorResponse> = codes
            .into_iter()
            .map(|code| ErrorResponse {
                id: id.clone(),
                code: code.to_string(),
            })
            .collect();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Invalid(codes) => AppError::Validation(codes),
            StoreError::NotFound(code) => AppError::NotFound(code),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.codes)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::CredentialError => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::TokenError(msg) => AppError::Unauthorized(msg),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
