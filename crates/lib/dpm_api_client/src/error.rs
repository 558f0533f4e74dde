//! Client error taxonomy.
//!
//! Validation and not-found errors belong next to the form or row that
//! triggered them. `Forbidden` is a refused action inside a live session and
//! is shown the same way. `Auth` means the session is gone; the client has
//! already cleared it. `Network` leaves whatever was last rendered in place.

use dpm_core::models::ErrorResponse;
use dpm_core::validation::ValidationError;
use reqwest::StatusCode;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("not found: {}", .0.join(", "))]
    NotFound(Vec<String>),

    #[error("not permitted: {}", .0.join(", "))]
    Forbidden(Vec<String>),

    #[error("not authenticated")]
    Auth,

    #[error("request failed to complete: {0}")]
    Network(#[source] reqwest::Error),

    #[error("unexpected response {status}: {body}")]
    Unexpected { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Map a failed response to the taxonomy. The body is the backend's
    /// `[{id, code}]` array when it has one.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => ClientError::Validation(response_codes(&body)),
            StatusCode::NOT_FOUND => ClientError::NotFound(response_codes(&body)),
            StatusCode::UNAUTHORIZED => ClientError::Auth,
            StatusCode::FORBIDDEN => ClientError::Forbidden(response_codes(&body)),
            _ => ClientError::Unexpected {
                status: status.as_u16(),
                body,
            },
        }
    }

    /// Response codes carried by validation, not-found and forbidden errors.
    pub fn codes(&self) -> &[String] {
        match self {
            ClientError::Validation(codes)
            | ClientError::NotFound(codes)
            | ClientError::Forbidden(codes) => codes,
            _ => &[],
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth)
    }
}

fn response_codes(body: &str) -> Vec<String> {
    serde_json::from_str::<Vec<ErrorResponse>>(body)
        .map(|errors| errors.into_iter().map(|e| e.code).collect())
        .unwrap_or_default()
}

impl From<ValidationError> for ClientError {
    fn from(e: ValidationError) -> Self {
        ClientError::Validation(e.codes.into_iter().map(str::to_string).collect())
    }
}
