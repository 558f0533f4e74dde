//! Token and credential helpers shared by the backend and its tests.
//!
//! Access tokens and application bind tokens are HS256 JWTs; human and
//! application passwords are bcrypt hashes.

pub mod jwt;
pub mod password;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
