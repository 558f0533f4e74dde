//! JWT generation and verification for access and bind tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};

use super::AuthError;
use crate::models::auth::{BindTokenClaims, TokenClaims};

/// Access token lifetime: 1 hour.
pub const ACCESS_TOKEN_EXPIRY_SECS: i64 = 60 * 60;

/// Random alphanumeric string, used for token ids and generated secrets.
pub fn random_id(len: usize) -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generate a signed access token (HS256).
pub fn generate_access_token(
    subject: &str,
    name: &str,
    roles: &[String],
    secret: &[u8],
) -> Result<(String, TokenClaims), AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: subject.to_string(),
        name: name.to_string(),
        roles: roles.to_vec(),
        exp: (now + Duration::seconds(ACCESS_TOKEN_EXPIRY_SECS)).timestamp(),
        iat: now.timestamp(),
        jti: random_id(24),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))?;
    Ok((token, claims))
}

/// Verify an access token, returning the claims on success.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Option<TokenClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<TokenClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Everything a bind token asserts besides its timestamps.
#[derive(Debug, Clone)]
pub struct BindTokenSubject<'a> {
    pub application_id: i64,
    pub application_name: &'a str,
    pub group_id: i64,
    pub group_name: &'a str,
    pub issued_by: &'a str,
}

/// Generate an application bind token valid for `expiry_hours`.
pub fn generate_bind_token(
    subject: &BindTokenSubject<'_>,
    expiry_hours: i64,
    secret: &[u8],
) -> Result<(String, BindTokenClaims), AuthError> {
    let now = Utc::now();
    let claims = BindTokenClaims {
        sub: subject.application_id.to_string(),
        email: subject.issued_by.to_string(),
        app_name: subject.application_name.to_string(),
        group_id: subject.group_id,
        group_name: subject.group_name.to_string(),
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
        iat: now.timestamp(),
        jti: random_id(24),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("bind token encode: {e}")))?;
    Ok((token, claims))
}

/// Verify a bind token, returning the claims on success.
pub fn verify_bind_token(token: &str, secret: &[u8]) -> Option<BindTokenClaims> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<BindTokenClaims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}
