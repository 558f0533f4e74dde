//! Authentication middleware: token extraction, JWT verification and the
//! revocation check.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use dpm_core::auth::jwt::verify_access_token;
use dpm_core::models::auth::TokenClaims;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::JWT_COOKIE;

/// Key used to store `TokenClaims` in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

/// Raw token from `Authorization: Bearer` or, failing that, the `JWT` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(JWT_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Verified, unrevoked claims for the request, if any.
pub async fn current_claims(state: &AppState, headers: &HeaderMap) -> Option<TokenClaims> {
    let token = extract_token(headers)?;
    let claims = verify_access_token(&token, state.config.jwt_secret.as_bytes())?;
    if state.store.read().await.is_revoked(&claims.jti) {
        return None;
    }
    Some(claims)
}

/// Axum middleware: rejects the request with 401 unless it carries a valid
/// session, then injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = current_claims(&state, request.headers())
        .await
        .ok_or_else(|| AppError::Unauthorized("Missing, invalid or expired token".into()))?;

    request.extensions_mut().insert(AuthenticatedUser(claims));

    Ok(next.run(request).await)
}
