//! Session request handlers: login, token introspection and logout.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use dpm_core::auth::AuthError;
use dpm_core::auth::jwt::{ACCESS_TOKEN_EXPIRY_SECS, generate_access_token};
use dpm_core::auth::password::verify_password;
use dpm_core::models::auth::{ROLE_ADMIN, ROLE_APPLICATION, ROLE_USER};
use dpm_core::models::{LoginRequest, LoginResponse, TokenInfo};
use tracing::{info, warn};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::current_claims;
use crate::services::access::Principal;
use crate::services::cookies::{clear_jwt_cookie, jwt_cookie};

struct Authenticated {
    subject: String,
    name: String,
    roles: Vec<String>,
}

/// Humans log in with their email (or its unique local part) and the dev
/// password; applications with their id and generated password.
async fn authenticate(state: &AppState, body: &LoginRequest) -> AppResult<Authenticated> {
    let store = state.store.read().await;
    if let Some(email) = store.find_principal(&body.username) {
        if body.password != state.config.dev_password {
            return Err(AuthError::CredentialError.into());
        }
        let mut roles = vec![ROLE_USER.to_string()];
        if store.is_super_user(&email) {
            roles.insert(0, ROLE_ADMIN.to_string());
        }
        return Ok(Authenticated {
            subject: email.clone(),
            name: email,
            roles,
        });
    }

    let application = body.username.trim().parse::<i64>().ok().and_then(|id| {
        let hash = store.application_password_hash(id)?.to_string();
        let name = store.application(id).ok()?.name;
        Some((id, name, hash))
    });
    drop(store);

    if let Some((id, name, hash)) = application
        && verify_password(&body.password, &hash)?
    {
        return Ok(Authenticated {
            subject: id.to_string(),
            name,
            roles: vec![ROLE_APPLICATION.to_string()],
        });
    }
    Err(AuthError::CredentialError.into())
}

/// `POST /api/login`: authenticate, set the `JWT` cookie and return the token.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let principal = authenticate(&state, &body).await.inspect_err(|_| {
        warn!(username = %body.username, "login rejected");
    })?;
    let (token, _) = generate_access_token(
        &principal.subject,
        &principal.name,
        &principal.roles,
        state.config.jwt_secret.as_bytes(),
    )?;
    info!(subject = %principal.subject, roles = ?principal.roles, "login");
    let jar = jar.add(jwt_cookie(&token, ACCESS_TOKEN_EXPIRY_SECS));
    Ok((
        jar,
        Json(LoginResponse {
            username: principal.name,
            access_token: token,
            token_type: "Bearer".into(),
            expires_in: ACCESS_TOKEN_EXPIRY_SECS,
            roles: principal.roles,
        }),
    ))
}

/// `GET /api/token_info`: introspect the current session; 204 without one.
pub async fn token_info_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(claims) = current_claims(&state, &headers).await else {
        return StatusCode::NO_CONTENT.into_response();
    };
    let store = state.store.read().await;
    let principal = Principal::resolve(&store, &claims);
    let mut roles: Vec<String> = claims
        .roles
        .iter()
        .filter(|r| r.as_str() != ROLE_ADMIN)
        .cloned()
        .collect();
    if principal.admin {
        roles.insert(0, ROLE_ADMIN.to_string());
    }
    Json(TokenInfo {
        active: true,
        name: Some(claims.name),
        sub: Some(claims.sub),
        roles,
        is_admin: None,
        permissions_by_group: principal.permissions,
        exp: Some(claims.exp),
    })
    .into_response()
}

/// `GET /api/logout`: revoke the presented token and clear the cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, StatusCode) {
    if let Some(claims) = current_claims(&state, &headers).await {
        state.store.write().await.revoke(&claims.jti, claims.exp);
        info!(subject = %claims.sub, "logout");
    }
    (jar.add(clear_jwt_cookie()), StatusCode::OK)
}
