//! Application request handlers, including bind token and password
//! generation.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use dpm_core::EntityKind;
use dpm_core::auth::jwt::{BindTokenSubject, generate_bind_token};
use dpm_core::auth::password::{generate_passphrase, hash_password, hash_token};
use dpm_core::codes;
use dpm_core::models::{Application, ApplicationDraft, Page};
use dpm_core::validation::Validate;
use tracing::info;

use super::ListQuery;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::access::Principal;
use crate::store::Store;

/// The application, if the caller may administer it.
fn managed_application(
    store: &Store,
    user: &AuthenticatedUser,
    id: i64,
) -> AppResult<(Principal, Application)> {
    let app = store.application(id)?;
    let principal = Principal::resolve(store, &user.0);
    principal.require_view(app.group, codes::APPLICATION_NOT_FOUND)?;
    principal.require_manage(EntityKind::Application, app.group)?;
    Ok((principal, app))
}

/// `GET /api/applications`
pub async fn list_applications_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Application>>> {
    let store = state.store.read().await;
    let principal = Principal::resolve(&store, &user.0);
    let rows = store
        .applications()
        .into_iter()
        .filter(|a| principal.can_view(a.group) && query.in_group(a.group))
        .collect();
    Ok(Json(query.finish(rows)))
}

/// `GET /api/applications/{id}`
pub async fn show_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Application>> {
    let store = state.store.read().await;
    let app = store.application(id)?;
    Principal::resolve(&store, &user.0).require_view(app.group, codes::APPLICATION_NOT_FOUND)?;
    Ok(Json(app))
}

/// `POST /api/applications`
pub async fn create_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ApplicationDraft>,
) -> AppResult<Json<Application>> {
    body.validate()?;
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_manage(EntityKind::Application, body.group)?;
    let app = store.create_application(&body)?;
    info!(id = app.id, name = %app.name, group = app.group, "application created");
    Ok(Json(app))
}

/// `PUT /api/applications/{id}`: the group association cannot change.
pub async fn update_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<ApplicationDraft>,
) -> AppResult<Json<Application>> {
    let mut store = state.store.write().await;
    managed_application(&store, &user, id)?;
    let app = store.update_application(id, &body)?;
    info!(id, name = %app.name, "application updated");
    Ok(Json(app))
}

/// `DELETE /api/applications/{id}`
pub async fn delete_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let mut store = state.store.write().await;
    managed_application(&store, &user, id)?;
    store.delete_application(id)?;
    info!(id, "application deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/applications/{id}/bind-token`: issue a new bind token as plain
/// text. The previous token stops being accepted.
pub async fn generate_bind_token_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<String> {
    let mut store = state.store.write().await;
    let (principal, app) = managed_application(&store, &user, id)?;
    let subject = BindTokenSubject {
        application_id: app.id,
        application_name: &app.name,
        group_id: app.group,
        group_name: &app.group_name,
        issued_by: &principal.email,
    };
    let (token, claims) = generate_bind_token(
        &subject,
        state.config.bind_token_expiry_hours,
        state.config.jwt_secret.as_bytes(),
    )?;
    store.set_bind_token_hash(id, hash_token(&token))?;
    info!(id, jti = %claims.jti, "bind token rotated");
    Ok(token)
}

/// `POST /api/applications/{id}/password`: issue a new passphrase as plain
/// text. Only its bcrypt hash is kept.
pub async fn generate_password_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<String> {
    managed_application(&*state.store.read().await, &user, id)?;
    let passphrase = generate_passphrase();
    let hash = hash_password(&passphrase)?;
    state
        .store
        .write()
        .await
        .set_application_password(id, hash)?;
    info!(id, "application password rotated");
    Ok(passphrase)
}
