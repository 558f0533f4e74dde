//! Super user request handlers. Every route is restricted to super users.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use dpm_core::models::{Page, SuperUser, SuperUserDraft};
use dpm_core::validation::Validate;
use tracing::info;

use super::ListQuery;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::access::Principal;

/// `GET /api/super-users`
pub async fn list_super_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<SuperUser>>> {
    let store = state.store.read().await;
    Principal::resolve(&store, &user.0).require_admin()?;
    Ok(Json(query.finish(store.super_users())))
}

/// `GET /api/super-users/{id}`
pub async fn show_super_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<SuperUser>> {
    let store = state.store.read().await;
    Principal::resolve(&store, &user.0).require_admin()?;
    Ok(Json(store.super_user(id)?))
}

/// `POST /api/super-users`
pub async fn create_super_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<SuperUserDraft>,
) -> AppResult<Json<SuperUser>> {
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_admin()?;
    body.validate()?;
    let created = store.create_super_user(&body)?;
    info!(id = created.id, email = %created.email, "super user created");
    Ok(Json(created))
}

/// `PUT /api/super-users/{id}`
pub async fn update_super_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<SuperUserDraft>,
) -> AppResult<Json<SuperUser>> {
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_admin()?;
    let updated = store.update_super_user(id, &body)?;
    info!(id, email = %updated.email, "super user updated");
    Ok(Json(updated))
}

/// `DELETE /api/super-users/{id}`
pub async fn delete_super_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_admin()?;
    store.delete_super_user(id)?;
    info!(id, "super user deleted");
    Ok(StatusCode::NO_CONTENT)
}
