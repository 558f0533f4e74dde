//! Group membership ("user") request handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use dpm_core::EntityKind;
use dpm_core::codes;
use dpm_core::models::{Page, User, UserDraft};
use dpm_core::validation::Validate;
use tracing::info;

use super::ListQuery;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::access::Principal;

/// `GET /api/users`: memberships of every group visible to the caller.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<User>>> {
    let store = state.store.read().await;
    let principal = Principal::resolve(&store, &user.0);
    let rows = store
        .users()
        .into_iter()
        .filter(|u| principal.can_view(u.group) && query.in_group(u.group))
        .collect();
    Ok(Json(query.finish(rows)))
}

/// `GET /api/users/{id}`
pub async fn show_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let store = state.store.read().await;
    let member = store.user(id)?;
    Principal::resolve(&store, &user.0)
        .require_view(member.group, codes::GROUP_MEMBERSHIP_NOT_FOUND)?;
    Ok(Json(member))
}

/// `POST /api/users`: add a membership to the draft's group.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<UserDraft>,
) -> AppResult<Json<User>> {
    body.validate()?;
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_manage(EntityKind::User, body.group)?;
    let member = store.create_user(&body)?;
    info!(id = member.id, group = member.group, email = %member.email, "membership created");
    Ok(Json(member))
}

/// `PUT /api/users/{id}`: email and admin flags.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<UserDraft>,
) -> AppResult<Json<User>> {
    let mut store = state.store.write().await;
    let existing = store.user(id)?;
    let principal = Principal::resolve(&store, &user.0);
    principal.require_view(existing.group, codes::GROUP_MEMBERSHIP_NOT_FOUND)?;
    principal.require_manage(EntityKind::User, existing.group)?;
    let member = store.update_user(id, &body)?;
    info!(
        id,
        group_admin = member.is_group_admin,
        topic_admin = member.is_topic_admin,
        application_admin = member.is_application_admin,
        "membership updated"
    );
    Ok(Json(member))
}

/// `DELETE /api/users/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let mut store = state.store.write().await;
    let existing = store.user(id)?;
    let principal = Principal::resolve(&store, &user.0);
    principal.require_view(existing.group, codes::GROUP_MEMBERSHIP_NOT_FOUND)?;
    principal.require_manage(EntityKind::User, existing.group)?;
    store.delete_user(id)?;
    info!(id, "membership deleted");
    Ok(StatusCode::NO_CONTENT)
}
