//! Group request handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use dpm_core::EntityKind;
use dpm_core::codes;
use dpm_core::models::{Group, GroupDraft, Page};
use dpm_core::validation::Validate;
use tracing::info;

use super::ListQuery;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::access::Principal;

/// `GET /api/groups`: groups visible to the caller, by name.
pub async fn list_groups_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Group>>> {
    let store = state.store.read().await;
    let principal = Principal::resolve(&store, &user.0);
    let rows = store
        .groups()
        .into_iter()
        .filter(|g| principal.can_view(g.id) && query.in_group(g.id))
        .collect();
    Ok(Json(query.finish(rows)))
}

/// `GET /api/groups/{id}`
pub async fn show_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Group>> {
    let store = state.store.read().await;
    Principal::resolve(&store, &user.0).require_view(id, codes::GROUP_NOT_FOUND)?;
    Ok(Json(store.group(id)?))
}

/// `POST /api/groups`: super users only.
pub async fn create_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<GroupDraft>,
) -> AppResult<Json<Group>> {
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_admin()?;
    body.validate()?;
    let group = store.create_group(&body)?;
    info!(id = group.id, name = %group.name, "group created");
    Ok(Json(group))
}

/// `PUT /api/groups/{id}`: super users and admins of the group.
pub async fn update_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<GroupDraft>,
) -> AppResult<Json<Group>> {
    let mut store = state.store.write().await;
    let principal = Principal::resolve(&store, &user.0);
    principal.require_view(id, codes::GROUP_NOT_FOUND)?;
    store.group(id)?;
    principal.require_manage(EntityKind::Group, id)?;
    let group = store.update_group(id, &body)?;
    info!(id, name = %group.name, "group updated");
    Ok(Json(group))
}

/// `DELETE /api/groups/{id}`: super users only; cascades to everything in the group.
pub async fn delete_group_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_admin()?;
    store.delete_group(id)?;
    info!(id, "group deleted");
    Ok(StatusCode::NO_CONTENT)
}
