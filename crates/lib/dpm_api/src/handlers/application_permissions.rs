//! Application-to-topic permission handlers. Adding an application to a
//! topic requires the application's current bind token.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use dpm_core::EntityKind;
use dpm_core::auth::jwt::verify_bind_token;
use dpm_core::auth::password::hash_token;
use dpm_core::codes;
use dpm_core::models::auth::BIND_TOKEN_HEADER;
use dpm_core::models::{AccessPermissionBody, ApplicationPermission, Page};
use tracing::{info, warn};

use super::ListQuery;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::services::access::Principal;
use crate::store::Store;

/// Application id named by a bind token, if it is the one currently issued.
fn bound_application(state: &AppState, store: &Store, headers: &HeaderMap) -> AppResult<i64> {
    let invalid = || AppError::Validation(vec![codes::APPLICATION_BIND_TOKEN_INVALID]);
    let token = headers
        .get(BIND_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(invalid)?;
    let claims =
        verify_bind_token(token, state.config.jwt_secret.as_bytes()).ok_or_else(invalid)?;
    let application: i64 = claims.sub.parse().map_err(|_| invalid())?;
    if store.bind_token_hash(application) != Some(hash_token(token).as_str()) {
        warn!(application, jti = %claims.jti, "stale bind token presented");
        return Err(invalid());
    }
    Ok(application)
}

/// Topic group of a permission, checked for view and manage rights.
fn managed_permission(store: &Store, user: &AuthenticatedUser, id: i64) -> AppResult<()> {
    let permission = store.permission(id)?;
    let topic = store.topic(permission.topic_id)?;
    let principal = Principal::resolve(store, &user.0);
    principal.require_view(topic.group, codes::APPLICATION_PERMISSION_NOT_FOUND)?;
    principal.require_manage(EntityKind::Topic, topic.group)
}

/// `GET /api/application_permissions/topic/{id}`
pub async fn list_by_topic_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(topic_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<ApplicationPermission>>> {
    let store = state.store.read().await;
    let topic = store.topic(topic_id)?;
    Principal::resolve(&store, &user.0).require_view(topic.group, codes::TOPIC_NOT_FOUND)?;
    let rows = store
        .permissions()
        .into_iter()
        .filter(|p| p.topic_id == topic_id)
        .collect();
    Ok(Json(query.finish(rows)))
}

/// `GET /api/application_permissions/application/{id}`
pub async fn list_by_application_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(application_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<ApplicationPermission>>> {
    let store = state.store.read().await;
    let app = store.application(application_id)?;
    Principal::resolve(&store, &user.0).require_view(app.group, codes::APPLICATION_NOT_FOUND)?;
    let rows = store
        .permissions()
        .into_iter()
        .filter(|p| p.application_id == application_id)
        .collect();
    Ok(Json(query.finish(rows)))
}

/// `POST /api/application_permissions/{topicId}`: grant the application named
/// by the `APPLICATION_BIND_TOKEN` header access to the topic.
pub async fn add_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(topic_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<AccessPermissionBody>,
) -> AppResult<Json<ApplicationPermission>> {
    let mut store = state.store.write().await;
    let topic = store.topic(topic_id)?;
    let principal = Principal::resolve(&store, &user.0);
    principal.require_view(topic.group, codes::TOPIC_NOT_FOUND)?;
    principal.require_manage(EntityKind::Topic, topic.group)?;
    let application = bound_application(&state, &store, &headers)?;
    let permission = store.add_permission(application, topic_id, body)?;
    info!(
        id = permission.id,
        application,
        topic = topic_id,
        read = permission.read,
        write = permission.write,
        "application permission added"
    );
    Ok(Json(permission))
}

/// `PUT /api/application_permissions/{permissionId}`
pub async fn update_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<AccessPermissionBody>,
) -> AppResult<Json<ApplicationPermission>> {
    let mut store = state.store.write().await;
    managed_permission(&store, &user, id)?;
    let permission = store.update_permission(id, body)?;
    info!(
        id,
        read = permission.read,
        write = permission.write,
        "application permission updated"
    );
    Ok(Json(permission))
}

/// `DELETE /api/application_permissions/{permissionId}`
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let mut store = state.store.write().await;
    managed_permission(&store, &user, id)?;
    store.delete_permission(id)?;
    info!(id, "application permission removed");
    Ok(StatusCode::NO_CONTENT)
}
