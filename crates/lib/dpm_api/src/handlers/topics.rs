//! Topic request handlers.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use dpm_core::EntityKind;
use dpm_core::codes;
use dpm_core::models::{Page, Topic, TopicDraft, TopicKind};
use dpm_core::validation::Validate;
use tracing::info;

use super::ListQuery;
use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::access::Principal;

/// `GET /api/topics`
pub async fn list_topics_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Page<Topic>>> {
    let store = state.store.read().await;
    let principal = Principal::resolve(&store, &user.0);
    let rows = store
        .topics()
        .into_iter()
        .filter(|t| principal.can_view(t.group) && query.in_group(t.group))
        .collect();
    Ok(Json(query.finish(rows)))
}

/// `GET /api/topics/kinds`: the selectable topic kinds.
pub async fn topic_kinds_handler() -> Json<Vec<TopicKind>> {
    Json(TopicKind::ALL.to_vec())
}

/// `GET /api/topics/{id}`
pub async fn show_topic_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Topic>> {
    let store = state.store.read().await;
    let topic = store.topic(id)?;
    Principal::resolve(&store, &user.0).require_view(topic.group, codes::TOPIC_NOT_FOUND)?;
    Ok(Json(topic))
}

/// `POST /api/topics`
pub async fn create_topic_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<TopicDraft>,
) -> AppResult<Json<Topic>> {
    body.validate()?;
    let mut store = state.store.write().await;
    Principal::resolve(&store, &user.0).require_manage(EntityKind::Topic, body.group)?;
    let topic = store.create_topic(&body)?;
    info!(id = topic.id, canonical_name = %topic.canonical_name, "topic created");
    Ok(Json(topic))
}

/// `PUT /api/topics/{id}`: the group association cannot change.
pub async fn update_topic_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<TopicDraft>,
) -> AppResult<Json<Topic>> {
    let mut store = state.store.write().await;
    let existing = store.topic(id)?;
    let principal = Principal::resolve(&store, &user.0);
    principal.require_view(existing.group, codes::TOPIC_NOT_FOUND)?;
    principal.require_manage(EntityKind::Topic, existing.group)?;
    let topic = store.update_topic(id, &body)?;
    info!(id, name = %topic.name, "topic updated");
    Ok(Json(topic))
}

/// `DELETE /api/topics/{id}`: also removes the topic's application permissions.
pub async fn delete_topic_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let mut store = state.store.write().await;
    let existing = store.topic(id)?;
    let principal = Principal::resolve(&store, &user.0);
    principal.require_view(existing.group, codes::TOPIC_NOT_FOUND)?;
    principal.require_manage(EntityKind::Topic, existing.group)?;
    store.delete_topic(id)?;
    info!(id, "topic deleted");
    Ok(StatusCode::NO_CONTENT)
}
