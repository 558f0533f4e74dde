//! Universal search handler.

use axum::Json;
use axum::extract::{Query, State};
use dpm_core::EntityKind;
use dpm_core::models::{Page, PageRequest, SEARCH_LIMIT_PER_KIND, SearchHit, SearchRequest};
use tracing::debug;

use crate::AppState;
use crate::store::Store;

/// Public groups, topics and applications whose name or description
/// contains the query. At most [`SEARCH_LIMIT_PER_KIND`] of each kind are
/// kept, in that kind order, before paging.
pub fn search(store: &Store, request: &SearchRequest) -> Page<SearchHit> {
    let mut hits = Vec::new();
    if request.includes(EntityKind::Group) {
        hits.extend(
            store
                .groups()
                .into_iter()
                .filter(|g| g.is_public && request.matches(&g.name, g.description.as_deref()))
                .take(SEARCH_LIMIT_PER_KIND)
                .map(SearchHit::Group),
        );
    }
    if request.includes(EntityKind::Topic) {
        hits.extend(
            store
                .topics()
                .into_iter()
                .filter(|t| t.is_public && request.matches(&t.name, t.description.as_deref()))
                .take(SEARCH_LIMIT_PER_KIND)
                .map(SearchHit::Topic),
        );
    }
    if request.includes(EntityKind::Application) {
        hits.extend(
            store
                .applications()
                .into_iter()
                .filter(|a| a.is_public && request.matches(&a.name, a.description.as_deref()))
                .take(SEARCH_LIMIT_PER_KIND)
                .map(SearchHit::Application),
        );
    }
    Page::paginate(
        hits,
        PageRequest {
            page: request.page,
            size: request.size,
        },
    )
}

/// `GET /api/search`
pub async fn search_handler(
    State(state): State<AppState>,
    Query(request): Query<SearchRequest>,
) -> Json<Page<SearchHit>> {
    let page = search(&*state.store.read().await, &request);
    debug!(query = ?request.query, total = page.total_size, "search");
    Json(page)
}
