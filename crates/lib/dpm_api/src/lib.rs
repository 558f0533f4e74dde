//! # dpm_api
//!
//! Reference REST backend for the DDS Permissions Manager: login and token
//! introspection, CRUD for groups, users, super users, topics and
//! applications, and application-to-topic permissions. State is held in
//! memory.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{
    application_permissions, applications, auth, groups, search, super_users, topics, users,
};
use crate::store::Store;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Fresh state; demo data is loaded when `config.seed_demo_data` is set.
    pub fn new(config: ApiConfig) -> Self {
        let store = if config.seed_demo_data {
            Store::seeded()
        } else {
            Store::new()
        };
        Self {
            store: Arc::new(RwLock::new(store)),
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/login", post(auth::login_handler))
        .route("/api/token_info", get(auth::token_info_handler))
        .route("/api/logout", get(auth::logout_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(
            "/api/groups",
            get(groups::list_groups_handler).post(groups::create_group_handler),
        )
        .route(
            "/api/groups/{id}",
            get(groups::show_group_handler)
                .put(groups::update_group_handler)
                .delete(groups::delete_group_handler),
        )
        .route(
            "/api/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route(
            "/api/users/{id}",
            get(users::show_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(
            "/api/super-users",
            get(super_users::list_super_users_handler)
                .post(super_users::create_super_user_handler),
        )
        .route(
            "/api/super-users/{id}",
            get(super_users::show_super_user_handler)
                .put(super_users::update_super_user_handler)
                .delete(super_users::delete_super_user_handler),
        )
        .route(
            "/api/topics",
            get(topics::list_topics_handler).post(topics::create_topic_handler),
        )
        .route("/api/topics/kinds", get(topics::topic_kinds_handler))
        .route("/api/search", get(search::search_handler))
        .route(
            "/api/topics/{id}",
            get(topics::show_topic_handler)
                .put(topics::update_topic_handler)
                .delete(topics::delete_topic_handler),
        )
        .route(
            "/api/applications",
            get(applications::list_applications_handler)
                .post(applications::create_application_handler),
        )
        .route(
            "/api/applications/{id}",
            get(applications::show_application_handler)
                .put(applications::update_application_handler)
                .delete(applications::delete_application_handler),
        )
        .route(
            "/api/applications/{id}/bind-token",
            post(applications::generate_bind_token_handler),
        )
        .route(
            "/api/applications/{id}/password",
            post(applications::generate_password_handler),
        )
        .route(
            "/api/application_permissions/topic/{id}",
            get(application_permissions::list_by_topic_handler),
        )
        .route(
            "/api/application_permissions/application/{id}",
            get(application_permissions::list_by_application_handler),
        )
        .route(
            "/api/application_permissions/{id}",
            post(application_permissions::add_handler)
                .put(application_permissions::update_handler)
                .delete(application_permissions::delete_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
