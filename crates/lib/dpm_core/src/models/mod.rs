//! Wire and domain models shared by the client and the reference backend.
//!
//! Field names follow the backend's camelCase JSON.

pub mod auth;
pub mod entities;
pub mod page;
pub mod search;

pub use auth::{GroupPermissions, LoginRequest, LoginResponse, Profile, TokenInfo};
pub use entities::{
    AccessPermissionBody, Application, ApplicationDraft, ApplicationPermission, Group,
    GroupDraft, SuperUser, SuperUserDraft, Topic, TopicDraft, TopicKind, User, UserDraft,
};
pub use page::{Page, PageRequest};
pub use search::{SEARCH_LIMIT_PER_KIND, SearchHit, SearchRequest};

/// Body of every failed backend response: `[{ "id": ..., "code": ... }]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Correlation id, also written to the backend log.
    pub id: String,
    /// One of the constants in [`crate::codes`].
    pub code: String,
}
