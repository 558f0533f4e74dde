//! Authentication and session models.
//!
//! `TokenInfo` is the wire shape of `GET /api/token_info`; `Profile` is the
//! normalized principal kept in the session context.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Role carried by super users.
pub const ROLE_ADMIN: &str = "ADMIN";
/// Role carried by every human principal.
pub const ROLE_USER: &str = "USER";
/// Role carried by applications that logged in with their password.
pub const ROLE_APPLICATION: &str = "APPLICATION";

/// Request header carrying a bind token when an application is added to a topic.
pub const BIND_TOKEN_HEADER: &str = "APPLICATION_BIND_TOKEN";

/// Per-group rights of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPermissions {
    pub group_id: i64,
    pub group_name: String,
    #[serde(default)]
    pub is_group_admin: bool,
    #[serde(default)]
    pub is_topic_admin: bool,
    #[serde(default)]
    pub is_application_admin: bool,
}

/// The signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    /// Subject id (`sub` claim).
    pub subject: String,
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub permissions_by_group: Vec<GroupPermissions>,
}

impl Profile {
    pub fn new(name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            roles: BTreeSet::new(),
            permissions_by_group: Vec::new(),
        }
    }

    /// Builder-style role grant.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Admin iff the roles contain [`ROLE_ADMIN`].
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn group_permissions(&self, group_id: i64) -> Option<&GroupPermissions> {
        self.permissions_by_group
            .iter()
            .find(|p| p.group_id == group_id)
    }
}

/// Wire shape of `GET /api/token_info`.
///
/// The canonical admin marker is `roles` containing `"ADMIN"`. Older backends
/// sent a flat `isAdmin` boolean instead; it is still accepted here and folded
/// into `roles` by [`TokenInfo::into_profile`], nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    #[serde(default)]
    pub active: bool,
    #[serde(default, alias = "username")]
    pub name: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub permissions_by_group: Vec<GroupPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl TokenInfo {
    /// Normalize an introspection payload into a session profile.
    ///
    /// Returns `None` for inactive tokens and payloads without a principal
    /// name. A legacy `isAdmin: true` is migrated to the `ADMIN` role; when
    /// `roles` already says admin, `roles` wins.
    pub fn into_profile(self) -> Option<Profile> {
        if !self.active {
            return None;
        }
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        let mut roles: BTreeSet<String> = self.roles.into_iter().collect();
        if self.is_admin == Some(true) && !roles.contains(ROLE_ADMIN) {
            warn!(name = %name, "token_info carries legacy isAdmin flag, migrating to ADMIN role");
            roles.insert(ROLE_ADMIN.to_string());
        }
        Some(Profile {
            subject: self.sub.unwrap_or_else(|| name.clone()),
            name,
            roles,
            permissions_by_group: self.permissions_by_group,
        })
    }
}

/// `POST /api/login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/login` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub username: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub roles: Vec<String>,
}

/// Claims of the session JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: user email, or application id for application logins.
    pub sub: String,
    pub name: String,
    pub roles: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    /// Unique token id; revocation is keyed on it.
    pub jti: String,
}

/// Claims of an application bind token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindTokenClaims {
    /// Application id.
    pub sub: String,
    /// Email of the user who generated the token.
    pub email: String,
    pub app_name: String,
    pub group_id: i64,
    pub group_name: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}
