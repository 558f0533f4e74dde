//! Entity models and their create/update drafts.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A permissions group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub membership_count: usize,
    #[serde(default)]
    pub topic_count: usize,
    #[serde(default)]
    pub application_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

impl GroupDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A user's membership in one group, with its per-group admin flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub group: i64,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub is_group_admin: bool,
    #[serde(default)]
    pub is_topic_admin: bool,
    #[serde(default)]
    pub is_application_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub email: String,
    /// Filled from the group context on create.
    #[serde(default)]
    pub group: i64,
    #[serde(default)]
    pub is_group_admin: bool,
    #[serde(default)]
    pub is_topic_admin: bool,
    #[serde(default)]
    pub is_application_admin: bool,
}

impl UserDraft {
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

impl From<&User> for UserDraft {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            group: user.group,
            is_group_admin: user.is_group_admin,
            is_topic_admin: user.is_topic_admin,
            is_application_admin: user.is_application_admin,
        }
    }
}

/// A user with global admin rights, not tied to any group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperUser {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperUserDraft {
    pub email: String,
}

/// DDS topic kind: `B` restricts writers, `C` restricts writers and readers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicKind {
    #[default]
    B,
    C,
}

impl TopicKind {
    pub const ALL: &[TopicKind] = &[TopicKind::B, TopicKind::C];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub kind: TopicKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub group: i64,
    #[serde(default)]
    pub group_name: String,
    /// `"{group}.{name}"`.
    #[serde(default)]
    pub canonical_name: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDraft {
    pub name: String,
    #[serde(default)]
    pub kind: TopicKind,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    /// Filled from the group context on create.
    #[serde(default)]
    pub group: i64,
}

impl TopicDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub group: i64,
    #[serde(default)]
    pub group_name: String,
    pub date_created: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    /// Filled from the group context on create.
    #[serde(default)]
    pub group: i64,
}

impl ApplicationDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl From<&Application> for ApplicationDraft {
    fn from(app: &Application) -> Self {
        Self {
            name: app.name.clone(),
            description: app.description.clone(),
            is_public: app.is_public,
            group: app.group,
        }
    }
}

/// Read/write access of an application to a topic, granted with a bind token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPermission {
    pub id: i64,
    pub application_id: i64,
    pub application_name: String,
    pub topic_id: i64,
    pub topic_name: String,
    pub read: bool,
    pub write: bool,
    #[serde(default)]
    pub read_partitions: BTreeSet<String>,
    #[serde(default)]
    pub write_partitions: BTreeSet<String>,
}

/// Requested access. Partitions narrow a grant to the named DDS partitions;
/// an empty set leaves it unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPermissionBody {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub read_partitions: BTreeSet<String>,
    #[serde(default)]
    pub write_partitions: BTreeSet<String>,
}

impl AccessPermissionBody {
    pub fn new(read: bool, write: bool) -> Self {
        Self {
            read,
            write,
            ..Self::default()
        }
    }
}
