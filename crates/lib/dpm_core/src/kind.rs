//! The entity kinds managed through the CRUD contract.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five managed entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Group,
    User,
    SuperUser,
    Topic,
    Application,
}

impl EntityKind {
    pub const ALL: &[EntityKind] = &[
        EntityKind::Group,
        EntityKind::User,
        EntityKind::SuperUser,
        EntityKind::Topic,
        EntityKind::Application,
    ];

    /// Collection segment under `/api`, e.g. `super-users`.
    pub fn path_segment(self) -> &'static str {
        match self {
            EntityKind::Group => "groups",
            EntityKind::User => "users",
            EntityKind::SuperUser => "super-users",
            EntityKind::Topic => "topics",
            EntityKind::Application => "applications",
        }
    }

    /// Singular kebab-case name, e.g. `super-user`.
    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::User => "user",
            EntityKind::SuperUser => "super-user",
            EntityKind::Topic => "topic",
            EntityKind::Application => "application",
        }
    }

    /// Human-readable display name.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Group => "Group",
            EntityKind::User => "User",
            EntityKind::SuperUser => "Super User",
            EntityKind::Topic => "Topic",
            EntityKind::Application => "Application",
        }
    }

    /// Users, topics and applications can only be created inside a selected group.
    pub fn is_group_scoped(self) -> bool {
        matches!(
            self,
            EntityKind::User | EntityKind::Topic | EntityKind::Application
        )
    }

    /// Response code used when an entity of this kind cannot be found.
    pub fn not_found_code(self) -> &'static str {
        use crate::codes;
        match self {
            EntityKind::Group => codes::GROUP_NOT_FOUND,
            EntityKind::User => codes::GROUP_MEMBERSHIP_NOT_FOUND,
            EntityKind::SuperUser => codes::USER_NOT_FOUND,
            EntityKind::Topic => codes::TOPIC_NOT_FOUND,
            EntityKind::Application => codes::APPLICATION_NOT_FOUND,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments_are_unique() {
        let mut segments: Vec<&str> = EntityKind::ALL.iter().map(|k| k.path_segment()).collect();
        segments.sort();
        segments.dedup();
        assert_eq!(segments.len(), EntityKind::ALL.len());
    }

    #[test]
    fn only_members_topics_and_applications_are_group_scoped() {
        let scoped: Vec<EntityKind> = EntityKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_group_scoped())
            .collect();
        assert_eq!(
            scoped,
            vec![EntityKind::User, EntityKind::Topic, EntityKind::Application]
        );
    }
}
