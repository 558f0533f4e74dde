//! Cross-kind search over public groups, topics and applications
//! (`GET /api/search`).

use serde::{Deserialize, Serialize};

use super::entities::{Application, Group, Topic};
use crate::EntityKind;
use crate::search;

/// Hits taken from each kind before paging.
pub const SEARCH_LIMIT_PER_KIND: usize = 50;

/// `?query=&groups=&topics=&applications=&page=&size=`. When no kind is
/// switched on, every kind is searched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub groups: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub topics: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub applications: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: Option<&str>) -> Self {
        Self {
            query: query
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            ..Self::default()
        }
    }

    /// Restrict the search to `kinds`. Kinds that are not searchable are
    /// ignored.
    pub fn only(mut self, kinds: &[EntityKind]) -> Self {
        for kind in kinds {
            match kind {
                EntityKind::Group => self.groups = true,
                EntityKind::Topic => self.topics = true,
                EntityKind::Application => self.applications = true,
                EntityKind::User | EntityKind::SuperUser => {}
            }
        }
        self
    }

    pub fn includes(&self, kind: EntityKind) -> bool {
        let any = self.groups || self.topics || self.applications;
        match kind {
            EntityKind::Group => !any || self.groups,
            EntityKind::Topic => !any || self.topics,
            EntityKind::Application => !any || self.applications,
            EntityKind::User | EntityKind::SuperUser => false,
        }
    }

    /// Case-insensitive match against a name or description. A blank query
    /// matches everything.
    pub fn matches(&self, name: &str, description: Option<&str>) -> bool {
        let query = self.query.as_deref().unwrap_or_default();
        search::matches(query, name) || description.is_some_and(|d| search::matches(query, d))
    }
}

/// One search result: `{ "type": "GROUP", "entity": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "entity", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchHit {
    Group(Group),
    Topic(Topic),
    Application(Application),
}

impl SearchHit {
    pub fn kind(&self) -> EntityKind {
        match self {
            SearchHit::Group(_) => EntityKind::Group,
            SearchHit::Topic(_) => EntityKind::Topic,
            SearchHit::Application(_) => EntityKind::Application,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            SearchHit::Group(g) => g.id,
            SearchHit::Topic(t) => t.id,
            SearchHit::Application(a) => a.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SearchHit::Group(g) => &g.name,
            SearchHit::Topic(t) => &t.name,
            SearchHit::Application(a) => &a.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_kind_flag_means_every_kind() {
        let request = SearchRequest::new(Some("x"));
        assert!(request.includes(EntityKind::Group));
        assert!(request.includes(EntityKind::Application));
        assert!(!request.includes(EntityKind::User));

        let request = request.only(&[EntityKind::Topic, EntityKind::User]);
        assert!(request.includes(EntityKind::Topic));
        assert!(!request.includes(EntityKind::Group));
    }

    #[test]
    fn query_matches_name_or_description() {
        let request = SearchRequest::new(Some(" SENSOR "));
        assert!(request.matches("Sensor Feed", None));
        assert!(request.matches("Feed", Some("raw sensor data")));
        assert!(!request.matches("Feed", None));
        assert!(SearchRequest::new(Some("  ")).matches("anything", None));
    }

    #[test]
    fn hits_are_tagged_by_kind() {
        let hit = SearchHit::Group(Group {
            id: 4,
            name: "Alpha".into(),
            description: None,
            is_public: true,
            membership_count: 0,
            topic_count: 0,
            application_count: 0,
        });
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["type"], "GROUP");
        assert_eq!(json["entity"]["name"], "Alpha");
        assert_eq!(hit.kind(), EntityKind::Group);
    }
}
