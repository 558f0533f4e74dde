//! Group-context selector.
//!
//! ```text
//! Unselected --focus/type--> Selecting --choose--> Selected
//!      ^                                              |
//!      +-------------------- clear -------------------+
//! ```
//!
//! Selecting a group is a client-side filter; it never touches the backend.
//! Group-scoped creates are only enabled in `Selected`.

use thiserror::Error;

use crate::models::Group;
use crate::search;

/// The group a context points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub id: i64,
    pub name: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GroupContextError {
    #[error("cannot {action} while the group context is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupContext {
    #[default]
    Unselected,
    /// Typeahead open.
    Selecting { query: String },
    Selected(GroupRef),
}

impl GroupContext {
    fn state_name(&self) -> &'static str {
        match self {
            GroupContext::Unselected => "unselected",
            GroupContext::Selecting { .. } => "selecting",
            GroupContext::Selected(_) => "selected",
        }
    }

    fn reject(&self, action: &'static str) -> GroupContextError {
        GroupContextError::InvalidTransition {
            action,
            state: self.state_name(),
        }
    }

    /// Input focused: open the typeahead.
    pub fn focus(&mut self) -> Result<(), GroupContextError> {
        match self {
            GroupContext::Unselected => {
                *self = GroupContext::Selecting {
                    query: String::new(),
                };
                Ok(())
            }
            GroupContext::Selecting { .. } => Ok(()),
            GroupContext::Selected(_) => Err(self.reject("focus")),
        }
    }

    /// Typing replaces the typeahead query.
    pub fn type_query(&mut self, text: &str) -> Result<(), GroupContextError> {
        match self {
            GroupContext::Unselected | GroupContext::Selecting { .. } => {
                *self = GroupContext::Selecting {
                    query: text.to_string(),
                };
                Ok(())
            }
            GroupContext::Selected(_) => Err(self.reject("type")),
        }
    }

    /// Explicit choice (click or keyboard confirm).
    pub fn choose(&mut self, group: GroupRef) -> Result<(), GroupContextError> {
        match self {
            GroupContext::Selecting { .. } => {
                *self = GroupContext::Selected(group);
                Ok(())
            }
            _ => Err(self.reject("choose")),
        }
    }

    pub fn clear(&mut self) {
        *self = GroupContext::Unselected;
    }

    pub fn can_create(&self) -> bool {
        matches!(self, GroupContext::Selected(_))
    }

    pub fn selected(&self) -> Option<&GroupRef> {
        match self {
            GroupContext::Selected(group) => Some(group),
            _ => None,
        }
    }

    /// Text shown in the `group-input` field.
    pub fn input_value(&self) -> &str {
        match self {
            GroupContext::Unselected => "",
            GroupContext::Selecting { query } => query,
            GroupContext::Selected(group) => &group.name,
        }
    }

    /// Typeahead suggestions; empty unless selecting.
    pub fn candidates<'a>(&self, groups: &'a [Group]) -> Vec<&'a Group> {
        match self {
            GroupContext::Selecting { query } => search::filter_items(groups, query),
            _ => Vec::new(),
        }
    }
}
