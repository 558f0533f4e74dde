//! Table search: case-insensitive substring matching over an entity's
//! display key (name, or email for users and super users).

use crate::models::{Application, ApplicationPermission, Group, SuperUser, Topic, User};

/// Anything that can be listed in a searchable table.
pub trait Searchable {
    /// The text a search filter is matched against.
    fn search_key(&self) -> &str;
}

/// `true` when `filter` is blank or occurs in `key`, ignoring case.
pub fn matches(filter: &str, key: &str) -> bool {
    let needle = filter.trim();
    needle.is_empty() || key.to_lowercase().contains(&needle.to_lowercase())
}

/// Keep the items whose key matches `filter`, preserving order.
pub fn filter_items<'a, T: Searchable>(items: &'a [T], filter: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches(filter, item.search_key()))
        .collect()
}

impl Searchable for Group {
    fn search_key(&self) -> &str {
        &self.name
    }
}

impl Searchable for User {
    fn search_key(&self) -> &str {
        &self.email
    }
}

impl Searchable for SuperUser {
    fn search_key(&self) -> &str {
        &self.email
    }
}

impl Searchable for Topic {
    fn search_key(&self) -> &str {
        &self.name
    }
}

impl Searchable for Application {
    fn search_key(&self) -> &str {
        &self.name
    }
}

impl Searchable for ApplicationPermission {
    fn search_key(&self) -> &str {
        &self.application_name
    }
}
