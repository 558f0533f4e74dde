//! Request handlers.

pub mod application_permissions;
pub mod applications;
pub mod auth;
pub mod groups;
pub mod search;
pub mod super_users;
pub mod topics;
pub mod users;

use dpm_core::models::{Page, PageRequest};
use dpm_core::search::{self as core_search, Searchable};
use serde::Deserialize;

/// Query string shared by every list endpoint: `?filter=&group=&page=&size=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
    pub group: Option<i64>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl ListQuery {
    pub fn in_group(&self, group: i64) -> bool {
        self.group.is_none_or(|g| g == group)
    }

    /// Apply the search filter, then paging.
    pub fn finish<T: Searchable>(&self, rows: Vec<T>) -> Page<T> {
        let filter = self.filter.as_deref().unwrap_or_default();
        let rows = rows
            .into_iter()
            .filter(|row| core_search::matches(filter, row.search_key()))
            .collect();
        Page::paginate(
            rows,
            PageRequest {
                page: self.page,
                size: self.size,
            },
        )
    }
}
