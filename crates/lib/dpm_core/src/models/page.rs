//! Paged list responses.

use serde::{Deserialize, Serialize};

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_size: usize,
    pub page_number: usize,
    pub size: usize,
}

impl<T> Page<T> {
    /// Slice `items` according to `request`. `total_size` counts every item.
    pub fn paginate(items: Vec<T>, request: PageRequest) -> Self {
        let total_size = items.len();
        let size = request.size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page_number = request.page.unwrap_or(0);
        let content = items
            .into_iter()
            .skip(page_number.saturating_mul(size))
            .take(size)
            .collect();
        Self {
            content,
            total_size,
            page_number,
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Paging parameters (`?page=&size=`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_defaults_to_first_page() {
        let page = Page::paginate((0..5).collect(), PageRequest::default());
        assert_eq!(page.content, vec![0, 1, 2, 3, 4]);
        assert_eq!(page.total_size, 5);
        assert_eq!(page.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn paginate_slices_later_pages() {
        let request = PageRequest {
            page: Some(1),
            size: Some(2),
        };
        let page = Page::paginate((0..5).collect(), request);
        assert_eq!(page.content, vec![2, 3]);
        assert_eq!(page.page_number, 1);
        assert_eq!(page.total_size, 5);
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let request = PageRequest {
            page: Some(9),
            size: Some(10),
        };
        let page = Page::paginate(vec![1, 2, 3], request);
        assert!(page.is_empty());
        assert_eq!(page.total_size, 3);
    }
}
