use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Cursor and exhaustion tracking for one incrementally loaded list view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageState {
    pub page_index: u32,
    pub page_size: u32,
    pub exhausted: bool,
    pub loading: bool,
}

impl PageState {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            exhausted: false,
            loading: false,
        }
    }
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// One page of a paginated list endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(alias = "urls")]
    pub items: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_never_zero() {
        assert_eq!(PageState::new(0).page_size, 1);
        assert_eq!(PageState::default().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn accepts_urls_as_item_list() {
        let page: Page<u32> = serde_json::from_str(r#"{"urls": [1, 2], "hasMore": true}"#).unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more);

        let page: Page<u32> = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(!page.has_more);
    }
}
