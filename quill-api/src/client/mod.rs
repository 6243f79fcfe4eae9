pub mod blog;
pub mod query;

use serde::{Deserialize, Serialize};

pub use blog::BlogApi;
pub use query::PostQuery;

/// CursorPage 是列表接口返回的一页结果
///
/// `next_cursor` 为空表示已经是最后一页。服务端的列表字段可能叫 `items` 或 `posts`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPage<T> {
    #[serde(alias = "posts")]
    pub items: Vec<T>,

    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self { items, next_cursor }
    }

    /// 空的最后一页
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

impl<T> Default for CursorPage<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_page_accepts_items_or_posts() {
        let page: CursorPage<u32> = serde_json::from_value(json!({ "items": [1, 2], "nextCursor": "abc" })).unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more());

        let page: CursorPage<u32> = serde_json::from_value(json!({ "posts": [3], "nextCursor": null })).unwrap();
        assert_eq!(page.items, vec![3]);
        assert!(!page.has_more());
    }

    #[test]
    fn test_cursor_page_missing_cursor_is_last_page() {
        let page: CursorPage<u32> = serde_json::from_value(json!({ "items": [] })).unwrap();
        assert!(page.next_cursor.is_none());
        assert_eq!(page, CursorPage::default());
    }
}
