use serde::{Deserialize, Serialize};

/// PostQuery 描述一次文章列表请求
///
/// 所有过滤条件之间是AND关系，空字符串与None一样不做限制。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    pub limit: Option<u32>,
    /// 上一页返回的游标，原样回传
    pub cursor: Option<String>,
    pub search: Option<String>,
    pub author_id: Option<String>,
    pub tag: Option<String>,
    pub published: Option<bool>,
}

impl PostQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    /// 是否带有任何过滤条件（不含分页参数）
    pub fn is_filtered(&self) -> bool {
        [&self.search, &self.author_id, &self.tag]
            .iter()
            .any(|v| non_empty(v).is_some())
    }

    /// 转换为URL查询参数，空条件被省略
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(cursor) = non_empty(&self.cursor) {
            pairs.push(("cursor", cursor.to_string()));
        }
        if let Some(published) = self.published {
            pairs.push(("published", published.to_string()));
        }
        if let Some(search) = non_empty(&self.search) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(author_id) = non_empty(&self.author_id) {
            pairs.push(("authorId", author_id.to_string()));
        }
        if let Some(tag) = non_empty(&self.tag) {
            pairs.push(("tag", tag.to_string()));
        }
        pairs
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_omit_empty_criteria() {
        let query = PostQuery::new(8)
            .with_search("")
            .with_author("user-1")
            .with_tag("Design");
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("limit", "8".to_string()),
                ("authorId", "user-1".to_string()),
                ("tag", "Design".to_string()),
            ]
        );
        assert!(query.is_filtered());
    }

    #[test]
    fn test_query_pairs_cursor_and_published() {
        let query = PostQuery::new(10)
            .with_cursor(Some("c-9".to_string()))
            .with_published(false);
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("limit", "10".to_string()),
                ("cursor", "c-9".to_string()),
                ("published", "false".to_string()),
            ]
        );
        assert!(!query.is_filtered());
    }
}
