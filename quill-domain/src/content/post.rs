use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

/// Post实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,

    pub title: String,

    /// 渲染后的内容（HTML）
    pub content: String,

    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(rename = "authorId")]
    pub author_id: String,

    #[serde(default)]
    pub published: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// 标签（保持服务端给出的顺序）
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub likes: u64,
}

impl Post {
    /// 检查文章是否带有指定标签
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// 检查用户是否为文章作者
    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }

    /// 转换为可编辑的草稿
    pub fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            image_url: self.image_url.clone(),
            tags: self.tags.clone(),
            published: self.published,
        }
    }
}

/// PostDraft 是创建/更新文章时提交的表单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PostDraft {
    #[validate(length(min = 5, max = 100, message = "Title must be between 5 and 100 characters long."))]
    pub title: String,

    #[validate(length(min = 20, message = "Content must be at least 20 characters long."))]
    pub content: String,

    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Please enter a valid image URL."))]
    pub image_url: Option<String>,

    #[validate(length(min = 1, message = "Please select at least one tag."))]
    pub tags: Vec<String>,

    pub published: bool,
}

impl PostDraft {
    /// 添加标签（去除首尾空白，忽略空值与重复值）
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }
}

/// 首页展示时的拆分结果：第一篇已发布文章作为推荐，其余为最近文章
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedSplit {
    pub featured: Option<Post>,
    pub recent: Vec<Post>,
}

impl FeaturedSplit {
    pub fn from_posts(posts: &[Post]) -> Self {
        let mut published = posts.iter().filter(|p| p.published).cloned();
        let featured = published.next();
        Self {
            featured,
            recent: published.collect(),
        }
    }
}
