use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Comment实体，回复以树形方式嵌套在父评论中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,

    #[serde(rename = "postId")]
    pub post_id: String,

    #[serde(rename = "authorId")]
    pub author_id: String,

    pub content: String,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// 统计该评论及其所有后代的数量
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(Comment::subtree_len).sum::<usize>()
    }

    fn find(&self, id: &str) -> Option<&Comment> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter().find_map(|r| r.find(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Comment> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter_mut().find_map(|r| r.find_mut(id))
    }

    fn walk<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a Comment)>) {
        out.push((depth, self));
        for reply in &self.replies {
            reply.walk(depth + 1, out);
        }
    }
}

/// 新评论请求体，parent_id 为空时为顶层评论
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub content: String,

    #[serde(rename = "parentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl NewComment {
    pub fn top_level(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            parent_id: None,
        }
    }

    pub fn reply(parent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            parent_id: Some(parent_id.into()),
        }
    }
}

/// 一篇文章下的评论树
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentThread {
    roots: Vec<Comment>,
}

impl CommentThread {
    pub fn new(roots: Vec<Comment>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[Comment] {
        &self.roots
    }

    /// 评论总数（包含所有层级的回复）
    pub fn len(&self) -> usize {
        self.roots.iter().map(Comment::subtree_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// 新的顶层评论放在最前面
    pub fn prepend(&mut self, comment: Comment) {
        self.roots.insert(0, comment);
    }

    /// 将回复追加到任意层级的父评论下，找不到父评论时返回回复本身
    pub fn append_reply(&mut self, parent_id: &str, reply: Comment) -> Result<(), Comment> {
        match self.roots.iter_mut().find_map(|c| c.find_mut(parent_id)) {
            Some(parent) => {
                parent.replies.push(reply);
                Ok(())
            }
            None => Err(reply),
        }
    }

    pub fn find(&self, id: &str) -> Option<&Comment> {
        self.roots.iter().find_map(|c| c.find(id))
    }

    /// 深度优先遍历，返回 (深度, 评论)
    pub fn walk(&self) -> Vec<(usize, &Comment)> {
        let mut out = Vec::with_capacity(self.len());
        for root in &self.roots {
            root.walk(0, &mut out);
        }
        out
    }
}
