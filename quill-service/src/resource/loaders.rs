use std::sync::Arc;

use async_trait::async_trait;
use quill_api::{ApiResult, BlogApi};
use quill_domain::{Post, User};

use super::ResourceLoader;

/// 按ID加载单篇文章
pub struct PostLoader {
    api: Arc<dyn BlogApi>,
}

impl PostLoader {
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceLoader for PostLoader {
    type Key = String;
    type Output = Post;

    async fn load(&self, key: &String) -> ApiResult<Post> {
        self.api.get_post(key).await
    }
}

/// 按ID加载用户资料
pub struct UserLoader {
    api: Arc<dyn BlogApi>,
}

impl UserLoader {
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ResourceLoader for UserLoader {
    type Key = String;
    type Output = User;

    async fn load(&self, key: &String) -> ApiResult<User> {
        self.api.get_user(key).await
    }
}
