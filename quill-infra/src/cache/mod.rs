use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use quill_api::{ApiResult, BlogApi, CursorPage, PostQuery, ProfileUpdate};
use quill_domain::{
    AuthSession, Comment, CommentThread, LoginForm, NewComment, PasswordResetForm,
    PasswordResetRequestForm, Post, PostDraft, RegisterForm, User,
};
use tracing::debug;

use crate::session::SessionStore;

/// 带用户缓存的BlogApi包装器
///
/// 文章卡片会为每篇文章查询作者，这里按 (令牌, 用户ID) 缓存 `get_user` 的成功结果。
/// 匿名请求不走缓存；令牌变化后旧条目自然失效。
pub struct CachedBlogApi {
    inner: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
    users: Cache<(String, String), User>,
}

impl CachedBlogApi {
    pub fn new(inner: Arc<dyn BlogApi>, session: Arc<SessionStore>, capacity: u64, ttl: Duration) -> Self {
        let users = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self {
            inner,
            session,
            users,
        }
    }

    /// 清空所有缓存的用户，登出时调用
    pub fn invalidate_all(&self) {
        debug!("Clearing cached users");
        self.users.invalidate_all();
    }
}

#[async_trait]
impl BlogApi for CachedBlogApi {
    async fn login(&self, form: &LoginForm) -> ApiResult<AuthSession> {
        self.inner.login(form).await
    }

    async fn register(&self, form: &RegisterForm) -> ApiResult<AuthSession> {
        self.inner.register(form).await
    }

    async fn request_password_reset(&self, form: &PasswordResetRequestForm) -> ApiResult<String> {
        self.inner.request_password_reset(form).await
    }

    async fn reset_password(&self, form: &PasswordResetForm) -> ApiResult<()> {
        self.inner.reset_password(form).await
    }

    async fn list_posts(&self, query: &PostQuery) -> ApiResult<CursorPage<Post>> {
        self.inner.list_posts(query).await
    }

    async fn get_post(&self, id: &str) -> ApiResult<Post> {
        self.inner.get_post(id).await
    }

    async fn create_post(&self, draft: &PostDraft) -> ApiResult<Post> {
        self.inner.create_post(draft).await
    }

    async fn update_post(&self, id: &str, draft: &PostDraft) -> ApiResult<Post> {
        self.inner.update_post(id, draft).await
    }

    async fn delete_post(&self, id: &str) -> ApiResult<()> {
        self.inner.delete_post(id).await
    }

    async fn set_like(&self, post_id: &str, like: bool) -> ApiResult<u64> {
        self.inner.set_like(post_id, like).await
    }

    async fn liked(&self, post_id: &str) -> ApiResult<bool> {
        self.inner.liked(post_id).await
    }

    async fn list_comments(&self, post_id: &str) -> ApiResult<CommentThread> {
        self.inner.list_comments(post_id).await
    }

    async fn add_comment(&self, post_id: &str, comment: &NewComment) -> ApiResult<Comment> {
        self.inner.add_comment(post_id, comment).await
    }

    async fn get_user(&self, id: &str) -> ApiResult<User> {
        let Some(token) = self.session.token() else {
            return self.inner.get_user(id).await;
        };

        let key = (token, id.to_string());
        if let Some(user) = self.users.get(&key).await {
            debug!("User cache hit for {}", id);
            return Ok(user);
        }

        let user = self.inner.get_user(id).await?;
        self.users.insert(key, user.clone()).await;
        Ok(user)
    }

    async fn update_user(&self, id: &str, update: ProfileUpdate) -> ApiResult<User> {
        let user = self.inner.update_user(id, update).await?;
        if let Some(token) = self.session.token() {
            self.users.insert((token, id.to_string()), user.clone()).await;
        }
        Ok(user)
    }
}
