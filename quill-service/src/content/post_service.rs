use std::sync::Arc;

use async_trait::async_trait;
use quill_api::BlogApi;
use quill_domain::{Post, PostDraft};
use quill_infra::SessionStore;
use tracing::info;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};

/// 文章写作服务trait
#[async_trait]
pub trait PostService: Send + Sync {
    async fn create(&self, draft: &PostDraft) -> ServiceResult<Post>;

    /// 只有作者本人可以修改
    async fn update(&self, post: &Post, draft: &PostDraft) -> ServiceResult<Post>;

    /// 只有作者本人可以删除
    async fn delete(&self, post: &Post) -> ServiceResult<()>;
}

pub struct DefaultPostService {
    api: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
}

impl DefaultPostService {
    pub fn new(api: Arc<dyn BlogApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    fn require_token(&self, action: &str) -> ServiceResult<String> {
        self.session
            .token()
            .ok_or_else(|| ServiceError::auth_required(action))
    }

    fn require_author(&self, post: &Post, action: &str) -> ServiceResult<String> {
        let token = self.require_token(action)?;
        match self.session.user() {
            Some(user) if post.is_authored_by(&user.id) => Ok(token),
            Some(_) => Err(ServiceError::Forbidden(format!("You can only {} your own posts.", action))),
            None => Err(ServiceError::auth_required(action)),
        }
    }
}

#[async_trait]
impl PostService for DefaultPostService {
    async fn create(&self, draft: &PostDraft) -> ServiceResult<Post> {
        let token = self.require_token("create a post")?;
        draft.validate()?;
        let post = self
            .api
            .create_post(draft)
            .await
            .map_err(|e| ServiceError::from_write(e, &self.session, &token, "create a post"))?;
        info!("Created post {}", post.id);
        Ok(post)
    }

    async fn update(&self, post: &Post, draft: &PostDraft) -> ServiceResult<Post> {
        let token = self.require_author(post, "edit")?;
        draft.validate()?;
        let updated = self
            .api
            .update_post(&post.id, draft)
            .await
            .map_err(|e| ServiceError::from_write(e, &self.session, &token, "edit"))?;
        info!("Updated post {}", updated.id);
        Ok(updated)
    }

    async fn delete(&self, post: &Post) -> ServiceResult<()> {
        let token = self.require_author(post, "delete")?;
        self.api
            .delete_post(&post.id)
            .await
            .map_err(|e| ServiceError::from_write(e, &self.session, &token, "delete"))?;
        info!("Deleted post {}", post.id);
        Ok(())
    }
}
