use std::sync::Arc;

use async_trait::async_trait;
use quill_api::BlogApi;
use quill_domain::{LikeStatus, Post};
use quill_infra::SessionStore;
use tracing::warn;

use crate::error::{ServiceError, ServiceResult};

/// 点赞服务trait
#[async_trait]
pub trait LikeService: Send + Sync {
    /// 当前用户对文章的点赞状态，查询失败按未点赞处理
    async fn status(&self, post: &Post) -> LikeStatus;

    /// 切换点赞，返回新的状态
    async fn toggle(&self, post_id: &str, current: LikeStatus) -> ServiceResult<LikeStatus>;
}

pub struct DefaultLikeService {
    api: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
}

impl DefaultLikeService {
    pub fn new(api: Arc<dyn BlogApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }
}

#[async_trait]
impl LikeService for DefaultLikeService {
    async fn status(&self, post: &Post) -> LikeStatus {
        if !self.session.is_authenticated() {
            return LikeStatus::new(false, post.likes);
        }
        let token = self.session.token();
        let liked = match self.api.liked(&post.id).await {
            Ok(liked) => liked,
            Err(e) if e.is_unauthorized() => {
                warn!("Session rejected while checking like status for {}", post.id);
                if let Some(token) = token {
                    self.session.invalidate_token(&token);
                }
                false
            }
            Err(e) => {
                warn!("Could not check like status for {}: {}", post.id, e);
                false
            }
        };
        LikeStatus::new(liked, post.likes)
    }

    async fn toggle(&self, post_id: &str, current: LikeStatus) -> ServiceResult<LikeStatus> {
        let token = self
            .session
            .token()
            .ok_or_else(|| ServiceError::auth_required("like posts"))?;
        let count = self
            .api
            .set_like(post_id, current.toggled())
            .await
            .map_err(|e| ServiceError::from_write(e, &self.session, &token, "like posts"))?;
        let mut next = current;
        next.apply_toggle(count);
        Ok(next)
    }
}
