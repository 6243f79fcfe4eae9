use std::sync::Arc;

use async_trait::async_trait;
use quill_api::BlogApi;
use quill_domain::{Comment, CommentThread, NewComment};
use quill_infra::SessionStore;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};

/// 评论服务trait
#[async_trait]
pub trait CommentService: Send + Sync {
    async fn load(&self, post_id: &str) -> ServiceResult<CommentThread>;

    /// 发表顶层评论并插入到最前面；内容为空时返回None
    async fn add(&self, post_id: &str, thread: &mut CommentThread, content: &str) -> ServiceResult<Option<Comment>>;

    /// 回复任意层级的评论并追加到其回复列表末尾；内容为空时返回None
    async fn reply(
        &self,
        post_id: &str,
        thread: &mut CommentThread,
        parent_id: &str,
        content: &str,
    ) -> ServiceResult<Option<Comment>>;
}

pub struct DefaultCommentService {
    api: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
}

impl DefaultCommentService {
    pub fn new(api: Arc<dyn BlogApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    async fn submit(&self, post_id: &str, comment: NewComment) -> ServiceResult<Option<Comment>> {
        if comment.content.trim().is_empty() {
            debug!("Ignoring blank comment");
            return Ok(None);
        }
        let token = self
            .session
            .token()
            .ok_or_else(|| ServiceError::auth_required("comment"))?;
        let created = self
            .api
            .add_comment(post_id, &comment)
            .await
            .map_err(|e| ServiceError::from_write(e, &self.session, &token, "comment"))?;
        Ok(Some(created))
    }
}

#[async_trait]
impl CommentService for DefaultCommentService {
    async fn load(&self, post_id: &str) -> ServiceResult<CommentThread> {
        let token = self.session.token();
        match self.api.list_comments(post_id).await {
            Ok(thread) => Ok(thread),
            Err(e) if e.is_unauthorized() => {
                if let Some(token) = token {
                    self.session.invalidate_token(&token);
                }
                Ok(CommentThread::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn add(&self, post_id: &str, thread: &mut CommentThread, content: &str) -> ServiceResult<Option<Comment>> {
        let created = self.submit(post_id, NewComment::top_level(content.trim())).await?;
        if let Some(comment) = &created {
            thread.prepend(comment.clone());
        }
        Ok(created)
    }

    async fn reply(
        &self,
        post_id: &str,
        thread: &mut CommentThread,
        parent_id: &str,
        content: &str,
    ) -> ServiceResult<Option<Comment>> {
        let created = self
            .submit(post_id, NewComment::reply(parent_id, content.trim()))
            .await?;
        if let Some(reply) = &created {
            if thread.append_reply(parent_id, reply.clone()).is_err() {
                warn!("Parent comment {} not found in thread, reload to see the reply", parent_id);
            }
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{comment, status, user, FakeBlogApi};
    use quill_domain::AuthSession;

    fn nested_thread() -> CommentThread {
        let mut root = comment("c1", "First!");
        let mut child = comment("c2", "Replying to first");
        child.replies.push(comment("c3", "Deep reply"));
        root.replies.push(child);
        CommentThread::new(vec![root, comment("c4", "Another root")])
    }

    fn setup(logged_in: bool) -> (Arc<FakeBlogApi>, Arc<SessionStore>, DefaultCommentService) {
        let api = Arc::new(FakeBlogApi::new());
        api.set_comments("post-01", nested_thread());
        let session = Arc::new(SessionStore::in_memory());
        if logged_in {
            session.save(&AuthSession {
                user: user("user-1", "Aria"),
                token: "token-user-1".to_string(),
            });
        }
        let api_dyn: Arc<dyn BlogApi> = api.clone();
        let service = DefaultCommentService::new(api_dyn, session.clone());
        (api, session, service)
    }

    /// 测试：加载嵌套评论
    #[tokio::test]
    async fn test_load_thread() {
        let (_, _, comments) = setup(false);
        let thread = comments.load("post-01").await.unwrap();
        assert_eq!(thread.roots().len(), 2);
        assert_eq!(thread.len(), 4);
    }

    /// 测试：新评论在最前，回复追加在父评论下
    #[tokio::test]
    async fn test_add_and_reply_at_depth() {
        let (_, _, comments) = setup(true);
        let mut thread = comments.load("post-01").await.unwrap();

        let added = comments.add("post-01", &mut thread, "  Great post  ").await.unwrap().unwrap();
        assert_eq!(added.content, "Great post");
        assert_eq!(thread.roots()[0].id, added.id);

        let reply = comments
            .reply("post-01", &mut thread, "c3", "Even deeper")
            .await
            .unwrap()
            .unwrap();
        let parent = thread.find("c3").unwrap();
        assert_eq!(parent.replies.last().unwrap().id, reply.id);
        assert_eq!(thread.len(), 6);
    }

    /// 测试：空白内容不发请求
    #[tokio::test]
    async fn test_blank_comment_ignored() {
        let (api, _, comments) = setup(true);
        let mut thread = CommentThread::default();
        assert!(comments.add("post-01", &mut thread, "   ").await.unwrap().is_none());
        assert!(comments.reply("post-01", &mut thread, "c1", "").await.unwrap().is_none());
        assert!(api.calls().is_empty());
    }

    /// 测试：未登录不能评论；401让会话失效
    #[tokio::test]
    async fn test_comment_auth() {
        let (_, _, anonymous) = setup(false);
        let mut thread = CommentThread::default();
        let err = anonymous.add("post-01", &mut thread, "hi").await.unwrap_err();
        assert_eq!(err.user_message(), "You must be logged in to comment.");

        let (api, session, comments) = setup(true);
        api.fail_next(status(401, "Token expired"));
        assert!(comments.add("post-01", &mut thread, "hi").await.is_err());
        assert!(!session.is_authenticated());
        assert!(thread.is_empty());
    }
}
