use async_trait::async_trait;
use quill_domain::{
    AuthSession, Comment, CommentThread, LoginForm, NewComment, PasswordResetForm,
    PasswordResetRequestForm, Post, PostDraft, ProfileForm, RegisterForm, User,
};

use super::{CursorPage, PostQuery};
use crate::error::ApiResult;

/// 头像上传内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

impl AvatarImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: "avatar.png".to_string(),
            mime: "image/png".to_string(),
        }
    }
}

/// 资料更新请求，以multipart表单提交
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub form: ProfileForm,
    pub avatar: Option<AvatarImage>,
}

/// BlogApi trait 定义远端博客API的全部操作
///
/// 认证信息由实现自行附加，调用方只传业务参数。
#[async_trait]
pub trait BlogApi: Send + Sync {
    // 认证
    async fn login(&self, form: &LoginForm) -> ApiResult<AuthSession>;
    async fn register(&self, form: &RegisterForm) -> ApiResult<AuthSession>;
    /// 返回服务端的提示消息
    async fn request_password_reset(&self, form: &PasswordResetRequestForm) -> ApiResult<String>;
    async fn reset_password(&self, form: &PasswordResetForm) -> ApiResult<()>;

    // 文章
    async fn list_posts(&self, query: &PostQuery) -> ApiResult<CursorPage<Post>>;
    async fn get_post(&self, id: &str) -> ApiResult<Post>;
    async fn create_post(&self, draft: &PostDraft) -> ApiResult<Post>;
    async fn update_post(&self, id: &str, draft: &PostDraft) -> ApiResult<Post>;
    async fn delete_post(&self, id: &str) -> ApiResult<()>;

    // 点赞
    /// 返回更新后的点赞数
    async fn set_like(&self, post_id: &str, like: bool) -> ApiResult<u64>;
    async fn liked(&self, post_id: &str) -> ApiResult<bool>;

    // 评论
    async fn list_comments(&self, post_id: &str) -> ApiResult<CommentThread>;
    async fn add_comment(&self, post_id: &str, comment: &NewComment) -> ApiResult<Comment>;

    // 用户
    async fn get_user(&self, id: &str) -> ApiResult<User>;
    async fn update_user(&self, id: &str, update: ProfileUpdate) -> ApiResult<User>;
}
