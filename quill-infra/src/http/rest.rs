use std::sync::Arc;

use async_trait::async_trait;
use quill_api::{ApiError, ApiResult, BlogApi, CursorPage, PostQuery, ProfileUpdate};
use quill_domain::{
    AuthSession, Comment, CommentThread, LoginForm, NewComment, PasswordResetForm,
    PasswordResetRequestForm, Post, PostDraft, RegisterForm, User,
};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;

use super::HttpClient;

/// 点赞接口可能直接返回数字，也可能返回对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LikeCount {
    Count(u64),
    Likes { likes: u64 },
    Wrapped { count: u64 },
}

impl LikeCount {
    fn value(self) -> u64 {
        match self {
            LikeCount::Count(n) | LikeCount::Likes { likes: n } | LikeCount::Wrapped { count: n } => n,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LikedResponse {
    #[serde(default)]
    liked: bool,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: Option<String>,
}

/// RestBlogApi 通过HTTP调用远端博客API
pub struct RestBlogApi {
    http: Arc<HttpClient>,
}

impl RestBlogApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    fn profile_form(update: ProfileUpdate) -> ApiResult<Form> {
        let mut form = Form::new().text("name", update.form.name);
        if let Some(bio) = update.form.bio.filter(|b| !b.is_empty()) {
            form = form.text("bio", bio);
        }
        if let Some(avatar) = update.avatar {
            let part = Part::bytes(avatar.bytes)
                .file_name(avatar.file_name)
                .mime_str(&avatar.mime)
                .map_err(|e| ApiError::Decode(format!("Invalid avatar mime type: {}", e)))?;
            form = form.part("avatar", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl BlogApi for RestBlogApi {
    async fn login(&self, form: &LoginForm) -> ApiResult<AuthSession> {
        self.http.post_json("/auth/login", form).await?.decode()
    }

    async fn register(&self, form: &RegisterForm) -> ApiResult<AuthSession> {
        self.http.post_json("/auth/register", form).await?.decode()
    }

    async fn request_password_reset(&self, form: &PasswordResetRequestForm) -> ApiResult<String> {
        let body: Option<MessageResponse> = self
            .http
            .post_json("/auth/password-reset-request", form)
            .await?
            .decode()
            .unwrap_or(None);
        Ok(body
            .and_then(|b| b.message)
            .unwrap_or_else(|| "Password reset link sent.".to_string()))
    }

    async fn reset_password(&self, form: &PasswordResetForm) -> ApiResult<()> {
        self.http.post_json("/auth/password-reset", form).await?;
        Ok(())
    }

    async fn list_posts(&self, query: &PostQuery) -> ApiResult<CursorPage<Post>> {
        self.http.get("/posts", query.to_query_pairs()).await?.decode()
    }

    async fn get_post(&self, id: &str) -> ApiResult<Post> {
        self.http.get(&format!("/posts/{}", id), Vec::new()).await?.decode()
    }

    async fn create_post(&self, draft: &PostDraft) -> ApiResult<Post> {
        self.http.post_json("/posts", draft).await?.decode()
    }

    async fn update_post(&self, id: &str, draft: &PostDraft) -> ApiResult<Post> {
        self.http.put_json(&format!("/posts/{}", id), draft).await?.decode()
    }

    async fn delete_post(&self, id: &str) -> ApiResult<()> {
        self.http.delete(&format!("/posts/{}", id)).await?;
        Ok(())
    }

    async fn set_like(&self, post_id: &str, like: bool) -> ApiResult<u64> {
        let count: LikeCount = self
            .http
            .post_json(&format!("/posts/{}/like", post_id), &json!({ "like": like }))
            .await?
            .decode()?;
        Ok(count.value())
    }

    async fn liked(&self, post_id: &str) -> ApiResult<bool> {
        let body: LikedResponse = self
            .http
            .get(&format!("/posts/{}/liked", post_id), Vec::new())
            .await?
            .decode()?;
        Ok(body.liked)
    }

    async fn list_comments(&self, post_id: &str) -> ApiResult<CommentThread> {
        let thread: Option<CommentThread> = self
            .http
            .get(&format!("/posts/{}/comments", post_id), Vec::new())
            .await?
            .decode()?;
        Ok(thread.unwrap_or_default())
    }

    async fn add_comment(&self, post_id: &str, comment: &NewComment) -> ApiResult<Comment> {
        self.http
            .post_json(&format!("/posts/{}/comments", post_id), comment)
            .await?
            .decode()
    }

    async fn get_user(&self, id: &str) -> ApiResult<User> {
        self.http.get(&format!("/users/{}", id), Vec::new()).await?.decode()
    }

    async fn update_user(&self, id: &str, update: ProfileUpdate) -> ApiResult<User> {
        let form = Self::profile_form(update)?;
        self.http.put_form(&format!("/users/{}", id), form).await?.decode()
    }
}
