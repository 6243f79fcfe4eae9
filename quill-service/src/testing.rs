//! 服务层测试用的内存版BlogApi

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use quill_api::{ApiError, ApiResult, BlogApi, CursorPage, PostQuery, ProfileUpdate};
use quill_domain::{
    AuthSession, Comment, CommentThread, LoginForm, NewComment, PasswordResetForm,
    PasswordResetRequestForm, Post, PostDraft, RegisterForm, User,
};
use tokio::time::Instant;

pub const PASSWORD: &str = "secret1";

/// 一次列表请求的记录
#[derive(Debug, Clone)]
pub struct ListCall {
    pub at: Instant,
    pub query: PostQuery,
}

/// 内存中的博客后端
///
/// 文章按插入顺序视为从新到旧；游标是上一页最后一篇文章的ID。
#[derive(Default)]
pub struct FakeBlogApi {
    posts: Mutex<Vec<Post>>,
    users: Mutex<HashMap<String, User>>,
    comments: Mutex<HashMap<String, CommentThread>>,
    liked: Mutex<HashSet<String>>,
    failures: Mutex<VecDeque<ApiError>>,
    delays: Mutex<VecDeque<Duration>>,
    list_calls: Mutex<Vec<ListCall>>,
    calls: Mutex<Vec<String>>,
}

pub fn post(n: usize, author_id: &str, tags: &[&str]) -> Post {
    Post {
        id: format!("post-{:02}", n),
        title: format!("Post number {}", n),
        content: format!("Body of post number {} with enough words", n),
        image_url: None,
        author_id: author_id.to_string(),
        published: true,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(n as i64),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        likes: 0,
    }
}

pub fn user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", id),
        ..Default::default()
    }
}

pub fn status(code: u16, message: &str) -> ApiError {
    ApiError::Status {
        status: code,
        message: message.to_string(),
        details: None,
    }
}

pub fn comment(id: &str, content: &str) -> Comment {
    Comment {
        id: id.to_string(),
        post_id: "post-01".to_string(),
        author_id: "user-1".to_string(),
        content: content.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        replies: Vec::new(),
    }
}

impl FakeBlogApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` 篇文章，post-<count> 最新
    pub fn with_posts(count: usize) -> Self {
        let api = Self::new();
        for n in (1..=count).rev() {
            api.push_post(post(n, "user-1", &["rust"]));
        }
        api
    }

    pub fn push_post(&self, post: Post) {
        self.posts.lock().unwrap().push(post);
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn set_comments(&self, post_id: &str, thread: CommentThread) {
        self.comments.lock().unwrap().insert(post_id.to_string(), thread);
    }

    pub fn mark_liked(&self, post_id: &str) {
        self.liked.lock().unwrap().insert(post_id.to_string());
    }

    /// 下一次调用（任意方法）返回该错误
    pub fn fail_next(&self, err: ApiError) {
        self.failures.lock().unwrap().push_back(err);
    }

    /// 下一次带延迟的调用先等待该时长
    pub fn delay_next(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn all_posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    async fn begin(&self, name: &str) -> ApiResult<()> {
        self.record(name);
        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn matches(post: &Post, query: &PostQuery) -> bool {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        if let Some(published) = query.published {
            if post.published != published {
                return false;
            }
        }
        if let Some(search) = non_empty(&query.search) {
            let search = search.to_lowercase();
            if !post.title.to_lowercase().contains(&search)
                && !post.content.to_lowercase().contains(&search)
            {
                return false;
            }
        }
        if let Some(author_id) = non_empty(&query.author_id) {
            if post.author_id != author_id {
                return false;
            }
        }
        if let Some(tag) = non_empty(&query.tag) {
            if !post.has_tag(&tag) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl BlogApi for FakeBlogApi {
    async fn login(&self, form: &LoginForm) -> ApiResult<AuthSession> {
        self.begin("login").await?;
        let user = self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == form.email)
            .cloned();
        match user {
            Some(user) if form.password == PASSWORD => Ok(AuthSession {
                token: format!("token-{}", user.id),
                user,
            }),
            _ => Err(status(401, "Invalid email or password")),
        }
    }

    async fn register(&self, form: &RegisterForm) -> ApiResult<AuthSession> {
        self.begin("register").await?;
        let user = User {
            id: format!("user-{}", self.users.lock().unwrap().len() + 1),
            name: form.name.clone(),
            email: form.email.clone(),
            ..Default::default()
        };
        self.add_user(user.clone());
        Ok(AuthSession {
            token: format!("token-{}", user.id),
            user,
        })
    }

    async fn request_password_reset(&self, _form: &PasswordResetRequestForm) -> ApiResult<String> {
        self.begin("request_password_reset").await?;
        Ok("Password reset link sent.".to_string())
    }

    async fn reset_password(&self, _form: &PasswordResetForm) -> ApiResult<()> {
        self.begin("reset_password").await
    }

    async fn list_posts(&self, query: &PostQuery) -> ApiResult<CursorPage<Post>> {
        self.list_calls.lock().unwrap().push(ListCall {
            at: Instant::now(),
            query: query.clone(),
        });
        self.begin("list_posts").await?;

        let matching: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| Self::matches(p, query))
            .cloned()
            .collect();
        let start = match &query.cursor {
            Some(cursor) => matching
                .iter()
                .position(|p| &p.id == cursor)
                .map(|i| i + 1)
                .ok_or_else(|| status(400, "Invalid cursor"))?,
            None => 0,
        };
        let limit = query.limit.unwrap_or(10) as usize;
        let items: Vec<Post> = matching.iter().skip(start).take(limit).cloned().collect();
        let next_cursor = if start + items.len() < matching.len() {
            items.last().map(|p| p.id.clone())
        } else {
            None
        };
        Ok(CursorPage::new(items, next_cursor))
    }

    async fn get_post(&self, id: &str) -> ApiResult<Post> {
        self.begin("get_post").await?;
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| status(404, "Post not found"))
    }

    async fn create_post(&self, draft: &PostDraft) -> ApiResult<Post> {
        self.begin("create_post").await?;
        let n = self.posts.lock().unwrap().len() + 1;
        let mut created = post(n, "user-1", &[]);
        created.title = draft.title.clone();
        created.content = draft.content.clone();
        created.tags = draft.tags.clone();
        created.published = draft.published;
        created.image_url = draft.image_url.clone();
        self.posts.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn update_post(&self, id: &str, draft: &PostDraft) -> ApiResult<Post> {
        self.begin("update_post").await?;
        let mut posts = self.posts.lock().unwrap();
        let existing = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| status(404, "Post not found"))?;
        existing.title = draft.title.clone();
        existing.content = draft.content.clone();
        existing.tags = draft.tags.clone();
        existing.published = draft.published;
        Ok(existing.clone())
    }

    async fn delete_post(&self, id: &str) -> ApiResult<()> {
        self.begin("delete_post").await?;
        self.posts.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn set_like(&self, post_id: &str, like: bool) -> ApiResult<u64> {
        self.begin("set_like").await?;
        let mut liked = self.liked.lock().unwrap();
        if like {
            liked.insert(post_id.to_string());
        } else {
            liked.remove(post_id);
        }
        let mut posts = self.posts.lock().unwrap();
        let target = posts
            .iter_mut()
            .find(|p| p.id == post_id)
            .ok_or_else(|| status(404, "Post not found"))?;
        target.likes = if like {
            target.likes + 1
        } else {
            target.likes.saturating_sub(1)
        };
        Ok(target.likes)
    }

    async fn liked(&self, post_id: &str) -> ApiResult<bool> {
        self.begin("liked").await?;
        Ok(self.liked.lock().unwrap().contains(post_id))
    }

    async fn list_comments(&self, post_id: &str) -> ApiResult<CommentThread> {
        self.begin("list_comments").await?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(post_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_comment(&self, post_id: &str, new_comment: &NewComment) -> ApiResult<Comment> {
        self.begin("add_comment").await?;
        let mut created = comment(&format!("c-{}", self.calls().len()), &new_comment.content);
        created.post_id = post_id.to_string();
        Ok(created)
    }

    async fn get_user(&self, id: &str) -> ApiResult<User> {
        self.begin("get_user").await?;
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| status(404, "User not found"))
    }

    async fn update_user(&self, id: &str, update: ProfileUpdate) -> ApiResult<User> {
        self.begin("update_user").await?;
        let mut users = self.users.lock().unwrap();
        let existing = users.get_mut(id).ok_or_else(|| status(404, "User not found"))?;
        existing.name = update.form.name;
        existing.bio = update.form.bio.unwrap_or_default();
        if update.avatar.is_some() {
            existing.avatar_url = format!("https://cdn.example.com/{}.png", id);
        }
        Ok(existing.clone())
    }
}
