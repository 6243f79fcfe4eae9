use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use quill_api::{BlogApi, PostQuery};
use quill_domain::Post;
use quill_infra::SessionStore;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::feed::PostFeed;

/// 作者文章列表的状态快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorPostsState {
    pub posts: Vec<Post>,
    pub next_cursor: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct AuthorKey {
    author_id: String,
    published: Option<bool>,
}

#[derive(Default)]
struct Slot {
    key: Option<AuthorKey>,
    feed: PostFeed,
    loading: bool,
    error: Option<String>,
}

impl Slot {
    fn snapshot(&self) -> AuthorPostsState {
        AuthorPostsState {
            posts: self.feed.posts().to_vec(),
            next_cursor: self.feed.next_cursor().map(str::to_string),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

enum Fetch {
    First,
    Next(String),
}

/// 某个作者的文章列表，带"加载更多"
///
/// 个人主页用 `published = None` 看到全部文章，公开页面只看已发布的。
pub struct AuthorPostsResource {
    api: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
    page_size: u32,
    slot: RwLock<Slot>,
    generation: AtomicU64,
}

impl AuthorPostsResource {
    pub fn new(api: Arc<dyn BlogApi>, session: Arc<SessionStore>, page_size: u32) -> Self {
        Self {
            api,
            session,
            page_size,
            slot: RwLock::new(Slot::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> AuthorPostsState {
        self.slot.read().await.snapshot()
    }

    /// 切换到新的作者（或发布状态）并加载第一页；作者为空时不发请求
    pub async fn refresh(&self, author_id: &str, published: Option<bool>) -> AuthorPostsState {
        if author_id.is_empty() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            let mut slot = self.slot.write().await;
            *slot = Slot::default();
            return slot.snapshot();
        }
        let key = AuthorKey {
            author_id: author_id.to_string(),
            published,
        };
        {
            let mut slot = self.slot.write().await;
            if slot.key.as_ref() != Some(&key) {
                slot.feed.clear();
                slot.key = Some(key.clone());
            }
        }
        self.fetch(key, Fetch::First).await.0
    }

    /// 用当前作者从第一页重新加载
    pub async fn refetch(&self) -> Option<AuthorPostsState> {
        let key = self.slot.read().await.key.clone()?;
        Some(self.fetch(key, Fetch::First).await.0)
    }

    /// 加载下一页；只有这一页被追加到列表时返回true
    pub async fn fetch_more(&self) -> bool {
        let (key, cursor) = {
            let slot = self.slot.read().await;
            match (&slot.key, slot.feed.next_cursor()) {
                (Some(key), Some(cursor)) if !slot.loading => (key.clone(), cursor.to_string()),
                _ => return false,
            }
        };
        self.fetch(key, Fetch::Next(cursor)).await.1
    }

    /// 返回最新状态，以及这次响应是否成功应用
    async fn fetch(&self, key: AuthorKey, fetch: Fetch) -> (AuthorPostsState, bool) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut slot = self.slot.write().await;
            slot.loading = true;
            slot.error = None;
        }

        let mut query = PostQuery::new(self.page_size).with_author(key.author_id.clone());
        if let Some(published) = key.published {
            query = query.with_published(published);
        }
        let cursor = match &fetch {
            Fetch::First => None,
            Fetch::Next(cursor) => Some(cursor.clone()),
        };
        let query = query.with_cursor(cursor);

        let token = self.session.token();
        let result = self.api.list_posts(&query).await;

        let mut slot = self.slot.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale posts for author {}", key.author_id);
            return (slot.snapshot(), false);
        }
        slot.loading = false;
        let applied = result.is_ok();
        match (result, fetch) {
            (Ok(page), Fetch::First) => slot.feed.replace(page),
            (Ok(page), Fetch::Next(_)) => slot.feed.append(page),
            (Err(e), _) if e.is_unauthorized() => {
                warn!("Unauthorized while loading posts of {}", key.author_id);
                if let Some(token) = token {
                    self.session.invalidate_token(&token);
                }
                slot.feed.clear();
            }
            (Err(e), _) => {
                warn!("Failed to load posts of {}: {}", key.author_id, e);
                slot.error = Some(e.user_message());
            }
        }
        (slot.snapshot(), applied)
    }
}
