pub mod filter;

use std::sync::Arc;

use quill_api::{ApiResult, BlogApi, CursorPage, PostQuery};
use quill_domain::{FeaturedSplit, Post};
use quill_infra::SessionStore;
use tracing::{debug, warn};

pub use filter::{FeedController, FeedFilters, FeedOptions, FeedPhase, FeedView};

/// 读路径上的文章列表请求
///
/// 带令牌的请求被拒绝（401）时作废该令牌并以匿名身份重试一次；
/// 仍返回401时交给调用方按无数据处理。
pub async fn fetch_page(api: &dyn BlogApi, session: &SessionStore, query: &PostQuery) -> ApiResult<CursorPage<Post>> {
    let token = session.token();
    match api.list_posts(query).await {
        Err(e) if e.is_unauthorized() => {
            let Some(token) = token else {
                return Err(e);
            };
            warn!("Session rejected while listing posts, retrying anonymously");
            session.invalidate_token(&token);
            api.list_posts(query).await
        }
        other => other,
    }
}

/// PostFeed 累积游标分页得到的文章
///
/// 只负责列表与游标本身，不发请求。`append` 保持服务端返回顺序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFeed {
    posts: Vec<Post>,
    next_cursor: Option<String>,
}

impl PostFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_page(page: CursorPage<Post>) -> Self {
        Self {
            posts: page.items,
            next_cursor: page.next_cursor,
        }
    }

    /// 新的第一页，替换现有列表
    pub fn replace(&mut self, page: CursorPage<Post>) {
        self.posts = page.items;
        self.next_cursor = page.next_cursor;
    }

    /// 追加下一页
    pub fn append(&mut self, page: CursorPage<Post>) {
        self.posts.extend(page.items);
        self.next_cursor = page.next_cursor;
    }

    pub fn clear(&mut self) {
        self.posts.clear();
        self.next_cursor = None;
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// 首页展示用：第一篇已发布文章作为头条
    pub fn featured(&self) -> FeaturedSplit {
        FeaturedSplit::from_posts(&self.posts)
    }
}

/// FeedPager 针对固定查询条件的"加载更多"列表
pub struct FeedPager {
    api: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
    query: PostQuery,
    feed: PostFeed,
    loading: bool,
    error: Option<String>,
}

impl FeedPager {
    /// 以服务端预先取好的第一页开始
    pub fn new(
        api: Arc<dyn BlogApi>,
        session: Arc<SessionStore>,
        query: PostQuery,
        first_page: CursorPage<Post>,
    ) -> Self {
        Self {
            api,
            session,
            query: query.with_cursor(None),
            feed: PostFeed::from_page(first_page),
            loading: false,
            error: None,
        }
    }

    /// 没有预取时由自己请求第一页
    pub async fn load(api: Arc<dyn BlogApi>, session: Arc<SessionStore>, query: PostQuery) -> Self {
        let mut pager = Self::new(api, session, query, CursorPage::empty());
        pager.reload().await;
        pager
    }

    pub fn feed(&self) -> &PostFeed {
        &self.feed
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 重新请求第一页并替换列表
    pub async fn reload(&mut self) -> bool {
        self.loading = true;
        self.error = None;
        let result = fetch_page(self.api.as_ref(), &self.session, &self.query).await;
        self.loading = false;
        match result {
            Ok(page) => {
                self.feed.replace(page);
                true
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Posts are not visible without a session");
                false
            }
            Err(e) => {
                warn!("Failed to load posts: {}", e);
                self.error = Some(e.user_message());
                false
            }
        }
    }

    /// 请求下一页并追加；没有下一页或失败时返回false，失败不影响已有列表
    pub async fn load_more(&mut self) -> bool {
        let Some(cursor) = self.feed.next_cursor().map(str::to_string) else {
            debug!("No more posts to load");
            return false;
        };
        if self.loading {
            return false;
        }

        self.loading = true;
        self.error = None;
        let query = self.query.clone().with_cursor(Some(cursor));
        let result = fetch_page(self.api.as_ref(), &self.session, &query).await;
        self.loading = false;

        match result {
            Ok(page) => {
                self.feed.append(page);
                true
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Posts are not visible without a session");
                false
            }
            Err(e) => {
                warn!("Failed to load more posts: {}", e);
                self.error = Some(e.user_message());
                false
            }
        }
    }
}
