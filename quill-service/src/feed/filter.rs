use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use quill_api::{BlogApi, CursorPage, PostQuery};
use quill_domain::Post;
use quill_infra::SessionStore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{fetch_page, PostFeed};

/// 过滤后的文章列表所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    /// 搜索输入后等待静默期结束
    Pending,
    Loading,
    Error,
}

/// 三个过滤条件，空字符串表示不过滤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilters {
    pub search: String,
    pub author_id: String,
    pub tag: String,
}

impl FeedFilters {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.author_id.is_empty() && self.tag.is_empty()
    }

    pub fn to_query(&self, limit: u32, cursor: Option<String>) -> PostQuery {
        let mut query = PostQuery::new(limit).with_cursor(cursor);
        if !self.search.is_empty() {
            query = query.with_search(self.search.clone());
        }
        if !self.author_id.is_empty() {
            query = query.with_author(self.author_id.clone());
        }
        if !self.tag.is_empty() {
            query = query.with_tag(self.tag.clone());
        }
        query
    }
}

/// 列表控制器的配置
#[derive(Debug, Clone, Copy)]
pub struct FeedOptions {
    pub page_size: u32,
    /// 搜索输入的静默期
    pub debounce: Duration,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page_size: 8,
            debounce: Duration::from_millis(500),
        }
    }
}

/// 某一时刻控制器状态的快照
#[derive(Debug, Clone)]
pub struct FeedView {
    pub posts: Vec<Post>,
    pub next_cursor: Option<String>,
    pub phase: FeedPhase,
    pub error: Option<String>,
    /// 输入框中的当前值
    pub filters: FeedFilters,
    /// 当前列表是否是按条件过滤得到的
    pub is_filtered: bool,
}

impl FeedView {
    pub fn can_load_more(&self) -> bool {
        self.next_cursor.is_some() && self.phase != FeedPhase::Loading
    }
}

enum FilterChange {
    /// 静默期结束，携带触发它的输入序号
    Debounced(u64),
    Immediate,
    Reset,
}

struct FeedState {
    feed: PostFeed,
    filters: FeedFilters,
    /// 当前列表对应的过滤条件
    applied: FeedFilters,
    phase: FeedPhase,
    error: Option<String>,
    pending_input: Option<u64>,
}

impl FeedState {
    fn settle(&mut self, phase: FeedPhase) {
        self.phase = if self.pending_input.is_some() {
            FeedPhase::Pending
        } else {
            phase
        };
    }
}

struct ControllerInner {
    api: Arc<dyn BlogApi>,
    session: Arc<SessionStore>,
    options: FeedOptions,
    state: tokio::sync::Mutex<FeedState>,
    generation: AtomicU64,
    input_seq: AtomicU64,
    debounce: Mutex<Option<JoinHandle<()>>>,
}

/// FeedController 管理首页的搜索、作者与标签过滤
///
/// 搜索输入在静默期后才发请求，作者/标签选择立即生效并取消待发的搜索。
/// 每次取数都有代号，过期响应被丢弃；静默期计时器触发后请求独立运行，
/// 之后的输入不会中断已经发出的请求。令牌被拒绝时会话被清除，
/// 列表以匿名身份继续加载。
pub struct FeedController {
    inner: Arc<ControllerInner>,
}

impl FeedController {
    pub fn new(
        api: Arc<dyn BlogApi>,
        session: Arc<SessionStore>,
        options: FeedOptions,
        initial: CursorPage<Post>,
    ) -> Self {
        let state = FeedState {
            feed: PostFeed::from_page(initial),
            filters: FeedFilters::default(),
            applied: FeedFilters::default(),
            phase: FeedPhase::Idle,
            error: None,
            pending_input: None,
        };
        Self {
            inner: Arc::new(ControllerInner {
                api,
                session,
                options,
                state: tokio::sync::Mutex::new(state),
                generation: AtomicU64::new(0),
                input_seq: AtomicU64::new(0),
                debounce: Mutex::new(None),
            }),
        }
    }

    /// 请求当前过滤条件下的第一页
    pub async fn load_initial(&self) {
        self.cancel_debounce();
        self.inner.apply(FilterChange::Immediate).await;
    }

    /// 搜索框输入，静默期结束后以最后一次输入的值请求
    pub async fn on_search_input(&self, text: impl Into<String>) {
        let seq = self.inner.input_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.inner.state.lock().await;
            state.filters.search = text.into();
            state.pending_input = Some(seq);
            if state.phase != FeedPhase::Loading {
                state.phase = FeedPhase::Pending;
            }
        }

        let inner = Arc::clone(&self.inner);
        let quiet = self.inner.options.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            // 请求与计时器分离，取消计时器不影响已发出的请求
            tokio::spawn(async move {
                inner.apply(FilterChange::Debounced(seq)).await;
            });
        });
        self.replace_timer(Some(timer));
    }

    /// 选择作者，立即请求
    pub async fn select_author(&self, author_id: Option<String>) {
        self.cancel_debounce();
        self.inner.state.lock().await.filters.author_id = author_id.unwrap_or_default();
        self.inner.apply(FilterChange::Immediate).await;
    }

    /// 选择标签，立即请求
    pub async fn select_tag(&self, tag: Option<String>) {
        self.cancel_debounce();
        self.inner.state.lock().await.filters.tag = tag.unwrap_or_default();
        self.inner.apply(FilterChange::Immediate).await;
    }

    /// 同时清空三个条件并请求未过滤的第一页
    pub async fn reset_filters(&self) {
        self.cancel_debounce();
        self.inner.apply(FilterChange::Reset).await;
    }

    /// 以当前列表的条件加载下一页；没有游标或正在加载时返回false
    pub async fn load_more(&self) -> bool {
        self.inner.load_more().await
    }

    pub async fn view(&self) -> FeedView {
        let state = self.inner.state.lock().await;
        FeedView {
            posts: state.feed.posts().to_vec(),
            next_cursor: state.feed.next_cursor().map(str::to_string),
            phase: state.phase,
            error: state.error.clone(),
            filters: state.filters.clone(),
            is_filtered: !state.applied.is_empty(),
        }
    }

    /// 取消待触发的搜索计时器
    fn cancel_debounce(&self) {
        self.replace_timer(None);
    }

    fn replace_timer(&self, timer: Option<JoinHandle<()>>) {
        let mut slot = self
            .inner
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = timer;
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.replace_timer(None);
    }
}

impl ControllerInner {
    async fn apply(&self, change: FilterChange) {
        let (generation, requested) = {
            let mut state = self.state.lock().await;
            match change {
                FilterChange::Debounced(seq) => {
                    if state.pending_input == Some(seq) {
                        state.pending_input = None;
                    }
                }
                FilterChange::Immediate => state.pending_input = None,
                FilterChange::Reset => {
                    state.pending_input = None;
                    state.filters = FeedFilters::default();
                }
            }
            state.phase = FeedPhase::Loading;
            state.error = None;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, state.filters.clone())
        };

        debug!("Fetching posts with filters {:?}", requested);
        let query = requested.to_query(self.options.page_size, None);
        let result = fetch_page(self.api.as_ref(), &self.session, &query).await;

        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale feed response");
            return;
        }
        match result {
            Ok(page) => {
                info!("Loaded {} posts", page.items.len());
                state.feed.replace(page);
                state.applied = requested;
                state.error = None;
                state.settle(FeedPhase::Idle);
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Filtered posts are not visible without a session");
                state.error = None;
                state.settle(FeedPhase::Idle);
            }
            Err(e) => {
                warn!("Failed to fetch filtered posts: {}", e);
                state.error = Some(e.user_message());
                state.settle(FeedPhase::Error);
            }
        }
    }

    async fn load_more(&self) -> bool {
        let (generation, query) = {
            let mut state = self.state.lock().await;
            let Some(cursor) = state.feed.next_cursor().map(str::to_string) else {
                return false;
            };
            if state.phase == FeedPhase::Loading {
                return false;
            }
            state.phase = FeedPhase::Loading;
            state.error = None;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (generation, state.applied.to_query(self.options.page_size, Some(cursor)))
        };

        let result = fetch_page(self.api.as_ref(), &self.session, &query).await;

        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale page");
            return false;
        }
        match result {
            Ok(page) => {
                state.feed.append(page);
                state.settle(FeedPhase::Idle);
                true
            }
            Err(e) if e.is_unauthorized() => {
                warn!("More posts are not visible without a session");
                state.settle(FeedPhase::Idle);
                false
            }
            Err(e) => {
                warn!("Failed to load more posts: {}", e);
                state.error = Some(e.user_message());
                state.settle(FeedPhase::Error);
                false
            }
        }
    }
}
