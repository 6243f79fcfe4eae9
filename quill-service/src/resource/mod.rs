pub mod loaders;
pub mod posts;

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use quill_api::ApiResult;
use quill_infra::SessionStore;
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub use loaders::{PostLoader, UserLoader};
pub use posts::{AuthorPostsResource, AuthorPostsState};

/// 一次远程取数的可观察状态
///
/// 401时 data 与 error 都为空（视为无数据）；其它错误保留上一次的 data。
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// 按键加载单个资源
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    type Key: Clone + PartialEq + Debug + Send + Sync;
    type Output: Clone + Send + Sync;

    async fn load(&self, key: &Self::Key) -> ApiResult<Self::Output>;
}

struct Slot<K, T> {
    key: Option<K>,
    state: ResourceState<T>,
}

/// Resource 包装一个加载器，维护 {data, loading, error}
///
/// 每次请求分配一个递增的代号，返回时代号已过期的响应直接丢弃，
/// 保证状态只反映最后一次发起的请求。
pub struct Resource<L: ResourceLoader> {
    loader: L,
    session: Arc<SessionStore>,
    slot: RwLock<Slot<L::Key, L::Output>>,
    generation: AtomicU64,
}

impl<L: ResourceLoader> Resource<L> {
    pub fn new(loader: L, session: Arc<SessionStore>) -> Self {
        Self {
            loader,
            session,
            slot: RwLock::new(Slot {
                key: None,
                state: ResourceState::default(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn state(&self) -> ResourceState<L::Output> {
        self.slot.read().await.state.clone()
    }

    pub async fn key(&self) -> Option<L::Key> {
        self.slot.read().await.key.clone()
    }

    /// 以给定的键加载；键变化时先清空旧数据
    pub async fn refresh(&self, key: L::Key) -> ResourceState<L::Output> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut slot = self.slot.write().await;
            if slot.key.as_ref() != Some(&key) {
                slot.state.data = None;
                slot.key = Some(key.clone());
            }
            slot.state.loading = true;
            slot.state.error = None;
        }

        let token = self.session.token();
        let result = self.loader.load(&key).await;

        let mut slot = self.slot.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding stale response for {:?}", key);
            return slot.state.clone();
        }

        slot.state.loading = false;
        match result {
            Ok(data) => slot.state.data = Some(data),
            Err(e) if e.is_unauthorized() => {
                warn!("Unauthorized while loading {:?}", key);
                if let Some(token) = token {
                    self.session.invalidate_token(&token);
                }
                slot.state.data = None;
            }
            Err(e) => {
                warn!("Failed to load {:?}: {}", key, e);
                slot.state.error = Some(e.user_message());
            }
        }
        slot.state.clone()
    }

    /// 用当前的键重新加载；没有键时返回None
    pub async fn refetch(&self) -> Option<ResourceState<L::Output>> {
        let key = self.key().await?;
        Some(self.refresh(key).await)
    }

    /// 回到初始状态，进行中的请求结果会被丢弃
    pub async fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut slot = self.slot.write().await;
        slot.key = None;
        slot.state = ResourceState::default();
    }
}

pub type PostResource = Resource<PostLoader>;
pub type UserResource = Resource<UserLoader>;
