use std::sync::Arc;
use std::time::Duration;

use quill_api::{BlogApi, CursorPage, PostQuery};
use quill_infra::{CachedBlogApi, FileStorage, HttpClient, RestBlogApi, SessionStore};
use quill_service::{
    AuthService, AuthorPostsResource, DefaultCommentService, DefaultLikeService,
    DefaultPasswordService, DefaultPostService, FeedController, FeedOptions, PostLoader,
    fetch_page,
    PostResource, Resource, UserLoader, UserResource,
};
use tracing::{info, warn};

use crate::config::{Config, SessionStorageKind};
use crate::error::Result;

/// 应用状态：所有服务共享同一个会话和API客户端
pub struct App {
    pub config: Config,
    pub api: Arc<dyn BlogApi>,
    /// 作者缓存，登出时清空
    pub cache: Arc<CachedBlogApi>,
    pub auth: AuthService,
    pub passwords: DefaultPasswordService,
    pub posts: DefaultPostService,
    pub likes: DefaultLikeService,
    pub comments: DefaultCommentService,
    pub post: PostResource,
    pub user: UserResource,
    pub author_posts: AuthorPostsResource,
}

impl App {
    pub fn init(config: Config) -> Result<Self> {
        let session = Arc::new(session_store(&config)?);

        let http = Arc::new(HttpClient::new(
            &config.api.base_url,
            config.api.timeout(),
            session.clone(),
        )?);
        info!("API client configured for {}", http.base_url());

        let rest: Arc<dyn BlogApi> = Arc::new(RestBlogApi::new(http));
        let cache = Arc::new(CachedBlogApi::new(
            rest,
            session.clone(),
            config.cache.user_capacity,
            Duration::from_secs(config.cache.user_ttl_secs),
        ));
        let api: Arc<dyn BlogApi> = cache.clone();

        Ok(Self {
            auth: AuthService::new(api.clone(), session.clone()),
            passwords: DefaultPasswordService::new(api.clone()),
            posts: DefaultPostService::new(api.clone(), session.clone()),
            likes: DefaultLikeService::new(api.clone(), session.clone()),
            comments: DefaultCommentService::new(api.clone(), session.clone()),
            post: Resource::new(PostLoader::new(api.clone()), session.clone()),
            user: Resource::new(UserLoader::new(api.clone()), session.clone()),
            author_posts: AuthorPostsResource::new(
                api.clone(),
                session.clone(),
                config.feed.profile_page_size,
            ),
            api,
            cache,
            config,
        })
    }

    /// 预取首页第一页后创建列表控制器；预取失败时从空列表开始
    pub async fn home_feed(&self) -> FeedController {
        let options = FeedOptions {
            page_size: self.config.feed.page_size,
            debounce: self.config.feed.search_debounce(),
        };
        let session = self.auth.session().clone();
        let query = PostQuery::new(options.page_size);
        let first_page = match fetch_page(self.api.as_ref(), &session, &query).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Could not load the first page of posts: {}", e);
                CursorPage::empty()
            }
        };
        FeedController::new(self.api.clone(), session, options, first_page)
    }
}

fn session_store(config: &Config) -> Result<SessionStore> {
    let store = match config.session.storage {
        SessionStorageKind::Memory => SessionStore::in_memory(),
        SessionStorageKind::File => {
            let storage = FileStorage::open(&config.session.path)?;
            info!("Session file at {}", storage.path().display());
            SessionStore::new(Arc::new(storage))
        }
    };
    Ok(store)
}
