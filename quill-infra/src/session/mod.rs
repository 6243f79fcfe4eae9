pub mod storage;

use std::sync::Arc;

use quill_api::{SessionStorage, TOKEN_KEY, USER_KEY};
use quill_domain::{AuthSession, User};
use tracing::{info, warn};

pub use storage::{FileStorage, MemoryStorage};

/// SessionStore 保存当前会话的令牌与用户快照
///
/// 没有底层存储（detached）时所有写操作都是空操作，读取总是返回None。
pub struct SessionStore {
    storage: Option<Arc<dyn SessionStorage>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn detached() -> Self {
        Self { storage: None }
    }

    pub fn is_attached(&self) -> bool {
        self.storage.is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.storage
            .as_ref()?
            .get_item(TOKEN_KEY)
            .filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        if let Some(storage) = &self.storage {
            storage.set_item(TOKEN_KEY, token);
        }
    }

    pub fn clear_token(&self) {
        if let Some(storage) = &self.storage {
            storage.remove_item(TOKEN_KEY);
        }
    }

    /// 缓存的用户快照，解析失败视为不存在
    pub fn user(&self) -> Option<User> {
        let raw = self.storage.as_ref()?.get_item(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Discarding unreadable user snapshot: {}", e);
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) {
        let Some(storage) = &self.storage else {
            return;
        };
        match serde_json::to_string(user) {
            Ok(json) => storage.set_item(USER_KEY, &json),
            Err(e) => warn!("Failed to serialize user snapshot: {}", e),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// 保存登录/注册得到的会话
    pub fn save(&self, session: &AuthSession) {
        self.set_token(&session.token);
        self.set_user(&session.user);
        info!("Session started for user {}", session.user.id);
    }

    /// 清除令牌与用户快照（登出）
    pub fn clear(&self) {
        self.clear_token();
        if let Some(storage) = &self.storage {
            storage.remove_item(USER_KEY);
        }
    }

    /// 服务端返回401时调用：令牌已失效，回到匿名状态
    pub fn invalidate(&self) {
        if self.is_authenticated() {
            info!("Session rejected by server, clearing cached credentials");
            self.clear();
        }
    }

    /// 只有当前令牌仍是被拒绝的那个时才清除，避免误清掉请求期间新建立的会话
    pub fn invalidate_token(&self, rejected: &str) {
        if self.token().as_deref() == Some(rejected) {
            self.invalidate();
        }
    }

    /// 从存储中恢复会话，令牌和用户快照必须同时存在
    pub fn restore(&self) -> Option<AuthSession> {
        match (self.token(), self.user()) {
            (Some(token), Some(user)) => Some(AuthSession { user, token }),
            (None, None) => None,
            _ => {
                warn!("Incomplete session in storage, starting anonymous");
                self.clear();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "user-1".to_string(),
            name: "Aria Montgomery".to_string(),
            email: "aria.m@example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_detached_store_is_noop() {
        let store = SessionStore::detached();
        store.set_token("abc");
        store.set_user(&user());
        assert!(!store.is_attached());
        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert!(store.restore().is_none());
    }

    #[test]
    fn test_save_restore_and_clear() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        store.save(&AuthSession { user: user(), token: "jwt".to_string() });

        // 同一份存储上新建的store可以恢复会话
        let reloaded = SessionStore::new(storage.clone());
        let restored = reloaded.restore().unwrap();
        assert_eq!(restored.token, "jwt");
        assert_eq!(restored.user, user());

        reloaded.clear();
        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert!(storage.get_item(USER_KEY).is_none());
    }

    #[test]
    fn test_restore_discards_incomplete_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "jwt");
        let store = SessionStore::new(storage.clone());
        assert!(store.restore().is_none());
        assert!(storage.get_item(TOKEN_KEY).is_none());
    }

    #[test]
    fn test_corrupt_user_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(USER_KEY, "{broken");
        let store = SessionStore::new(storage);
        assert!(store.user().is_none());
    }

    #[test]
    fn test_invalidate_only_when_authenticated() {
        let store = SessionStore::in_memory();
        store.invalidate();
        store.save(&AuthSession { user: user(), token: "jwt".to_string() });
        store.invalidate();
        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_invalidate_token_ignores_newer_session() {
        let store = SessionStore::in_memory();
        store.save(&AuthSession { user: user(), token: "new".to_string() });
        store.invalidate_token("old");
        assert!(store.is_authenticated());
        store.invalidate_token("new");
        assert!(!store.is_authenticated());
    }
}
