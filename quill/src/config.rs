use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub feed: FeedConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStorageKind {
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub storage: SessionStorageKind,
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: SessionStorageKind::File,
            path: work_dir().join("session.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub page_size: u32,
    pub profile_page_size: u32,
    pub search_debounce_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 8,
            profile_page_size: 10,
            search_debounce_ms: 500,
        }
    }
}

impl FeedConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub user_capacity: u64,
    pub user_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_capacity: 1000,
            user_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

fn work_dir() -> PathBuf {
    let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home_dir.join(".quill")
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // 如果存在.env文件，先把其中的变量放进环境
        let _ = dotenv::dotenv();
        Self::load_from(Path::new("quill.toml"), &work_dir().join("quill.toml"))
    }

    /// 依次叠加：用户目录的配置、当前目录的配置、QUILL__ 前缀的环境变量
    pub fn load_from(local: &Path, user: &Path) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(user).required(false))
            .add_source(config::File::from(local).required(false))
            .add_source(config::Environment::with_prefix("QUILL").separator("__"))
            .build()?;
        config.try_deserialize()
    }
}
