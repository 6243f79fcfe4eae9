mod app;
mod config;
mod error;
mod repl;

use app::App;
use config::Config;
use error::{QuillError, Result};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    quill_infra::logging::init(&config.logging.level, config.logging.json)?;
    info!("Starting Quill...");
    info!("Configuration loaded successfully");

    // 初始化应用状态
    let app = App::init(config)?;
    match app.auth.restore() {
        Some(user) => info!("Session restored for {}", user.id),
        None => info!("No saved session, browsing anonymously"),
    }

    repl::run(&app)
        .await
        .map_err(|e| QuillError::Internal(format!("{:#}", e)))?;

    info!("Bye");
    Ok(())
}
