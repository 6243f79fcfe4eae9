use tracing_subscriber::EnvFilter;

/// 初始化全局日志
///
/// `RUST_LOG` 存在时优先于配置中的级别。重复初始化返回错误。
pub fn init(level: &str, json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
