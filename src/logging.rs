//! 日誌系統初始化

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::LogConfig;

/// 安裝全域 tracing 訂閱者
///
/// 設置了 `RUST_LOG` 時以其為準，否則使用配置中的日誌級別。
pub fn init_logging(log_config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(log_config)))
        .map_err(|e| anyhow!("無效的日誌級別 {}: {}", log_config.level, e))?;

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    let installed = if log_config.format.eq_ignore_ascii_case("compact") {
        builder.compact().try_init()
    } else {
        builder.pretty().try_init()
    };
    installed.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!(level = %log_config.level, format = %log_config.format, "日誌系統初始化完成");
    Ok(())
}

fn default_directive(log_config: &LogConfig) -> String {
    match log_config.level.to_lowercase().as_str() {
        level @ ("trace" | "debug" | "info" | "warn" | "error") => level.to_string(),
        _ => "info".to_string(),
    }
}
