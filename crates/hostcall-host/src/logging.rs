use hostcall_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::error::{BridgeError, Result};

/// 安装全局 tracing subscriber
///
/// 返回 `false` 表示进程里已经有 subscriber，本次没有替换。
pub fn init_logging(config: &LoggingConfig) -> Result<bool> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| BridgeError::Config(format!("invalid log filter '{}': {}", config.filter, e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    Ok(installed)
}
