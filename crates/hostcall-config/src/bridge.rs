use serde::{Deserialize, Serialize};

/// 默认由 `getString` 交给客户端的字符串
pub const DEFAULT_HOST_STRING: &str = "Hello wasmer!";

/// 宿主配置，对应 `hostcall.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub engine: EngineConfig,
    pub memory: MemoryConfig,
    pub guest: GuestConfig,
    pub logging: LoggingConfig,
}

/// 编译优化级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

/// Wasm 引擎配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub opt_level: OptLevel,
    /// 设置后启用 epoch 中断，每个 store 在推进这么多个 epoch 后中断
    pub epoch_deadline: Option<u64>,
}

/// 客户端内存限制
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// 每个 store 线性内存的上限 (字节)
    pub max_memory_bytes: usize,
    /// 单次跨边界读取的字符串上限 (字节)
    pub max_string_len: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 16 * 1024 * 1024,
            max_string_len: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuestConfig {
    pub host_string: String,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            host_string: DEFAULT_HOST_STRING.to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter 语法，例如 "info,wasm_guest=debug"
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
