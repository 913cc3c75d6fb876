use hostcall_types::Handle;
use thiserror::Error;

/// 边界层统一错误类型
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Allocation error: cannot allocate {requested} bytes in guest memory: {reason}")]
    Allocation { requested: u64, reason: String },

    #[error("Out of bounds: {handle} exceeds guest memory of {memory_size} bytes")]
    OutOfBounds { handle: Handle, memory_size: u64 },

    #[error("Invalid UTF-8 in guest string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("String of {len} bytes exceeds limit of {limit} bytes")]
    LimitExceeded { len: u64, limit: u32 },

    #[error("Guest must export '{0}'")]
    MissingExport(String),

    #[error("Guest aborted: {0}")]
    GuestAbort(String),

    #[error("Guest not found: {0}")]
    GuestNotFound(String),

    #[error("Failed to acquire guest lock: {0}")]
    LockPoisoned(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wasm error: {0:#}")]
    Wasm(anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, BridgeError>;

/// 导入函数返回的错误会被 wasmtime 包成 trap 并附加回溯上下文，
/// 这里先尝试还原出原始的 `BridgeError`。
impl From<anyhow::Error> for BridgeError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BridgeError>() {
            Ok(bridge) => bridge,
            Err(other) => BridgeError::Wasm(other),
        }
    }
}

impl BridgeError {
    /// 是否属于当前调用必须中止的边界错误
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            BridgeError::Allocation { .. }
                | BridgeError::OutOfBounds { .. }
                | BridgeError::InvalidUtf8(_)
                | BridgeError::LimitExceeded { .. }
        )
    }
}
