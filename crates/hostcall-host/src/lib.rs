//! Wasm 宿主侧边界层
//!
//! 在客户端线性内存与宿主原生字符串之间做显式拷贝，
//! 并向客户端提供 `index.log` / `index.getString` 等导入函数。

pub mod error;
pub mod logging;
pub mod manager;
pub mod memory;
pub mod sink;
pub mod wasm_host;

pub use error::{BridgeError, Result};
pub use hostcall_config::BridgeConfig;
pub use hostcall_types::{Handle, HostValue};
pub use manager::GuestManager;
pub use memory::Marshaller;
pub use sink::{LogRecord, LogSink, MemorySink, TracingSink};
pub use wasm_host::{HostState, WasmHost};
