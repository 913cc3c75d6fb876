//! 客户端 (wasm32) 一侧的边界绑定
//!
//! 宿主导入只在 wasm32 目标下声明；分配器相关代码在任何目标下都可编译和测试。

pub mod alloc;
pub mod logging;
mod macros;

#[cfg(target_arch = "wasm32")]
mod bindings;

#[cfg(target_arch = "wasm32")]
pub use bindings::{abort, get_string, log};

pub use hostcall_types::Handle;
