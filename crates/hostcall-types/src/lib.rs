//! 宿主与 Wasm 客户端之间共享的边界类型
//!
//! 同时为宿主 (native) 和客户端 (wasm32) 编译，因此只依赖 serde。

pub mod handle;
pub mod value;

pub use handle::Handle;
pub use value::HostValue;
