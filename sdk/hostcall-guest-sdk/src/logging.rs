//! 多级别日志宏，与宿主的 tracing 系统集成

// Host 提供的日志函数声明
// 注意：必须声明为 pub，因为宏会在其他 crate 中展开并调用这些函数
#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "env")]
extern "C" {
    pub fn log_trace(ptr: *const u8, len: usize);
    pub fn log_debug(ptr: *const u8, len: usize);
    pub fn log_info(ptr: *const u8, len: usize);
    pub fn log_warn(ptr: *const u8, len: usize);
    pub fn log_error(ptr: *const u8, len: usize);
}

#[doc(hidden)]
#[macro_export]
macro_rules! __guest_log {
    ($import:ident, $($arg:tt)*) => {{
        let msg = format!($($arg)*);
        unsafe {
            $crate::logging::$import(msg.as_ptr(), msg.len());
        }
    }};
}

/// TRACE 级别日志
///
/// ```ignore
/// trace!("entry called with {} bytes", len);
/// ```
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::__guest_log!(log_trace, $($arg)*) };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::__guest_log!(log_debug, $($arg)*) };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__guest_log!(log_info, $($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__guest_log!(log_warn, $($arg)*) };
}

/// ERROR 级别日志，表示客户端内部出现严重问题
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__guest_log!(log_error, $($arg)*) };
}
