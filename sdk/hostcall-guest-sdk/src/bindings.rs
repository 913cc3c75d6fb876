use crate::alloc::take_string;
use hostcall_types::Handle;

#[link(wasm_import_module = "index")]
extern "C" {
    #[link_name = "log"]
    fn host_log(ptr: *const u8, len: usize);

    #[link_name = "getString"]
    fn host_get_string() -> u64;
}

#[link(wasm_import_module = "env")]
extern "C" {
    #[link_name = "abort"]
    fn host_abort(ptr: *const u8, len: usize);
}

/// 把消息交给宿主的日志出口
pub fn log(msg: &str) {
    unsafe { host_log(msg.as_ptr(), msg.len()) }
}

/// 取得宿主提供的字符串
///
/// 宿主通过导出的 `alloc` 写入，返回的 String 接管这块内存。
pub fn get_string() -> String {
    let handle = Handle::unpack(unsafe { host_get_string() });
    unsafe { take_string(handle.offset() as usize as *mut u8, handle.len() as usize) }
}

/// 让宿主中止当前调用
pub fn abort(msg: &str) -> ! {
    unsafe { host_abort(msg.as_ptr(), msg.len()) };
    unreachable!("host returned from abort")
}
