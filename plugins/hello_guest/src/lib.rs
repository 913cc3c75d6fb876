use hostcall_guest_sdk::{debug, export_guest_alloc, get_string, log};

export_guest_alloc!();

#[export_name = "testLog"]
pub extern "C" fn test_log() {
    log("Hello wasmer!");
}

/// 取回宿主的字符串并原样交还给宿主日志
#[export_name = "testGetString"]
pub extern "C" fn test_get_string() {
    let s = get_string();
    debug!("received {} bytes from host", s.len());
    log(&s);
}
