/// 为宿主写入分配 `len` 字节，所有权交给调用方
///
/// 用 boxed slice 分配，容量严格等于 `len`，释放时可以按 `len` 原样重建。
pub fn guest_alloc(len: usize) -> *mut u8 {
    let buf = vec![0u8; len].into_boxed_slice();
    Box::into_raw(buf) as *mut u8
}

/// 释放 `guest_alloc` 分配的区域
///
/// # Safety
///
/// `ptr` 必须来自 `guest_alloc(len)`，且只能释放一次。
pub unsafe fn guest_dealloc(ptr: *mut u8, len: usize) {
    drop(reclaim(ptr, len));
}

/// 接管宿主写入的字符串，区域随返回的 String 一起释放
///
/// 宿主只写入已经校验过的 UTF-8 (`HostValue`)，这里不会出现非法字节；
/// 万一出现也按替换字符解码，而不是让客户端 panic 成 trap。
///
/// # Safety
///
/// `ptr` 必须来自 `guest_alloc(len)`，并且宿主已经写满 `len` 字节。
pub unsafe fn take_string(ptr: *mut u8, len: usize) -> String {
    let bytes = reclaim(ptr, len).into_vec();
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

unsafe fn reclaim(ptr: *mut u8, len: usize) -> Box<[u8]> {
    Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len))
}
