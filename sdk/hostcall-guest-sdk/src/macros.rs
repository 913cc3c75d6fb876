/// 导出 `alloc` 和 `dealloc`
///
/// 宿主通过 `alloc` 在客户端线性内存中为 `getString` 的结果申请空间。
#[macro_export]
macro_rules! export_guest_alloc {
    () => {
        #[no_mangle]
        pub extern "C" fn alloc(len: usize) -> *mut u8 {
            $crate::alloc::guest_alloc(len)
        }

        #[no_mangle]
        pub unsafe extern "C" fn dealloc(ptr: *mut u8, len: usize) {
            $crate::alloc::guest_dealloc(ptr, len)
        }
    };
}
