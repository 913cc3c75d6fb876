use serde::{Deserialize, Serialize};
use std::fmt;

/// 客户端线性内存中的一段区域 (offset + len)
///
/// Handle 只在所属客户端的内存中有效，宿主不能直接解引用，
/// 必须通过 `Marshaller::read_string` 做边界检查后拷贝出来。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle {
    offset: u32,
    len: u32,
}

impl Handle {
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// 从 Wasm 函数参数构造，i32 按位解释为 u32
    pub const fn from_raw(ptr: i32, len: i32) -> Self {
        Self::new(ptr as u32, len as u32)
    }

    pub const fn offset(&self) -> u32 {
        self.offset
    }

    pub const fn len(&self) -> u32 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 区域末尾 (不含)，用 u64 计算避免溢出
    pub const fn end(&self) -> u64 {
        self.offset as u64 + self.len as u64
    }

    /// 打包成单个 i64 返回值: 高 32 位 offset，低 32 位 len
    pub const fn pack(&self) -> u64 {
        ((self.offset as u64) << 32) | self.len as u64
    }

    pub const fn unpack(packed: u64) -> Self {
        Self::new((packed >> 32) as u32, packed as u32)
    }

    /// 作为 Wasm 参数传递时的 (ptr, len)
    pub const fn to_raw(&self) -> (i32, i32) {
        (self.offset as i32, self.len as i32)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle(offset={}, len={})", self.offset, self.len)
    }
}
