use hostcall_types::{Handle, HostValue};
use wasmtime::{AsContext, AsContextMut, Caller, Extern, Func, Instance, Memory, TypedFunc};

use crate::error::{BridgeError, Result};

/// 客户端内存与宿主值之间的转换器
///
/// 只持有客户端导出项的引用 (`memory`、`alloc`、`dealloc`)，本身无状态，
/// 每次转换都重新检查当前内存大小，因此内存增长后依然安全。
#[derive(Clone)]
pub struct Marshaller {
    memory: Memory,
    alloc: Option<TypedFunc<i32, i32>>,
    dealloc: Option<TypedFunc<(i32, i32), ()>>,
    max_string_len: u32,
}

impl Marshaller {
    /// 从已实例化的模块解析导出项
    pub fn from_instance(
        instance: &Instance,
        mut store: impl AsContextMut,
        max_string_len: u32,
    ) -> Result<Self> {
        let memory = instance.get_memory(&mut store, "memory");
        let alloc = instance.get_func(&mut store, "alloc");
        let dealloc = instance.get_func(&mut store, "dealloc");

        Self::resolve(&store, memory, alloc, dealloc, max_string_len)
    }

    /// 在导入函数内部，通过 Caller 解析调用方的导出项
    pub fn from_caller<T>(caller: &mut Caller<'_, T>, max_string_len: u32) -> Result<Self> {
        let memory = match caller.get_export("memory") {
            Some(Extern::Memory(memory)) => Some(memory),
            _ => None,
        };
        let alloc = caller.get_export("alloc").and_then(Extern::into_func);
        let dealloc = caller.get_export("dealloc").and_then(Extern::into_func);

        Self::resolve(&*caller, memory, alloc, dealloc, max_string_len)
    }

    fn resolve(
        store: impl AsContext,
        memory: Option<Memory>,
        alloc: Option<Func>,
        dealloc: Option<Func>,
        max_string_len: u32,
    ) -> Result<Self> {
        let memory = memory.ok_or_else(|| BridgeError::MissingExport("memory".to_string()))?;

        let alloc = alloc
            .map(|func| func.typed::<i32, i32>(&store))
            .transpose()
            .map_err(|e| BridgeError::MissingExport(format!("alloc: {e}")))?;

        let dealloc = dealloc
            .map(|func| func.typed::<(i32, i32), ()>(&store))
            .transpose()
            .map_err(|e| BridgeError::MissingExport(format!("dealloc: {e}")))?;

        Ok(Self {
            memory,
            alloc,
            dealloc,
            max_string_len,
        })
    }

    /// 当前线性内存大小 (字节)
    pub fn memory_size(&self, store: impl AsContext) -> u64 {
        self.memory.data_size(store) as u64
    }

    /// 把 Handle 指向的字节拷贝成宿主字符串
    ///
    /// 先检查 offset+len 是否落在当前内存内，再检查长度上限和 UTF-8。
    pub fn read_string(&self, store: impl AsContext, handle: Handle) -> Result<HostValue> {
        let data = self.memory.data(store.as_context());
        let memory_size = data.len() as u64;

        if handle.end() > memory_size {
            return Err(BridgeError::OutOfBounds {
                handle,
                memory_size,
            });
        }

        if handle.len() > self.max_string_len {
            return Err(BridgeError::LimitExceeded {
                len: handle.len() as u64,
                limit: self.max_string_len,
            });
        }

        let bytes = data[handle.offset() as usize..handle.end() as usize].to_vec();
        Ok(HostValue::from_utf8(bytes)?)
    }

    /// 通过客户端的 `alloc` 申请空间并写入字符串
    ///
    /// 返回的区域归客户端所有，由客户端 (或 `release`) 负责释放。
    pub fn write_string(&self, mut store: impl AsContextMut, value: &HostValue) -> Result<Handle> {
        let alloc = self
            .alloc
            .as_ref()
            .ok_or_else(|| BridgeError::MissingExport("alloc".to_string()))?;

        let bytes = value.as_bytes();
        let requested = bytes.len() as u64;
        let len = u32::try_from(bytes.len()).map_err(|_| BridgeError::Allocation {
            requested,
            reason: "length does not fit in 32 bits".to_string(),
        })?;

        let ptr = alloc
            .call(&mut store, len as i32)
            .map_err(|e| BridgeError::Allocation {
                requested,
                reason: format!("guest allocator trapped: {e:#}"),
            })?;

        if ptr == 0 && len > 0 {
            return Err(BridgeError::Allocation {
                requested,
                reason: "guest allocator returned null".to_string(),
            });
        }

        let handle = Handle::new(ptr as u32, len);
        let memory_size = self.memory_size(&store);
        if handle.end() > memory_size {
            return Err(BridgeError::Allocation {
                requested,
                reason: format!("allocator returned {handle} outside {memory_size} bytes of memory"),
            });
        }

        self.memory
            .write(&mut store, handle.offset() as usize, bytes)
            .map_err(|_| BridgeError::OutOfBounds {
                handle,
                memory_size,
            })?;

        Ok(handle)
    }

    /// 把宿主写入的区域交还给客户端的 `dealloc`，客户端未导出时什么都不做
    pub fn release(&self, mut store: impl AsContextMut, handle: Handle) -> Result<()> {
        match &self.dealloc {
            Some(dealloc) => Ok(dealloc.call(&mut store, handle.to_raw())?),
            None => Ok(()),
        }
    }
}
