use anyhow::Context;
use hostcall_config::{BridgeConfig, ConfigLoader};
use hostcall_types::{Handle, HostValue};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use wasmtime::{Instance, Store};

use crate::error::{BridgeError, Result};
use crate::memory::Marshaller;
use crate::sink::{LogSink, TracingSink};
use crate::wasm_host::{HostState, WasmHost};

/// 管理已加载的客户端实例
///
/// 每个客户端独占一个 store，所有调用都在写锁内完成，
/// 因此同一时刻只有一个调用方进入某个客户端。
pub struct GuestManager {
    host: WasmHost,
    config: BridgeConfig,
    sink: Arc<dyn LogSink>,
    instances: RwLock<HashMap<String, GuestInstance>>,
}

struct GuestInstance {
    store: Store<HostState>,
    instance: Instance,
    marshaller: Marshaller,
}

impl GuestManager {
    /// 客户端日志输出到 tracing
    pub fn new(config: BridgeConfig) -> Result<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: BridgeConfig, sink: Arc<dyn LogSink>) -> Result<Self> {
        ConfigLoader::validate(&config).map_err(|e| BridgeError::Config(e.to_string()))?;
        let host = WasmHost::new(&config.engine)
            .map_err(|e| BridgeError::Config(format!("failed to create engine: {e:#}")))?;

        Ok(Self {
            host,
            config,
            sink,
            instances: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// 编译并实例化客户端，同名客户端会被替换
    pub fn load_guest(&self, guest_id: &str, wasm_bytes: &[u8]) -> Result<()> {
        let module = self.host.load_module(wasm_bytes)?;
        let linker = self.host.create_linker()?;

        let state = HostState::new(
            guest_id,
            self.config.guest.host_string.as_str(),
            &self.config.memory,
            self.sink.clone(),
        );
        let mut store = self.host.create_store(state);

        let instance = linker
            .instantiate(&mut store, &module)
            .context("Failed to instantiate guest")?;
        let marshaller =
            Marshaller::from_instance(&instance, &mut store, self.config.memory.max_string_len)?;

        let mut instances = self
            .instances
            .write()
            .map_err(|e| BridgeError::LockPoisoned(e.to_string()))?;
        let replaced = instances
            .insert(
                guest_id.to_string(),
                GuestInstance {
                    store,
                    instance,
                    marshaller,
                },
            )
            .is_some();

        tracing::info!(guest = guest_id, replaced, "guest loaded");
        Ok(())
    }

    pub fn unload_guest(&self, guest_id: &str) -> Result<bool> {
        let mut instances = self
            .instances
            .write()
            .map_err(|e| BridgeError::LockPoisoned(e.to_string()))?;
        Ok(instances.remove(guest_id).is_some())
    }

    pub fn guest_ids(&self) -> Result<Vec<String>> {
        let instances = self
            .instances
            .read()
            .map_err(|e| BridgeError::LockPoisoned(e.to_string()))?;
        let mut ids: Vec<String> = instances.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// 调用客户端导出的无参入口函数
    ///
    /// 导入函数中产生的 `BridgeError` 会原样返回，当前调用不会有部分结果。
    pub fn call_entry(&self, guest_id: &str, name: &str) -> Result<()> {
        self.with_guest(guest_id, |host, guest| {
            let entry = guest
                .instance
                .get_typed_func::<(), ()>(&mut guest.store, name)
                .map_err(|e| BridgeError::MissingExport(format!("{name}: {e}")))?;

            host.reset_deadline(&mut guest.store);
            tracing::debug!(guest = guest_id, entry = name, "calling guest entry");

            entry.call(&mut guest.store, ()).map_err(|e| {
                let err = BridgeError::from(e);
                if err.is_boundary() {
                    tracing::warn!(guest = guest_id, entry = name, error = %err, "guest call aborted at the boundary");
                } else {
                    tracing::debug!(guest = guest_id, entry = name, error = %err, "guest call failed");
                }
                err
            })
        })
    }

    pub fn test_log(&self, guest_id: &str) -> Result<()> {
        self.call_entry(guest_id, "testLog")
    }

    pub fn test_get_string(&self, guest_id: &str) -> Result<()> {
        self.call_entry(guest_id, "testGetString")
    }

    /// 把宿主字符串写入客户端内存
    pub fn write_string(&self, guest_id: &str, value: &str) -> Result<Handle> {
        self.with_guest(guest_id, |_, guest| {
            guest
                .marshaller
                .write_string(&mut guest.store, &HostValue::from(value))
        })
    }

    /// 从客户端内存拷贝出字符串
    pub fn read_string(&self, guest_id: &str, handle: Handle) -> Result<HostValue> {
        self.with_guest(guest_id, |_, guest| {
            guest.marshaller.read_string(&guest.store, handle)
        })
    }

    pub fn release(&self, guest_id: &str, handle: Handle) -> Result<()> {
        self.with_guest(guest_id, |_, guest| {
            guest
                .marshaller
                .release(&mut guest.store, handle)
                .map_err(|e| {
                    tracing::error!(guest = guest_id, %handle, "Failed to release guest memory: {}", e);
                    e
                })
        })
    }

    /// 修改该客户端后续 `getString` 返回的字符串
    pub fn set_host_string(&self, guest_id: &str, value: &str) -> Result<()> {
        self.with_guest(guest_id, |_, guest| {
            guest.store.data_mut().set_host_string(value);
            Ok(())
        })
    }

    pub fn memory_size(&self, guest_id: &str) -> Result<u64> {
        self.with_guest(guest_id, |_, guest| {
            Ok(guest.marshaller.memory_size(&guest.store))
        })
    }

    /// 推进引擎 epoch，超过截止点的调用会被中断
    pub fn advance_epoch(&self) {
        self.host.increment_epoch();
    }

    fn with_guest<R>(
        &self,
        guest_id: &str,
        f: impl FnOnce(&WasmHost, &mut GuestInstance) -> Result<R>,
    ) -> Result<R> {
        let mut instances = self
            .instances
            .write()
            .map_err(|e| BridgeError::LockPoisoned(e.to_string()))?;
        let guest = instances
            .get_mut(guest_id)
            .ok_or_else(|| BridgeError::GuestNotFound(guest_id.to_string()))?;

        f(&self.host, guest)
    }
}
