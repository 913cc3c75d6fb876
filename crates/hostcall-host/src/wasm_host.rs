use anyhow::Result;
use hostcall_config::{EngineConfig, MemoryConfig, OptLevel};
use hostcall_types::{Handle, HostValue};
use std::sync::Arc;
use tracing::Level;
use wasmtime::{Caller, Config, Engine, Linker, Module, Store, StoreLimits, StoreLimitsBuilder};

use crate::error::BridgeError;
use crate::memory::Marshaller;
use crate::sink::{LogRecord, LogSink};

/// 每个 store 附带的宿主状态
pub struct HostState {
    guest_id: String,
    host_string: HostValue,
    max_string_len: u32,
    sink: Arc<dyn LogSink>,
    limits: StoreLimits,
}

impl HostState {
    pub fn new(
        guest_id: impl Into<String>,
        host_string: impl Into<HostValue>,
        memory: &MemoryConfig,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            guest_id: guest_id.into(),
            host_string: host_string.into(),
            max_string_len: memory.max_string_len,
            sink,
            limits: StoreLimitsBuilder::new()
                .memory_size(memory.max_memory_bytes)
                .build(),
        }
    }

    pub fn guest_id(&self) -> &str {
        &self.guest_id
    }

    pub fn host_string(&self) -> &HostValue {
        &self.host_string
    }

    pub fn set_host_string(&mut self, value: impl Into<HostValue>) {
        self.host_string = value.into();
    }

    pub fn max_string_len(&self) -> u32 {
        self.max_string_len
    }

    /// 交给日志出口，不返回任何值
    pub fn log_message(&self, level: Level, message: HostValue) {
        self.sink.emit(&LogRecord {
            guest: self.guest_id.clone(),
            level,
            message,
        });
    }
}

pub struct WasmHost {
    engine: Engine,
    epoch_deadline: Option<u64>,
}

impl WasmHost {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let mut wasm_config = Config::new();
        wasm_config.epoch_interruption(config.epoch_deadline.is_some());
        wasm_config.cranelift_opt_level(match config.opt_level {
            OptLevel::None => wasmtime::OptLevel::None,
            OptLevel::Speed => wasmtime::OptLevel::Speed,
            OptLevel::SpeedAndSize => wasmtime::OptLevel::SpeedAndSize,
        });

        let engine = Engine::new(&wasm_config)?;
        Ok(Self {
            engine,
            epoch_deadline: config.epoch_deadline,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// 编译模块，支持二进制和 WAT 文本
    pub fn load_module(&self, wasm_bytes: &[u8]) -> Result<Module> {
        Module::new(&self.engine, wasm_bytes)
    }

    /// prepare a fresh store for a new instance
    pub fn create_store(&self, state: HostState) -> Store<HostState> {
        let mut store = Store::new(&self.engine, state);
        store.limiter(|state| &mut state.limits);
        self.reset_deadline(&mut store);
        store
    }

    /// 从当前 epoch 重新计算调用截止点，未启用时无操作
    pub fn reset_deadline(&self, store: &mut Store<HostState>) {
        if let Some(ticks) = self.epoch_deadline {
            store.set_epoch_deadline(ticks);
        }
    }

    pub fn increment_epoch(&self) {
        self.engine.increment_epoch();
    }

    /// Linker with the boundary imports (`index`) and leveled logging (`env`)
    pub fn create_linker(&self) -> Result<Linker<HostState>> {
        let mut linker = Linker::new(&self.engine);

        Self::register_boundary_functions(&mut linker)?;
        Self::register_log_functions(&mut linker)?;

        Ok(linker)
    }

    fn register_boundary_functions(linker: &mut Linker<HostState>) -> Result<()> {
        linker.func_wrap(
            "index",
            "log",
            |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> Result<()> {
                Self::handle_log(&mut caller, Handle::from_raw(ptr, len), Level::INFO)
            },
        )?;

        linker.func_wrap(
            "index",
            "getString",
            |mut caller: Caller<'_, HostState>| -> Result<i64> { Self::handle_get_string(&mut caller) },
        )?;

        linker.func_wrap(
            "env",
            "abort",
            |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> Result<()> {
                Self::handle_abort(&mut caller, Handle::from_raw(ptr, len))
            },
        )?;

        Ok(())
    }

    /// 注册所有日志级别的导入函数
    fn register_log_functions(linker: &mut Linker<HostState>) -> Result<()> {
        macro_rules! register_log {
            ($name:literal, $level:expr) => {
                linker.func_wrap(
                    "env",
                    $name,
                    move |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> Result<()> {
                        Self::handle_log(&mut caller, Handle::from_raw(ptr, len), $level)
                    },
                )?;
            };
        }

        register_log!("log_trace", Level::TRACE);
        register_log!("log_debug", Level::DEBUG);
        register_log!("log_info", Level::INFO);
        register_log!("log_warn", Level::WARN);
        register_log!("log_error", Level::ERROR);

        Ok(())
    }

    fn handle_log(caller: &mut Caller<'_, HostState>, handle: Handle, level: Level) -> Result<()> {
        let max_string_len = caller.data().max_string_len();
        let marshaller = Marshaller::from_caller(caller, max_string_len)?;
        let message = marshaller.read_string(&*caller, handle)?;

        caller.data().log_message(level, message);
        Ok(())
    }

    fn handle_get_string(caller: &mut Caller<'_, HostState>) -> Result<i64> {
        let value = caller.data().host_string().clone();
        let max_string_len = caller.data().max_string_len();

        let marshaller = Marshaller::from_caller(caller, max_string_len)?;
        let handle = marshaller.write_string(&mut *caller, &value)?;

        tracing::trace!(guest = caller.data().guest_id(), %handle, "host string written");
        Ok(handle.pack() as i64)
    }

    fn handle_abort(caller: &mut Caller<'_, HostState>, handle: Handle) -> Result<()> {
        let max_string_len = caller.data().max_string_len();
        let marshaller = Marshaller::from_caller(caller, max_string_len)?;
        let message = marshaller.read_string(&*caller, handle)?;

        tracing::warn!(guest = caller.data().guest_id(), "guest aborted: {}", message);
        Err(BridgeError::GuestAbort(message.into_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use hostcall_config::BridgeConfig;
    use wasmtime::Instance;

    fn host_and_store(sink: Arc<dyn LogSink>) -> (WasmHost, Store<HostState>) {
        let config = BridgeConfig::default();
        let host = WasmHost::new(&config.engine).unwrap();
        let store = host.create_store(HostState::new(
            "unit",
            config.guest.host_string.clone(),
            &config.memory,
            sink,
        ));
        (host, store)
    }

    #[test]
    fn test_wasm_host_new() {
        assert!(WasmHost::new(&EngineConfig::default()).is_ok());

        let config = EngineConfig {
            opt_level: OptLevel::None,
            epoch_deadline: Some(5),
        };
        assert!(WasmHost::new(&config).is_ok());
    }

    #[test]
    fn test_load_invalid_wasm() {
        let host = WasmHost::new(&EngineConfig::default()).unwrap();
        let invalid_wasm = vec![0x00, 0x61, 0x73, 0x6d]; // 不完整的 Wasm 头

        assert!(host.load_module(&invalid_wasm).is_err());
    }

    #[test]
    fn test_leveled_log_imports() {
        let sink = Arc::new(MemorySink::new());
        let (host, mut store) = host_and_store(sink.clone());
        let module = host
            .load_module(
                br#"
(module
  (import "env" "log_debug" (func $debug (param i32 i32)))
  (import "env" "log_error" (func $error (param i32 i32)))
  (memory (export "memory") 1)
  (data (i32.const 8) "detailsfailure")
  (func (export "run")
    (call $debug (i32.const 8) (i32.const 7))
    (call $error (i32.const 15) (i32.const 7))))
"#,
            )
            .unwrap();

        let linker = host.create_linker().unwrap();
        let instance: Instance = linker.instantiate(&mut store, &module).unwrap();
        let run = instance.get_typed_func::<(), ()>(&mut store, "run").unwrap();
        run.call(&mut store, ()).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::DEBUG);
        assert_eq!(records[0].message.as_str(), "details");
        assert_eq!(records[1].level, Level::ERROR);
        assert_eq!(records[1].message.as_str(), "failure");
        assert!(records.iter().all(|record| record.guest == "unit"));
    }

    #[test]
    fn test_log_without_memory_export_traps() {
        let sink = Arc::new(MemorySink::new());
        let (host, mut store) = host_and_store(sink.clone());
        let module = host
            .load_module(
                br#"
(module
  (import "index" "log" (func $log (param i32 i32)))
  (func (export "run") (call $log (i32.const 0) (i32.const 1))))
"#,
            )
            .unwrap();

        let linker = host.create_linker().unwrap();
        let instance = linker.instantiate(&mut store, &module).unwrap();
        let run = instance.get_typed_func::<(), ()>(&mut store, "run").unwrap();

        let err = BridgeError::from(run.call(&mut store, ()).unwrap_err());
        assert!(matches!(err, BridgeError::MissingExport(ref name) if name == "memory"));
        assert!(sink.is_empty());
    }
}
