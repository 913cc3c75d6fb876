use hostcall_types::HostValue;
use std::sync::Mutex;
use tracing::Level;

/// 客户端发出的一条日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub guest: String,
    pub level: Level,
    pub message: HostValue,
}

/// 宿主侧日志出口
///
/// `emit` 在客户端调用期间同步执行，实现不能无限期阻塞。
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// 输出到 tracing，target 固定为 `wasm_guest`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        let guest = record.guest.as_str();
        let msg = record.message.as_str();

        match record.level {
            Level::ERROR => tracing::error!(target: "wasm_guest", guest, "{}", msg),
            Level::WARN => tracing::warn!(target: "wasm_guest", guest, "{}", msg),
            Level::INFO => tracing::info!(target: "wasm_guest", guest, "{}", msg),
            Level::DEBUG => tracing::debug!(target: "wasm_guest", guest, "{}", msg),
            _ => tracing::trace!(target: "wasm_guest", guest, "{}", msg),
        }
    }
}

/// 按顺序保存所有日志，便于检查客户端输出
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|record| record.message.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        // 记录只追加，锁被污染时数据依然可用
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        self.lock().push(record.clone());
    }
}
