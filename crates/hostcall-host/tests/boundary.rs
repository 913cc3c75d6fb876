use hostcall_host::{BridgeConfig, BridgeError, GuestManager, Handle, LogSink, MemorySink};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::Level;

const HELLO_GUEST: &str = include_str!("fixtures/hello_guest.wat");

fn setup(config: BridgeConfig) -> (GuestManager, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let manager = GuestManager::with_sink(config, sink.clone() as Arc<dyn LogSink>).unwrap();
    manager.load_guest("hello", HELLO_GUEST.as_bytes()).unwrap();
    (manager, sink)
}

#[test]
fn test_get_string_scenario() {
    let (manager, sink) = setup(BridgeConfig::default());

    manager.test_get_string("hello").unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message.as_bytes(), b"Hello wasmer!");
    assert_eq!(records[0].level, Level::INFO);
    assert_eq!(records[0].guest, "hello");
}

#[test]
fn test_log_twice_is_identical() {
    let (manager, sink) = setup(BridgeConfig::default());

    manager.test_log("hello").unwrap();
    manager.test_log("hello").unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], records[1]);
    assert_eq!(records[0].message.as_str(), "Hello wasmer!");
}

#[test]
fn test_configured_host_string() {
    let mut config = BridgeConfig::default();
    config.guest.host_string = "Hello AssemblyScript!".to_string();
    let (manager, sink) = setup(config);

    manager.test_get_string("hello").unwrap();
    manager.set_host_string("hello", "changed at runtime").unwrap();
    manager.test_get_string("hello").unwrap();

    assert_eq!(
        sink.messages(),
        vec!["Hello AssemblyScript!", "changed at runtime"]
    );
}

#[test]
fn test_round_trip_through_guest_memory() {
    let (manager, _) = setup(BridgeConfig::default());
    let large = "x".repeat(10240);
    let samples = [
        "",
        "Hello wasmer!",
        "héllo wörld ✓ 🦀",
        "embedded\0nul",
        large.as_str(),
    ];

    for sample in samples {
        let handle = manager.write_string("hello", sample).unwrap();
        assert_eq!(handle.len() as usize, sample.len());
        assert_eq!(manager.read_string("hello", handle).unwrap().as_str(), sample);
    }
}

#[test]
fn test_read_out_of_bounds() {
    let (manager, _) = setup(BridgeConfig::default());
    let memory_size = manager.memory_size("hello").unwrap();

    let handle = Handle::new(memory_size as u32 - 4, 8);
    let err = manager.read_string("hello", handle).unwrap_err();
    assert!(matches!(err, BridgeError::OutOfBounds { .. }), "{err}");
}

#[test]
fn test_guest_log_out_of_bounds_aborts_call() {
    let (manager, sink) = setup(BridgeConfig::default());

    let err = manager.call_entry("hello", "logOutOfBounds").unwrap_err();
    assert!(err.is_boundary());
    match err {
        BridgeError::OutOfBounds { handle, memory_size } => {
            assert_eq!(handle, Handle::new(65530, 100));
            assert_eq!(memory_size, 65536);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.is_empty());

    // 失败的调用不影响后续调用
    manager.test_log("hello").unwrap();
    assert_eq!(sink.messages(), vec!["Hello wasmer!"]);
}

#[test]
fn test_guest_log_invalid_utf8() {
    let (manager, sink) = setup(BridgeConfig::default());

    let err = manager.call_entry("hello", "logInvalidUtf8").unwrap_err();
    assert!(matches!(err, BridgeError::InvalidUtf8(_)), "{err}");
    assert!(sink.is_empty());
}

#[test]
fn test_read_limit() {
    let mut config = BridgeConfig::default();
    config.memory.max_string_len = 8;
    let (manager, sink) = setup(config);

    let err = manager.test_log("hello").unwrap_err();
    assert!(matches!(err, BridgeError::LimitExceeded { len: 13, limit: 8 }), "{err}");
    assert!(sink.is_empty());
}

#[test]
fn test_allocation_error_when_memory_capped() {
    let mut config = BridgeConfig::default();
    config.memory.max_memory_bytes = 2 * 65536;
    config.memory.max_string_len = 65536;
    let (manager, _) = setup(config);

    // 第二页之内可以增长
    let handle = manager.write_string("hello", &"a".repeat(100_000)).unwrap();
    assert_eq!(handle.len(), 100_000);
    assert_eq!(manager.memory_size("hello").unwrap(), 2 * 65536);

    let err = manager
        .write_string("hello", &"b".repeat(100_000))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Allocation { requested: 100_000, .. }), "{err}");
    assert_eq!(manager.memory_size("hello").unwrap(), 2 * 65536);
}

#[test]
fn test_get_string_allocation_error_surfaces() {
    let mut config = BridgeConfig::default();
    config.memory.max_memory_bytes = 65536;
    config.memory.max_string_len = 65536;
    let (manager, sink) = setup(config);

    manager.set_host_string("hello", &"c".repeat(70_000)).unwrap();
    let err = manager.test_get_string("hello").unwrap_err();
    assert!(matches!(err, BridgeError::Allocation { .. }), "{err}");
    assert!(sink.is_empty());
}

#[test]
fn test_get_string_without_alloc() {
    let sink = Arc::new(MemorySink::new());
    let manager = GuestManager::with_sink(BridgeConfig::default(), sink.clone()).unwrap();
    let wat = r#"
(module
  (import "index" "getString" (func $get_string (result i64)))
  (memory (export "memory") 1)
  (func (export "testGetString") (drop (call $get_string))))
"#;
    manager.load_guest("no_alloc", wat.as_bytes()).unwrap();

    let err = manager.test_get_string("no_alloc").unwrap_err();
    assert!(matches!(err, BridgeError::MissingExport(ref name) if name == "alloc"));
}

#[test]
fn test_leveled_log_and_abort() {
    let (manager, sink) = setup(BridgeConfig::default());

    manager.call_entry("hello", "warnDisk").unwrap();
    let records = sink.records();
    assert_eq!(records[0].level, Level::WARN);
    assert_eq!(records[0].message.as_str(), "disk almost full");

    let err = manager.call_entry("hello", "abortGuest").unwrap_err();
    assert!(matches!(err, BridgeError::GuestAbort(ref msg) if msg == "guest gave up"));
}

#[test]
fn test_epoch_deadline_interrupts_spinning_guest() {
    let mut config = BridgeConfig::default();
    config.engine.epoch_deadline = Some(1);
    let (manager, sink) = setup(config);
    let manager = Arc::new(manager);

    let ticker = {
        let manager = manager.clone();
        thread::spawn(move || {
            for _ in 0..100 {
                thread::sleep(Duration::from_millis(10));
                manager.advance_epoch();
            }
        })
    };

    let err = manager.call_entry("hello", "spin").unwrap_err();
    assert!(matches!(err, BridgeError::Wasm(_)), "{err}");
    assert!(!err.is_boundary());
    ticker.join().unwrap();

    // 下一次调用重新计算截止点
    manager.test_log("hello").unwrap();
    assert_eq!(sink.messages(), vec!["Hello wasmer!"]);
}
