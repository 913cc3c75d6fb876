pub mod bridge;
pub mod loader;

pub use bridge::{BridgeConfig, EngineConfig, GuestConfig, LoggingConfig, MemoryConfig, OptLevel};
pub use loader::ConfigLoader;
