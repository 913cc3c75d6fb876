use anyhow::{anyhow, Result};
use config::{Config, File, FileFormat};
use std::path::{Path, PathBuf};

use crate::BridgeConfig;

const CONFIG_FILE: &str = "hostcall.toml";

/// 配置加载器
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_dir: P) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// 加载配置，文件不存在时返回默认配置
    pub fn load(&self) -> Result<BridgeConfig> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(BridgeConfig::default());
        }

        let config = Config::builder()
            .add_source(File::new(
                config_path.to_str().ok_or_else(|| anyhow!("Invalid config path"))?,
                FileFormat::Toml,
            ))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// 加载并校验
    pub fn load_validated(&self) -> Result<BridgeConfig> {
        let config = self.load()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// 写出配置文件，目录不存在时创建
    pub fn save(&self, config: &BridgeConfig) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config_dir)?;
        let config_path = self.config_path();
        std::fs::write(&config_path, toml::to_string_pretty(config)?)?;
        Ok(config_path)
    }

    pub fn validate(config: &BridgeConfig) -> Result<()> {
        let memory = &config.memory;

        if memory.max_memory_bytes == 0 {
            return Err(anyhow!("max_memory_bytes must be greater than 0"));
        }

        if memory.max_string_len == 0 {
            return Err(anyhow!("max_string_len must be greater than 0"));
        }

        if memory.max_string_len as usize > memory.max_memory_bytes {
            return Err(anyhow!(
                "max_string_len ({}) cannot be greater than max_memory_bytes ({})",
                memory.max_string_len,
                memory.max_memory_bytes
            ));
        }

        if config.engine.epoch_deadline == Some(0) {
            return Err(anyhow!("epoch_deadline must be greater than 0 when set"));
        }

        if config.logging.filter.trim().is_empty() {
            return Err(anyhow!("logging filter cannot be empty"));
        }

        Ok(())
    }
}
