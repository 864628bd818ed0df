//! 用户配置
//!
//! `config.yml` 提供 merge / exclude / sync.auto 三项设置。
//! 首次运行时写入内嵌的默认配置。

pub mod exclude;
pub mod merge;
pub mod paths;

pub use exclude::ExcludePatterns;
pub use merge::MergeBehavior;
pub use paths::*;

use anyhow::{anyhow, Context, Result};
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::XfconfError;
use crate::utils::{file_exists, read_file, write_file};

/// 内嵌资源（默认配置、systemd unit）
#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct ConfigAssets;

impl ConfigAssets {
    /// 获取默认 config.yml
    pub fn default_config() -> Result<String> {
        Self::get_file(CONFIG_FILENAME)
    }

    fn get_file(filename: &str) -> Result<String> {
        let file =
            Self::get(filename).ok_or_else(|| anyhow!("Asset '{}' not found", filename))?;

        let content = std::str::from_utf8(file.data.as_ref())
            .map_err(|e| anyhow!("Failed to decode asset '{}': {}", filename, e))?;

        Ok(content.to_string())
    }
}

/// `config.yml` 对应的结构
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub merge: MergeBehavior,

    #[serde(default)]
    pub exclude: ExcludePatterns,
}

/// 同步设置
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    /// 是否允许 `sync --auto`（发行版的 systemd unit）执行
    #[serde(default = "default_auto")]
    pub auto: bool,
}

fn default_version() -> u32 {
    1
}

fn default_auto() -> bool {
    true
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto: default_auto(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            sync: SyncSettings::default(),
            merge: MergeBehavior::default(),
            exclude: ExcludePatterns::default(),
        }
    }
}

impl Config {
    /// 从 YAML 文本解析
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| XfconfError::parse("config", e))?;
        Ok(config)
    }

    /// 从默认位置加载，不存在时先写入默认配置
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    /// 从指定路径加载，不存在时先写入默认配置
    pub fn load_from(path: &Path) -> Result<Self> {
        if !file_exists(path) {
            info!(path = %path.display(), "Config file not found, writing default config");
            let default = ConfigAssets::default_config()?;
            write_file(path, default.as_bytes())
                .context("failed to write default config")?;
        }

        let content = read_file(path).context("failed to read config")?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        debug!(
            version = config.version,
            merge = %config.merge,
            excludes = config.exclude.len(),
            auto = config.sync.auto,
            "Loaded config"
        );
        Ok(config)
    }
}
