//! CLI 配置
//!
//! 配置文件默认位于 `<config_dir>/labarm/config.toml`，
//! 命令行的 `--host` / `--port` 覆盖文件中的值。

use anyhow::{Context, Result};
use labarm_sdk::RobotConfig;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("labarm");
    path.push("config.toml");
    Ok(path)
}

/// 连接相关的全局参数
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    pub config: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl ConnectionArgs {
    /// 实际使用的配置文件路径
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => default_config_path(),
        }
    }

    /// 加载配置并应用命令行覆盖
    ///
    /// 显式指定的 `--config` 文件必须存在；默认路径不存在时使用默认配置。
    pub fn resolve(&self) -> Result<RobotConfig> {
        let path = self.config_path()?;
        let mut config = load_or_default(&path, self.config.is_some())?;

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.validate().context("配置无效")?;
        Ok(config)
    }
}

fn load_or_default(path: &Path, required: bool) -> Result<RobotConfig> {
    if !required && !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(RobotConfig::default());
    }
    RobotConfig::load_from_file(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))
}
