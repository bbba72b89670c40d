//! # 机器人连接配置
//!
//! TOML 格式，所有字段都有默认值：
//!
//! ```toml
//! host = "192.168.0.1"
//! port = 10100
//! connect_timeout_ms = 5000
//! reply_timeout_ms = 60000
//! drain_timeout_ms = 200
//! joint_count = 6
//! # max_stations = 20
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientConfig;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 机器人连接配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// 控制器地址
    pub host: String,
    /// 控制器端口（机器人 1 为 10100）
    pub port: u16,
    /// TCP 连接超时（毫秒）
    pub connect_timeout_ms: u64,
    /// 单条命令等待应答的超时（毫秒），运动命令在动作完成后才应答
    pub reply_timeout_ms: u64,
    /// 存活探测时等待迟到应答的时间（毫秒）
    pub drain_timeout_ms: u64,
    /// 关节数 N
    pub joint_count: usize,
    /// 工位索引上限（不设置则只检查 ≥ 1）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stations: Option<u32>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.1".to_string(),
            port: 10100,
            connect_timeout_ms: 5000,
            reply_timeout_ms: 60_000,
            drain_timeout_ms: 200,
            joint_count: 6,
            max_stations: None,
        }
    }
}

impl RobotConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RobotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 保存配置到文件（父目录必须已存在）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must not be 0".to_string()));
        }
        if self.joint_count == 0 {
            return Err(ConfigError::Invalid(
                "joint_count must be at least 1".to_string(),
            ));
        }
        if self.reply_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        if self.max_stations == Some(0) {
            return Err(ConfigError::Invalid(
                "max_stations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            reply_timeout: Duration::from_millis(self.reply_timeout_ms),
            drain_timeout: Duration::from_millis(self.drain_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RobotConfig::default();
        assert_eq!(config.host, "192.168.0.1");
        assert_eq!(config.port, 10100);
        assert_eq!(config.joint_count, 6);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.client_config().reply_timeout,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RobotConfig::from_toml_str(
            r#"
host = "10.0.0.5"
port = 10200
max_stations = 20
"#,
        )
        .unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 10200);
        assert_eq!(config.max_stations, Some(20));
        assert_eq!(config.drain_timeout_ms, 200);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            RobotConfig::from_toml_str("joint_count = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RobotConfig::from_toml_str("port = \"abc\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = RobotConfig {
            host: "127.0.0.1".to_string(),
            joint_count: 7,
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = RobotConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = RobotConfig::load_from_file("/nonexistent/labarm.toml").unwrap_err();
        assert!(format!("{}", err).contains("/nonexistent/labarm.toml"));
    }
}
