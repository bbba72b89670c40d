//! 配置管理命令

use crate::settings::ConnectionArgs;
use anyhow::{Context, Result};
use clap::Subcommand;
use labarm_sdk::RobotConfig;
use std::fs;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（文件 + 命令行覆盖）
    Show,

    /// 打印配置文件路径
    Path,

    /// 写入默认配置文件
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn execute(&self, args: &ConnectionArgs) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = args.resolve()?;
                print!("{}", config.to_toml_string()?);
                Ok(())
            },

            ConfigCommand::Path => {
                println!("{}", args.config_path()?.display());
                Ok(())
            },

            ConfigCommand::Init { force } => Self::init(args, *force),
        }
    }

    fn init(args: &ConnectionArgs, force: bool) -> Result<()> {
        let path = args.config_path()?;
        if path.exists() && !force {
            anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        let mut config = RobotConfig::default();
        if let Some(host) = &args.host {
            config.host = host.clone();
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        config.validate()?;
        config.save_to_file(&path)?;

        println!("✅ 已写入配置: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let args = ConnectionArgs {
            config: Some(path.clone()),
            host: Some("10.1.1.1".to_string()),
            port: None,
        };

        ConfigCommand::Init { force: false }.execute(&args).unwrap();
        let loaded = RobotConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.host, "10.1.1.1");

        // 已存在时不覆盖
        assert!(ConfigCommand::Init { force: false }.execute(&args).is_err());
        assert!(ConfigCommand::Init { force: true }.execute(&args).is_ok());
    }
}
