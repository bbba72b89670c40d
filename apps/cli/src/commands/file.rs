//! 工位文件与位置文件命令

use super::{RobotCommand, print_report};
use anyhow::{Context, Result};
use clap::Args;
use labarm_sdk::Robot;
use labarm_sdk::control::load_positions;
use std::path::PathBuf;

/// 加载控制器上的工位文件（覆盖当前所有位置和运动参数）
#[derive(Args, Debug)]
pub struct LoadFileCommand {
    /// 控制器上的文件名
    pub path: String,
}

impl RobotCommand for LoadFileCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        println!("⏳ 加载工位文件 {}...", self.path);
        let report = robot.load_station_file(&self.path).await?;
        print_report(&report);
        Ok(())
    }
}

/// 保存工位数据到控制器上的文件
#[derive(Args, Debug)]
pub struct StoreFileCommand {
    /// 控制器上的文件名
    pub path: String,
}

impl RobotCommand for StoreFileCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        println!("⏳ 保存工位文件 {}...", self.path);
        let report = robot.store_station_file(&self.path).await?;
        print_report(&report);
        Ok(())
    }
}

/// 离线检查本地位置文件（CSV）
#[derive(Args, Debug)]
pub struct PositionsCommand {
    /// CSV 文件路径
    pub csv: PathBuf,

    /// 关节数（覆盖配置）
    #[arg(long)]
    pub joint_count: Option<usize>,
}

impl PositionsCommand {
    pub fn execute(&self, default_joint_count: usize) -> Result<()> {
        let joint_count = self.joint_count.unwrap_or(default_joint_count);
        let table = load_positions(&self.csv, joint_count)
            .with_context(|| format!("位置文件无效: {}", self.csv.display()))?;

        println!(
            "✅ {}: {} 个笛卡尔位姿, {} 个关节位姿",
            self.csv.display(),
            table.cartesian.len(),
            table.joints.len()
        );
        for (i, pose) in table.cartesian.iter().enumerate() {
            println!("  C{}: {:?}", i + 1, pose.to_array());
        }
        for (i, pose) in table.joints.iter().enumerate() {
            println!("  J{}: {:?}", i + 1, pose.as_slice());
        }
        Ok(())
    }
}
