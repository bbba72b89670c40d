//! 料板抓取 / 放置 / 示教命令

use super::{RobotCommand, print_report};
use anyhow::Result;
use clap::Args;
use labarm_sdk::{PickRequest, PlaceRequest, Robot};

/// 从工位抓取料板
#[derive(Args, Debug)]
pub struct PickCommand {
    /// 工位索引（从 1 开始）
    pub station: i64,

    /// 抓取时启用柔顺
    #[arg(long)]
    pub compliance: bool,

    /// 夹持力矩百分比
    #[arg(long, default_value_t = 20)]
    pub torque: u8,

    /// 抓取成功后示教当前工位
    #[arg(long)]
    pub teach: bool,

    /// 示教退让量（mm），<= 0 表示沿用已有值
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub clearance: f64,
}

impl PickCommand {
    pub fn request(&self) -> PickRequest {
        PickRequest {
            station: self.station,
            enable_compliance: self.compliance,
            percent_torque: self.torque,
            teach: self.teach,
            clearance: self.clearance,
        }
    }
}

impl RobotCommand for PickCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        println!("⏳ 从工位 {} 抓取...", self.station);
        let report = robot.pick_tray(&self.request()).await?;
        print_report(&report);
        Ok(())
    }
}

/// 把料板放到工位
#[derive(Args, Debug)]
pub struct PlaceCommand {
    /// 工位索引（从 1 开始）
    pub station: i64,

    /// 放置时启用柔顺
    #[arg(long)]
    pub compliance: bool,

    /// 夹持力矩百分比
    #[arg(long, default_value_t = 20)]
    pub torque: u8,

    /// 释放时夹爪张开宽度（mm）
    #[arg(long, default_value_t = 20.0)]
    pub width: f64,

    /// 释放时夹爪速度百分比
    #[arg(long, default_value_t = 10)]
    pub speed: u8,

    /// 放置成功后示教当前工位
    #[arg(long)]
    pub teach: bool,

    /// 示教退让量（mm），<= 0 表示沿用已有值
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub clearance: f64,
}

impl PlaceCommand {
    pub fn request(&self) -> PlaceRequest {
        PlaceRequest {
            station: self.station,
            enable_compliance: self.compliance,
            percent_torque: self.torque,
            open_width: self.width,
            percent_speed: self.speed,
            teach: self.teach,
            clearance: self.clearance,
        }
    }
}

impl RobotCommand for PlaceCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        println!("⏳ 放置到工位 {}...", self.station);
        let report = robot.place_tray(&self.request()).await?;
        print_report(&report);
        Ok(())
    }
}

/// 示教工位：把当前位置记录为工位位置
#[derive(Args, Debug)]
pub struct TeachCommand {
    /// 工位索引（从 1 开始）
    pub station: i64,

    /// 退让量（mm），<= 0 表示沿用已有值
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub clearance: f64,
}

impl RobotCommand for TeachCommand {
    async fn execute(&self, robot: &Robot) -> Result<()> {
        println!("⏳ 示教工位 {}...", self.station);
        let report = robot.teach_plate_pos(self.station, self.clearance).await?;
        print_report(&report);
        Ok(())
    }
}
