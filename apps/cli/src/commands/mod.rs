//! 命令定义和实现

pub mod config;
pub mod file;
pub mod motion;
pub mod plate;
pub mod simulate;

pub use config::ConfigCommand;
pub use file::{LoadFileCommand, PositionsCommand, StoreFileCommand};
pub use motion::{MoveCartCommand, MoveJointsCommand, StationCommand, WhereCommand};
pub use plate::{PickCommand, PlaceCommand, TeachCommand};
pub use simulate::SimulateCommand;

use anyhow::{Context, Result};
use labarm_sdk::{Robot, WorkflowReport};

/// 需要连接控制器的命令
pub trait RobotCommand {
    async fn execute(&self, robot: &Robot) -> Result<()>;
}

/// 解析逗号分隔的数值列表
pub fn parse_values(input: &str) -> Result<Vec<f64>> {
    let values = input
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("解析数值列表失败: {input}"))?;

    if values.is_empty() {
        anyhow::bail!("数值列表不能为空");
    }
    Ok(values)
}

/// 打印工作流结果
pub fn print_report(report: &WorkflowReport) {
    let steps = report
        .steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" -> ");

    if let Some(warning) = &report.warning {
        println!("⚠️  {}: {} ({})", report.operation, warning, steps);
    } else {
        println!("✅ {}: {}", report.operation, steps);
    }
}
