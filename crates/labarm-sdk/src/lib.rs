//! LabArm SDK - 文本行协议机械臂控制 SDK
//!
//! 通过持久 TCP 会话向机械臂控制器发送运动和夹爪命令，
//! 解析应答（位姿、抓取结果），驱动多步抓取/放置工作流。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 位姿类型、命令编码、应答解析（无 IO）
//! - **客户端层** (`client`): 传输会话、一问一答的协议客户端
//! - **控制层** (`control`): 工作流状态机、位置文件
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use labarm_sdk::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! labarm_sdk::init_logger();
//!
//! let robot = Robot::connect(&RobotConfig::default()).await?;
//! let pose = robot.current_pose_cartesian().await?;
//! println!("x = {}, y = {}, z = {}", pose.x(), pose.y(), pose.z());
//! # Ok(())
//! # }
//! ```

pub use labarm_client as client;
pub use labarm_control as control;
pub use labarm_protocol as protocol;

// Prelude 模块
pub mod prelude;

// 协议层常用类型
pub use protocol::{CartesianPose, Command, DecodeError, GraspOutcome, JointPose, ValidationError};

// 客户端层
pub use client::{ClientBuilder, ProtocolClient, RobotConfig, RobotError, TcpTransport};

// 控制层（推荐入口）
pub use control::{
    CancelToken, PickRequest, PlaceRequest, PositionTable, Robot, WorkflowError, WorkflowReport,
    WorkflowState,
};

use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 安装 `tracing-subscriber` 的 fmt subscriber，过滤规则取自 `RUST_LOG`（默认 `info`），
/// 并把 `log` crate 的记录桥接到 `tracing`。重复调用是安全的，只有第一次生效。
pub fn init_logger() {
    init_logger_with_default("info");
}

/// 同 [`init_logger`]，`RUST_LOG` 未设置或无效时使用 `default_filter`
///
/// 返回本次调用是否安装了全局 subscriber。
pub fn init_logger_with_default(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }
    let _ = tracing_log::LogTracer::init();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_installs_at_most_once() {
        init_logger();
        // 全局 subscriber 已经存在，之后的调用不再生效
        assert!(!init_logger_with_default("debug"));
        tracing::info!("logger ready");
    }
}
