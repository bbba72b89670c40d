//! # LabArm Protocol
//!
//! 机械臂控制器文本行协议定义（无 IO 依赖）
//!
//! ## 模块
//!
//! - `pose`: 笛卡尔位姿 / 关节位姿值类型
//! - `types`: 工位索引、运动参数索引、Z 向退让量、百分比参数
//! - `command`: 请求命令的编码与解析
//! - `reply`: 应答行解析（位姿、确认、抓取结果）
//!
//! ## 线格式
//!
//! 每条请求是一行文本：动词 + 空白分隔的参数，以换行结尾。
//! 控制器对每条请求恰好回复一行：`<status> [fields...]`，
//! `0` 表示成功，负数为控制器错误码。
//!
//! 协议没有请求 ID，请求与应答严格一问一答，关联完全依赖顺序。

pub mod command;
pub mod pose;
pub mod reply;
pub mod types;

// 重新导出常用类型
pub use command::{Command, ReplyKind};
pub use pose::{CARTESIAN_AXES, CartesianPose, DEFAULT_JOINT_COUNT, JointPose};
pub use reply::{ControllerFault, GraspOutcome, Reply, ReplyBody};
pub use types::{Clearance, Percent, ProfileIndex, StationIndex};

use thiserror::Error;

/// 输入校验错误
///
/// 在任何字节写到线上之前产生，属于调用方错误，不会自动重试。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid station index: {0} (stations start at 1)")]
    InvalidStation(i64),

    #[error("Station index {index} exceeds configured maximum {max}")]
    StationOutOfRange { index: u32, max: u32 },

    #[error("Invalid profile index: {0} (profiles start at 1)")]
    InvalidProfile(i64),

    #[error("Invalid pose length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Non-finite value for field {field}: {value}")]
    NonFinite { field: String, value: f64 },

    #[error("Percentage out of range for {field}: {value} (expected 0..=100)")]
    PercentOutOfRange { field: &'static str, value: u8 },

    #[error("Invalid file path {0:?}: must be non-empty and contain no whitespace")]
    InvalidPath(String),
}

/// 行解析错误
///
/// 始终保留触发错误的原始行，便于诊断。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed line {line:?}: {reason}")]
pub struct DecodeError {
    /// 原始行（不含行结束符）
    pub line: String,
    /// 失败原因
    pub reason: String,
}

impl DecodeError {
    pub fn new(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

/// 数值参数的线格式
///
/// 使用 `f64` 的 `Display`：与 locale 无关，且是最短的可往返表示
/// （`10.0` 编码为 `10`，`0.1` 编码为 `0.1`）。
pub fn format_number(value: f64) -> String {
    format!("{value}")
}

/// 解析数值 token，拒绝 `NaN` / 无穷大
pub fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}
