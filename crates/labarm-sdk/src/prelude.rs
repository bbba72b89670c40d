//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use labarm_sdk::prelude::*;
//! ```

// 控制层（推荐使用）
pub use crate::control::{
    CancelToken, PickRequest, PlaceRequest, Robot, WorkflowConfig, WorkflowReport, WorkflowState,
};

// 位姿与参数类型
pub use crate::protocol::{CartesianPose, GraspOutcome, JointPose};

// 客户端层
pub use crate::client::{ClientBuilder, RobotConfig};

// 错误类型
pub use crate::client::RobotError;
pub use crate::control::WorkflowError;
pub use crate::protocol::{DecodeError, ValidationError};
