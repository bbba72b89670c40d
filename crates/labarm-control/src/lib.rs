//! # LabArm Control
//!
//! 工作流引擎与位置文件
//!
//! ## 模块
//!
//! - `workflow`: [`Robot`]，抓取 / 放置 / 示教 / 运动 / 查询操作
//! - `state`: 工作流状态机（[`WorkflowState`]、[`Operation`]、[`Step`]）
//! - `error`: [`WorkflowError`]，标明部分完成的位置
//! - `cancel`: [`CancelToken`]，在下一条命令发送前取消
//! - `positions`: CSV 位置文件加载与保存
//!
//! # Example
//!
//! ```no_run
//! use labarm_client::RobotConfig;
//! use labarm_control::{PickRequest, PlaceRequest, Robot};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let robot = Robot::connect(&RobotConfig::default()).await?;
//!
//! robot
//!     .pick_tray(&PickRequest {
//!         station: 4,
//!         enable_compliance: true,
//!         percent_torque: 20,
//!         teach: false,
//!         clearance: 10.0,
//!     })
//!     .await?;
//! robot
//!     .place_tray(&PlaceRequest {
//!         station: 8,
//!         enable_compliance: true,
//!         percent_torque: 20,
//!         open_width: 20.0,
//!         percent_speed: 10,
//!         teach: true,
//!         clearance: 10.0,
//!     })
//!     .await?;
//! robot.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod error;
pub mod positions;
pub mod state;
pub mod workflow;

pub use cancel::CancelToken;
pub use error::{FailureCause, WorkflowError};
pub use positions::{
    PositionFileError, PositionTable, load_positions, parse_positions, store_positions,
    write_positions,
};
pub use state::{Operation, Step, WorkflowState};
pub use workflow::{PickRequest, PlaceRequest, Robot, WorkflowConfig, WorkflowReport};
