//! 工作流状态机
//!
//! ```text
//! Idle → Validating → Executing ⇄ Teaching → Completed | CompletedWithWarning | Failed
//! ```
//!
//! 查询类操作跳过 `Validating`（`Idle → Executing`）。

use std::fmt;

/// 工作流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Idle,
    /// 参数校验，还没有任何线上流量
    Validating,
    /// 正在发送命令
    Executing,
    /// 正在示教（在抓取成功后 / 放置与释放之间）
    Teaching,
    Completed,
    /// 操作完成，但有需要上报的结果（例如没有检测到料板）
    CompletedWithWarning,
    Failed,
}

impl WorkflowState {
    /// 是否为终止状态
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            WorkflowState::Completed | WorkflowState::CompletedWithWarning | WorkflowState::Failed
        )
    }

    /// 状态转换是否合法
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Idle, Executing)
                | (Validating, Executing)
                | (Validating, Failed)
                | (Executing, Teaching)
                | (Executing, Completed)
                | (Executing, CompletedWithWarning)
                | (Executing, Failed)
                | (Teaching, Executing)
                | (Teaching, Completed)
                | (Teaching, Failed)
        )
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Validating => "validating",
            WorkflowState::Executing => "executing",
            WorkflowState::Teaching => "teaching",
            WorkflowState::Completed => "completed",
            WorkflowState::CompletedWithWarning => "completed with warning",
            WorkflowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 工作流操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    TeachPlatePos,
    PickTray,
    PlaceTray,
    GoToStation,
    MoveCart,
    MoveJoints,
    CurrentPoseCartesian,
    CurrentPoseJoints,
    GoalPoseCartesian,
    GoalPoseJoints,
    LoadStationFile,
    StoreStationFile,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::TeachPlatePos => "teach_plate_pos",
            Operation::PickTray => "pick_tray",
            Operation::PlaceTray => "place_tray",
            Operation::GoToStation => "go_to_station",
            Operation::MoveCart => "move_cart",
            Operation::MoveJoints => "move_joints",
            Operation::CurrentPoseCartesian => "current_pose_cartesian",
            Operation::CurrentPoseJoints => "current_pose_joints",
            Operation::GoalPoseCartesian => "goal_pose_cartesian",
            Operation::GoalPoseJoints => "goal_pose_joints",
            Operation::LoadStationFile => "load_station_file",
            Operation::StoreStationFile => "store_station_file",
        };
        f.write_str(name)
    }
}

/// 工作流中已在物理上执行（或计划执行）的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Taught,
    Moved,
    Queried,
    Picked,
    Placed,
    Released,
    FileLoaded,
    FileStored,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Taught => "taught",
            Step::Moved => "moved",
            Step::Queried => "queried",
            Step::Picked => "picked",
            Step::Placed => "placed",
            Step::Released => "released",
            Step::FileLoaded => "file loaded",
            Step::FileStored => "file stored",
        };
        f.write_str(name)
    }
}
