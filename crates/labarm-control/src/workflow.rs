//! 工作流引擎
//!
//! 把协议客户端的单条命令组合成多步操作（抓取、放置、示教），
//! 负责参数校验、前置条件、三态抓取结果的解释和部分失败的上报。
//!
//! # 步骤顺序
//!
//! | 操作 | 线上命令 |
//! |------|----------|
//! | `pick_tray` | `PickPlate` → (`TeachPlate`，仅在抓取成功且 `teach` 时) |
//! | `place_tray` | `PlacePlate` → (`TeachPlate`，仅在 `teach` 时) → `ReleasePlate` |
//!
//! 任一步骤失败都会中止剩余步骤，[`WorkflowError`] 会标明部分完成的位置。

use labarm_client::{
    ClientBuilder, LineTransport, ProtocolClient, RobotConfig, RobotError, TcpTransport,
};
use labarm_protocol::{
    CartesianPose, Clearance, Command, DEFAULT_JOINT_COUNT, GraspOutcome, JointPose, Percent,
    ProfileIndex, StationIndex, ValidationError,
};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::{FailureCause, WorkflowError};
use crate::state::{Operation, Step, WorkflowState};

/// 工作流配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// 关节数 N
    pub joint_count: usize,
    /// 工位索引上限（`None` 表示只检查 ≥ 1）
    pub max_stations: Option<u32>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            joint_count: DEFAULT_JOINT_COUNT,
            max_stations: None,
        }
    }
}

impl From<&RobotConfig> for WorkflowConfig {
    fn from(config: &RobotConfig) -> Self {
        Self {
            joint_count: config.joint_count,
            max_stations: config.max_stations,
        }
    }
}

/// 抓取参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRequest {
    /// 料板所在工位（从 1 开始）
    pub station: i64,
    /// 抓取时启用水平柔顺
    pub enable_compliance: bool,
    /// 水平力矩百分比
    pub percent_torque: u8,
    /// 抓取成功后示教该工位位置
    pub teach: bool,
    /// 示教用的 Z 向退让量，`<= 0` 表示沿用已存储的值
    pub clearance: f64,
}

/// 放置参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceRequest {
    /// 目标工位（从 1 开始）
    pub station: i64,
    pub enable_compliance: bool,
    pub percent_torque: u8,
    /// 释放时夹爪张开的宽度（mm）
    pub open_width: f64,
    /// 夹爪张开速度百分比
    pub percent_speed: u8,
    /// 放置后、释放前示教该工位位置
    pub teach: bool,
    pub clearance: f64,
}

/// 成功完成的工作流报告
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowReport {
    pub operation: Operation,
    /// `Completed` 或 `CompletedWithWarning`
    pub state: WorkflowState,
    /// 已执行的步骤（按执行顺序）
    pub steps: Vec<Step>,
    /// 抓取/放置的三态结果
    pub grasp: Option<GraspOutcome>,
    pub warning: Option<String>,
}

impl WorkflowReport {
    pub fn has_warning(&self) -> bool {
        self.state == WorkflowState::CompletedWithWarning
    }
}

/// 单个机器人
///
/// 独占一个协议会话。所有操作都只需要 `&self`，
/// 多个机器人可以在同一个任务里通过 `tokio::join!` 并发驱动。
pub struct Robot<T: LineTransport = TcpTransport> {
    client: ProtocolClient<T>,
    config: WorkflowConfig,
    cancel: CancelToken,
}

impl Robot<TcpTransport> {
    /// 按配置建立 TCP 会话
    pub async fn connect(config: &RobotConfig) -> Result<Self, RobotError> {
        let client = ClientBuilder::from_config(config).connect().await?;
        Ok(Self::new(client, WorkflowConfig::from(config)))
    }
}

impl<T: LineTransport> Robot<T> {
    pub fn new(client: ProtocolClient<T>, config: WorkflowConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// 使用外部的取消令牌
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn client(&self) -> &ProtocolClient<T> {
        &self.client
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    // ===== 示教 =====

    /// 示教工位位置
    ///
    /// `clearance <= 0` 时发送 `TeachPlate <station>`（沿用已存储的退让量），
    /// 否则发送 `TeachPlate <station> <clearance>`。
    pub async fn teach_plate_pos(
        &self,
        station: i64,
        clearance: f64,
    ) -> Result<WorkflowReport, WorkflowError> {
        let mut run = Run::new(Operation::TeachPlatePos, vec![Step::Taught], &self.cancel);

        run.enter(WorkflowState::Validating);
        let station = self.station(station).map_err(|e| run.fail(e))?;
        let clearance = Clearance::from_raw(clearance).map_err(|e| run.fail(e))?;

        run.enter(WorkflowState::Executing);
        self.ack(&mut run, Command::TeachPlate { station, clearance }, Step::Taught)
            .await
            .map_err(|c| run.fail(c))?;

        Ok(run.complete())
    }

    // ===== 抓取 / 放置 =====

    /// 从工位抓取料板
    ///
    /// - 抓取成功：`teach` 为真时进入 Teaching 示教该工位，然后 Completed
    /// - 没有检测到料板：CompletedWithWarning，不示教
    /// - 控制器拒绝：Failed
    pub async fn pick_tray(&self, request: &PickRequest) -> Result<WorkflowReport, WorkflowError> {
        let mut plan = vec![Step::Picked];
        if request.teach {
            plan.push(Step::Taught);
        }
        let mut run = Run::new(Operation::PickTray, plan, &self.cancel);

        run.enter(WorkflowState::Validating);
        let station = self.station(request.station).map_err(|e| run.fail(e))?;
        let torque =
            Percent::new("percent_torque", request.percent_torque).map_err(|e| run.fail(e))?;
        let clearance = Clearance::from_raw(request.clearance).map_err(|e| run.fail(e))?;

        run.enter(WorkflowState::Executing);
        let pick = Command::PickPlate {
            station,
            compliance: request.enable_compliance,
            torque,
        };
        let outcome = self
            .grasp(&mut run, pick, Step::Picked)
            .await
            .map_err(|c| run.fail(c))?;

        match outcome {
            GraspOutcome::Success => {
                if request.teach {
                    run.enter(WorkflowState::Teaching);
                    self.ack(&mut run, Command::TeachPlate { station, clearance }, Step::Taught)
                        .await
                        .map_err(|c| run.fail(c))?;
                }
            },
            GraspOutcome::NoObjectDetected => {
                run.warn(format!("No plate detected at station {station}"));
            },
            GraspOutcome::ProtocolError { code, message } => {
                return Err(run.fail(FailureCause::GraspRejected {
                    verb: "PickPlate",
                    code,
                    message,
                }));
            },
        }

        Ok(run.complete())
    }

    /// 放置料板到工位
    ///
    /// `PlacePlate` 结束时夹爪仍然闭合，所以总是以 `ReleasePlate` 结束。
    /// `teach` 为真时在放置之后、释放之前示教（夹爪张开前捕获放置位置）。
    /// 没有检测到料板时照常示教并释放，结果为 CompletedWithWarning。
    pub async fn place_tray(&self, request: &PlaceRequest) -> Result<WorkflowReport, WorkflowError> {
        let mut plan = vec![Step::Placed];
        if request.teach {
            plan.push(Step::Taught);
        }
        plan.push(Step::Released);
        let mut run = Run::new(Operation::PlaceTray, plan, &self.cancel);

        run.enter(WorkflowState::Validating);
        let station = self.station(request.station).map_err(|e| run.fail(e))?;
        let torque =
            Percent::new("percent_torque", request.percent_torque).map_err(|e| run.fail(e))?;
        let speed =
            Percent::new("percent_speed", request.percent_speed).map_err(|e| run.fail(e))?;
        let clearance = Clearance::from_raw(request.clearance).map_err(|e| run.fail(e))?;
        if !request.open_width.is_finite() {
            return Err(run.fail(ValidationError::NonFinite {
                field: "open_width".to_string(),
                value: request.open_width,
            }));
        }

        run.enter(WorkflowState::Executing);
        let place = Command::PlacePlate {
            station,
            compliance: request.enable_compliance,
            torque,
        };
        let outcome = self
            .grasp(&mut run, place, Step::Placed)
            .await
            .map_err(|c| run.fail(c))?;

        match outcome {
            GraspOutcome::Success => {},
            GraspOutcome::NoObjectDetected => {
                // 控制器已经到达放置位置，仍然示教并释放
                run.done(Step::Placed);
                run.warn(format!("No plate detected while placing at station {station}"));
            },
            GraspOutcome::ProtocolError { code, message } => {
                return Err(run.fail(FailureCause::GraspRejected {
                    verb: "PlacePlate",
                    code,
                    message,
                }));
            },
        }

        if request.teach {
            run.enter(WorkflowState::Teaching);
            self.ack(&mut run, Command::TeachPlate { station, clearance }, Step::Taught)
                .await
                .map_err(|c| run.fail(c))?;
            run.enter(WorkflowState::Executing);
        }

        let release = Command::ReleasePlate {
            width: request.open_width,
            speed,
        };
        self.ack(&mut run, release, Step::Released)
            .await
            .map_err(|c| run.fail(c))?;

        Ok(run.complete())
    }

    // ===== 运动 =====

    /// 移动到工位
    pub async fn go_to_station(
        &self,
        station: i64,
        profile: i64,
    ) -> Result<WorkflowReport, WorkflowError> {
        let mut run = Run::new(Operation::GoToStation, vec![Step::Moved], &self.cancel);

        run.enter(WorkflowState::Validating);
        let station = self.station(station).map_err(|e| run.fail(e))?;
        let profile = ProfileIndex::new(profile).map_err(|e| run.fail(e))?;

        run.enter(WorkflowState::Executing);
        self.ack(&mut run, Command::Move { station, profile }, Step::Moved)
            .await
            .map_err(|c| run.fail(c))?;

        Ok(run.complete())
    }

    /// 移动到笛卡尔位姿
    pub async fn move_cart(
        &self,
        profile: i64,
        pose: CartesianPose,
    ) -> Result<WorkflowReport, WorkflowError> {
        let mut run = Run::new(Operation::MoveCart, vec![Step::Moved], &self.cancel);

        run.enter(WorkflowState::Validating);
        let profile = ProfileIndex::new(profile).map_err(|e| run.fail(e))?;

        run.enter(WorkflowState::Executing);
        self.ack(&mut run, Command::MoveC { profile, pose }, Step::Moved)
            .await
            .map_err(|c| run.fail(c))?;

        Ok(run.complete())
    }

    /// 移动到关节位姿（关节数必须与配置一致）
    pub async fn move_joints(
        &self,
        profile: i64,
        pose: JointPose,
    ) -> Result<WorkflowReport, WorkflowError> {
        let mut run = Run::new(Operation::MoveJoints, vec![Step::Moved], &self.cancel);

        run.enter(WorkflowState::Validating);
        let profile = ProfileIndex::new(profile).map_err(|e| run.fail(e))?;
        pose.check_count(self.config.joint_count)
            .map_err(|e| run.fail(e))?;

        run.enter(WorkflowState::Executing);
        self.ack(&mut run, Command::MoveJ { profile, pose }, Step::Moved)
            .await
            .map_err(|c| run.fail(c))?;

        Ok(run.complete())
    }

    // ===== 查询 =====

    /// 当前笛卡尔位姿（`wherec`）
    pub async fn current_pose_cartesian(&self) -> Result<CartesianPose, WorkflowError> {
        self.query_cartesian(Operation::CurrentPoseCartesian, Command::WhereC)
            .await
    }

    /// 当前关节角度（`wherej`）
    pub async fn current_pose_joints(&self) -> Result<JointPose, WorkflowError> {
        self.query_joints(Operation::CurrentPoseJoints, Command::WhereJ)
            .await
    }

    /// 目标笛卡尔位姿（`DestC`），静止时等于当前位姿
    pub async fn goal_pose_cartesian(&self) -> Result<CartesianPose, WorkflowError> {
        self.query_cartesian(Operation::GoalPoseCartesian, Command::DestC)
            .await
    }

    /// 目标关节角度（`DestJ`），静止时等于当前角度
    pub async fn goal_pose_joints(&self) -> Result<JointPose, WorkflowError> {
        self.query_joints(Operation::GoalPoseJoints, Command::DestJ)
            .await
    }

    // ===== 工位文件 =====

    /// 加载控制器上的工位文件（`LoadFile`）
    ///
    /// **注意**：会覆盖控制器上当前所有位置和运动参数。
    pub async fn load_station_file(&self, path: &str) -> Result<WorkflowReport, WorkflowError> {
        let mut run = Run::new(Operation::LoadStationFile, vec![Step::FileLoaded], &self.cancel);

        run.enter(WorkflowState::Validating);
        let command = Command::load_file(path).map_err(|e| run.fail(e))?;

        run.enter(WorkflowState::Executing);
        self.ack(&mut run, command, Step::FileLoaded)
            .await
            .map_err(|c| run.fail(c))?;

        Ok(run.complete())
    }

    /// 把当前工位数据保存到控制器上的文件（`StoreFile`）
    pub async fn store_station_file(&self, path: &str) -> Result<WorkflowReport, WorkflowError> {
        let mut run = Run::new(Operation::StoreStationFile, vec![Step::FileStored], &self.cancel);

        run.enter(WorkflowState::Validating);
        let command = Command::store_file(path).map_err(|e| run.fail(e))?;

        run.enter(WorkflowState::Executing);
        self.ack(&mut run, command, Step::FileStored)
            .await
            .map_err(|c| run.fail(c))?;

        Ok(run.complete())
    }

    /// 关闭会话
    pub async fn close(&self) -> Result<(), RobotError> {
        self.client.close().await
    }

    // ===== 内部实现 =====

    fn station(&self, index: i64) -> Result<StationIndex, ValidationError> {
        StationIndex::new(index)?.check_max(self.config.max_stations)
    }

    async fn ack(&self, run: &mut Run<'_>, command: Command, step: Step) -> Result<(), FailureCause> {
        run.check_cancel(&command)?;
        self.client.request_ack(&command).await?;
        run.done(step);
        Ok(())
    }

    async fn grasp(
        &self,
        run: &mut Run<'_>,
        command: Command,
        step: Step,
    ) -> Result<GraspOutcome, FailureCause> {
        run.check_cancel(&command)?;
        let outcome = self.client.request_grasp(&command).await?;
        debug!("{} outcome: {:?}", command.verb(), outcome);
        run.grasp = Some(outcome.clone());
        if outcome.is_success() {
            run.done(step);
        }
        Ok(outcome)
    }

    async fn query_cartesian(
        &self,
        operation: Operation,
        command: Command,
    ) -> Result<CartesianPose, WorkflowError> {
        let mut run = Run::new(operation, vec![Step::Queried], &self.cancel);
        run.enter(WorkflowState::Executing);
        run.check_cancel(&command).map_err(|c| run.fail(c))?;
        let pose = self
            .client
            .request_cartesian(&command)
            .await
            .map_err(|e| run.fail(e))?;
        run.done(Step::Queried);
        run.complete();
        Ok(pose)
    }

    async fn query_joints(
        &self,
        operation: Operation,
        command: Command,
    ) -> Result<JointPose, WorkflowError> {
        let mut run = Run::new(operation, vec![Step::Queried], &self.cancel);
        run.enter(WorkflowState::Executing);
        run.check_cancel(&command).map_err(|c| run.fail(c))?;
        let pose = self
            .client
            .request_joints(&command, self.config.joint_count)
            .await
            .map_err(|e| run.fail(e))?;
        run.done(Step::Queried);
        run.complete();
        Ok(pose)
    }
}

/// 单次工作流调用的状态（不在调用之间共享）
struct Run<'a> {
    operation: Operation,
    state: WorkflowState,
    plan: Vec<Step>,
    completed: Vec<Step>,
    grasp: Option<GraspOutcome>,
    warning: Option<String>,
    cancel: &'a CancelToken,
}

impl<'a> Run<'a> {
    fn new(operation: Operation, plan: Vec<Step>, cancel: &'a CancelToken) -> Self {
        Self {
            operation,
            state: WorkflowState::Idle,
            plan,
            completed: Vec::new(),
            grasp: None,
            warning: None,
            cancel,
        }
    }

    fn enter(&mut self, next: WorkflowState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!("{}: {} -> {}", self.operation, self.state, next);
        self.state = next;
    }

    fn check_cancel(&self, command: &Command) -> Result<(), FailureCause> {
        if self.cancel.is_cancelled() {
            return Err(FailureCause::Cancelled {
                verb: command.verb(),
            });
        }
        Ok(())
    }

    fn done(&mut self, step: Step) {
        self.completed.push(step);
    }

    fn warn(&mut self, warning: String) {
        warn!("{}: {}", self.operation, warning);
        self.warning = Some(warning);
    }

    fn pending(&self) -> Vec<Step> {
        self.plan
            .iter()
            .filter(|step| !self.completed.contains(step))
            .copied()
            .collect()
    }

    fn fail(&mut self, cause: impl Into<FailureCause>) -> WorkflowError {
        let cause = cause.into();
        let failed_in = self.state;
        let pending = self.pending();
        self.enter(WorkflowState::Failed);

        let error = WorkflowError {
            operation: self.operation,
            failed_in,
            completed: std::mem::take(&mut self.completed),
            pending,
            cause,
        };
        warn!("{}", error);
        error
    }

    fn complete(&mut self) -> WorkflowReport {
        let terminal = if self.warning.is_some() {
            WorkflowState::CompletedWithWarning
        } else {
            WorkflowState::Completed
        };
        self.enter(terminal);
        info!("{} {}", self.operation, terminal);

        WorkflowReport {
            operation: self.operation,
            state: terminal,
            steps: std::mem::take(&mut self.completed),
            grasp: self.grasp.take(),
            warning: self.warning.take(),
        }
    }
}
