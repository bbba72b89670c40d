//! 工作流错误类型定义

use std::error::Error as StdError;
use std::fmt;

use labarm_client::RobotError;
use labarm_protocol::ValidationError;
use thiserror::Error;

use crate::state::{Operation, Step, WorkflowState};

/// 工作流失败的直接原因
#[derive(Error, Debug)]
pub enum FailureCause {
    /// 单条命令失败（校验、超时、断开、解码、控制器错误）
    #[error(transparent)]
    Robot(#[from] RobotError),

    /// 控制器拒绝了抓取/放置命令
    #[error("{verb} rejected by controller ({code}): {message}")]
    GraspRejected {
        verb: &'static str,
        code: i32,
        message: String,
    },

    /// 在发送 `verb` 之前被取消
    #[error("Cancelled before sending {verb}")]
    Cancelled { verb: &'static str },
}

impl From<ValidationError> for FailureCause {
    fn from(err: ValidationError) -> Self {
        FailureCause::Robot(RobotError::Validation(err))
    }
}

impl FailureCause {
    /// 会话层故障：重试之前必须先确认会话存活
    pub fn is_session_fault(&self) -> bool {
        matches!(self, FailureCause::Robot(e) if e.is_session_fault())
    }
}

/// 工作流错误
///
/// 标明在哪个状态失败、哪些步骤已经在物理上执行、哪些没有执行，
/// 以便操作员从正确的位置手动恢复（例如不要对已经夹住的料板再次 `PickPlate`）。
#[derive(Debug)]
pub struct WorkflowError {
    pub operation: Operation,
    /// 失败时所处的状态
    pub failed_in: WorkflowState,
    /// 已完成的步骤（按执行顺序）
    pub completed: Vec<Step>,
    /// 未执行的步骤（按计划顺序）
    pub pending: Vec<Step>,
    pub cause: FailureCause,
}

impl WorkflowError {
    /// 最后一个成功的步骤
    pub fn last_completed(&self) -> Option<Step> {
        self.completed.last().copied()
    }

    /// 部分完成的位置，例如 "placed but not taught"
    ///
    /// 没有任何步骤完成时返回 `None`。
    pub fn partial_completion(&self) -> Option<String> {
        let last = self.last_completed()?;
        Some(match self.pending.first() {
            Some(next) => format!("{last} but not {next}"),
            None => last.to_string(),
        })
    }

    /// 输入校验失败（没有任何线上流量）
    pub fn is_validation(&self) -> bool {
        matches!(self.cause, FailureCause::Robot(RobotError::Validation(_)))
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed while {}: {}",
            self.operation, self.failed_in, self.cause
        )?;
        if let Some(partial) = self.partial_completion() {
            write!(f, " ({partial})")?;
        }
        Ok(())
    }
}

impl StdError for WorkflowError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.cause)
    }
}
