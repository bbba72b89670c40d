//! 客户端错误类型定义

use std::io;
use std::time::Duration;

use labarm_protocol::{ControllerFault, DecodeError, ValidationError};
use thiserror::Error;

/// 单条命令的错误
#[derive(Error, Debug)]
pub enum RobotError {
    /// 输入校验失败（未发送任何字节）
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 应答无法解码
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// 会话上已有未完成的请求
    #[error("Session busy: another command is still awaiting its reply")]
    Busy,

    /// 等待应答超时（会话被标记为 degraded）
    #[error("Timed out after {timeout:?} waiting for reply to {verb}")]
    Timeout {
        verb: &'static str,
        timeout: Duration,
    },

    /// 连接已断开（不会自动重连）
    #[error("Disconnected from controller")]
    Disconnected,

    /// 存活探测后仍有多余的应答行，请求/应答无法重新对齐
    #[error("Reply stream still misaligned after {attempts} liveness checks")]
    Misaligned { attempts: usize },

    /// 控制器返回负状态码
    #[error("{0}")]
    Controller(#[from] ControllerFault),

    /// 其他 IO 错误
    #[error("IO error: {0}")]
    Io(#[source] io::Error),
}

impl RobotError {
    /// 调用方自身的错误（校验失败、重入），同步返回且不应重试
    pub fn is_local(&self) -> bool {
        matches!(self, RobotError::Validation(_) | RobotError::Busy)
    }

    /// 会话层错误（超时、断开），重试前必须先确认会话存活
    pub fn is_session_fault(&self) -> bool {
        matches!(
            self,
            RobotError::Timeout { .. }
                | RobotError::Disconnected
                | RobotError::Misaligned { .. }
                | RobotError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robot_error_display() {
        let err = RobotError::Busy;
        assert!(format!("{}", err).contains("busy"));

        let err = RobotError::Timeout {
            verb: "MoveC",
            timeout: Duration::from_secs(2),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("MoveC") && msg.contains("2s"), "{}", msg);

        let err = RobotError::Controller(ControllerFault {
            code: -1012,
            message: "Joint out-of-range".to_string(),
        });
        let msg = format!("{}", err);
        assert!(msg.contains("-1012") && msg.contains("Joint out-of-range"));
    }

    #[test]
    fn test_from_validation_error() {
        let err: RobotError = ValidationError::InvalidStation(0).into();
        assert!(matches!(
            err,
            RobotError::Validation(ValidationError::InvalidStation(0))
        ));
        assert!(err.is_local());
        assert!(!err.is_session_fault());
    }

    #[test]
    fn test_error_classes() {
        assert!(RobotError::Busy.is_local());
        assert!(RobotError::Disconnected.is_session_fault());
        assert!(RobotError::Misaligned { attempts: 3 }.is_session_fault());
        assert!(!RobotError::Decode(DecodeError::new("x", "bad")).is_local());
    }
}
