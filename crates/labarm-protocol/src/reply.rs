//! 应答行解析
//!
//! 应答格式：`<status> [fields...]`
//! - `status == 0`：成功，后面是负载字段
//! - `status < 0`：控制器报告的错误，其余文本（去掉 `*` 包裹）为错误信息
//! - 其他任何形式：[`DecodeError`]
//!
//! 所有解码失败都保留原始行，绝不会用默认值补齐缺失字段。

use thiserror::Error;

use crate::pose::{CARTESIAN_AXES, CartesianPose, JointPose};
use crate::{DecodeError, parse_number};

/// 控制器报告的错误（负状态码）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Controller error {code}: {message}")]
pub struct ControllerFault {
    pub code: i32,
    pub message: String,
}

/// 应答内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// 状态 0，携带负载字段（可能为空）
    Ok(Vec<String>),
    /// 负状态码
    Error { code: i32, message: String },
}

/// 抓取/放置结果（三态）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraspOutcome {
    /// 夹爪检测到料板
    Success,
    /// 命令执行完成，但夹爪没有检测到料板
    NoObjectDetected,
    /// 控制器拒绝执行或执行出错
    ProtocolError { code: i32, message: String },
}

impl GraspOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GraspOutcome::Success)
    }
}

/// 一行应答
///
/// 收到后立即被发出对应命令的调用方消费，不会被缓存。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    raw: String,
    body: ReplyBody,
}

impl Reply {
    /// 解析一行应答（行结束符会被去掉）
    pub fn parse(line: &str) -> Result<Self, DecodeError> {
        let raw = line.trim_end_matches(['\r', '\n']);
        let trimmed = raw.trim_start();
        let (status, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((status, rest)) => (status, rest),
            None => (trimmed, ""),
        };
        if status.is_empty() {
            return Err(DecodeError::new(raw, "empty reply"));
        }
        let code: i32 = status
            .parse()
            .map_err(|_| DecodeError::new(raw, format!("status is not an integer: {status:?}")))?;

        let body = match code {
            0 => ReplyBody::Ok(rest.split_whitespace().map(str::to_string).collect()),
            code if code < 0 => ReplyBody::Error {
                code,
                message: rest.trim().trim_matches('*').trim().to_string(),
            },
            code => {
                return Err(DecodeError::new(
                    raw,
                    format!("unexpected positive status {code}"),
                ));
            },
        };

        Ok(Self {
            raw: raw.to_string(),
            body,
        })
    }

    /// 原始行（不含行结束符）
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn body(&self) -> &ReplyBody {
        &self.body
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.body, ReplyBody::Ok(_))
    }

    /// 成功应答的负载字段；错误应答返回空切片
    pub fn fields(&self) -> &[String] {
        match &self.body {
            ReplyBody::Ok(fields) => fields,
            ReplyBody::Error { .. } => &[],
        }
    }

    /// 负状态码转换为 [`ControllerFault`]
    pub fn check(&self) -> Result<(), ControllerFault> {
        match &self.body {
            ReplyBody::Ok(_) => Ok(()),
            ReplyBody::Error { code, message } => Err(ControllerFault {
                code: *code,
                message: message.clone(),
            }),
        }
    }

    /// 解码笛卡尔位姿查询应答（恰好 6 个数值字段）
    ///
    /// 返回外层 `Err` 表示解码失败，内层 `Err` 表示控制器报告了错误。
    pub fn cartesian_pose(&self) -> Result<Result<CartesianPose, ControllerFault>, DecodeError> {
        if let Err(fault) = self.check() {
            return Ok(Err(fault));
        }
        let values = self.numeric_fields(CARTESIAN_AXES)?;
        CartesianPose::from_slice(&values)
            .map(Ok)
            .map_err(|e| DecodeError::new(&self.raw, e.to_string()))
    }

    /// 解码关节位姿查询应答（恰好 `joint_count` 个数值字段）
    pub fn joint_pose(
        &self,
        joint_count: usize,
    ) -> Result<Result<JointPose, ControllerFault>, DecodeError> {
        if let Err(fault) = self.check() {
            return Ok(Err(fault));
        }
        let values = self.numeric_fields(joint_count)?;
        JointPose::new(values)
            .map(Ok)
            .map_err(|e| DecodeError::new(&self.raw, e.to_string()))
    }

    /// 解码 `PickPlate` / `PlacePlate` 的应答
    ///
    /// | 应答 | 结果 |
    /// |------|------|
    /// | `0 -1` | `Success` |
    /// | `0` | `Success` |
    /// | `0 0` | `NoObjectDetected` |
    /// | `<负数> ...` | `ProtocolError` |
    ///
    /// **注意**：`-1` 表示检测到料板，这是控制器的约定。
    pub fn grasp_outcome(&self) -> Result<GraspOutcome, DecodeError> {
        match &self.body {
            ReplyBody::Error { code, message } => Ok(GraspOutcome::ProtocolError {
                code: *code,
                message: message.clone(),
            }),
            ReplyBody::Ok(fields) => match fields.as_slice() {
                [] => Ok(GraspOutcome::Success),
                [flag] => match flag.parse::<i32>() {
                    Ok(-1) => Ok(GraspOutcome::Success),
                    Ok(0) => Ok(GraspOutcome::NoObjectDetected),
                    _ => Err(DecodeError::new(
                        &self.raw,
                        format!("unexpected grasp flag {flag:?}"),
                    )),
                },
                _ => Err(DecodeError::new(
                    &self.raw,
                    format!("expected at most 1 grasp field, got {}", fields.len()),
                )),
            },
        }
    }

    fn numeric_fields(&self, expected: usize) -> Result<Vec<f64>, DecodeError> {
        let fields = self.fields();
        if fields.len() != expected {
            return Err(DecodeError::new(
                &self.raw,
                format!("expected {expected} fields, got {}", fields.len()),
            ));
        }
        fields
            .iter()
            .map(|token| {
                parse_number(token).ok_or_else(|| {
                    DecodeError::new(&self.raw, format!("non-numeric field {token:?}"))
                })
            })
            .collect()
    }
}
