//! 命令参数类型
//!
//! 把协议参数的约束编码进类型：工位/运动参数索引从 1 开始，
//! Z 向退让量用 `Option<Clearance>` 表达"沿用已存储值"，百分比限制在 0..=100。

use std::fmt;
use std::num::NonZeroU32;

use crate::{ValidationError, format_number};

/// 工位索引（从 1 开始）
///
/// 标识控制器上存储的一个物理位置/工位配置槽位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationIndex(NonZeroU32);

impl StationIndex {
    /// 从原始整数创建，`< 1` 返回 `ValidationError::InvalidStation`
    pub fn new(index: i64) -> Result<Self, ValidationError> {
        u32::try_from(index)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ValidationError::InvalidStation(index))
    }

    /// 检查是否超出配置的最大工位数（`None` 表示不限制）
    pub fn check_max(self, max: Option<u32>) -> Result<Self, ValidationError> {
        match max {
            Some(max) if self.get() > max => Err(ValidationError::StationOutOfRange {
                index: self.get(),
                max,
            }),
            _ => Ok(self),
        }
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for StationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 运动参数索引（速度/加速度/减速度配置，从 1 开始）
///
/// 客户端不检查上限，由控制器校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileIndex(NonZeroU32);

impl ProfileIndex {
    pub fn new(index: i64) -> Result<Self, ValidationError> {
        u32::try_from(index)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(ValidationError::InvalidProfile(index))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ProfileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Z 向退让量（严格为正）
///
/// 必须足够大，保证夹爪能从工位中退出。
/// "不覆盖退让量"不是一个数值，而是 `Option<Clearance>` 的 `None`。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Clearance(f64);

impl Clearance {
    /// 从调用方的原始数值转换
    ///
    /// - `<= 0`：哨兵值，返回 `Ok(None)`（沿用控制器已存储的退让量）
    /// - `> 0`：返回 `Ok(Some(..))`
    /// - `NaN` / 无穷大：`ValidationError::NonFinite`
    pub fn from_raw(value: f64) -> Result<Option<Self>, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "clearance".to_string(),
                value,
            });
        }
        Ok((value > 0.0).then_some(Self(value)))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Clearance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_number(self.0))
    }
}

/// 百分比参数（0..=100），用于力矩和夹爪速度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percent(u8);

impl Percent {
    pub fn new(field: &'static str, value: u8) -> Result<Self, ValidationError> {
        if value > 100 {
            return Err(ValidationError::PercentOutOfRange { field, value });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
