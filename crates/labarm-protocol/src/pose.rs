//! 位姿值类型
//!
//! - [`CartesianPose`]：末端位置 + 姿态，固定 6 个分量 {x, y, z, yaw, pitch, roll}
//! - [`JointPose`]：N 个关节角度，N 由机器人配置决定（默认 6）
//!
//! 两者都是不可变值：构造时校验，之后只读。

use crate::ValidationError;

/// 笛卡尔位姿分量个数
pub const CARTESIAN_AXES: usize = 6;

/// 默认关节数（6 轴机械臂）
pub const DEFAULT_JOINT_COUNT: usize = 6;

const AXIS_NAMES: [&str; CARTESIAN_AXES] = ["x", "y", "z", "yaw", "pitch", "roll"];

/// 笛卡尔位姿
///
/// 位置单位为 mm，姿态单位为度，由控制器解释。
/// 不变量：恰好 6 个有限值。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "[f64; 6]", into = "[f64; 6]")
)]
pub struct CartesianPose {
    x: f64,
    y: f64,
    z: f64,
    yaw: f64,
    pitch: f64,
    roll: f64,
}

impl CartesianPose {
    pub fn new(
        x: f64,
        y: f64,
        z: f64,
        yaw: f64,
        pitch: f64,
        roll: f64,
    ) -> Result<Self, ValidationError> {
        Self::from_array([x, y, z, yaw, pitch, roll])
    }

    /// 从 `[x, y, z, yaw, pitch, roll]` 创建
    pub fn from_array(values: [f64; CARTESIAN_AXES]) -> Result<Self, ValidationError> {
        for (name, value) in AXIS_NAMES.iter().zip(values) {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite {
                    field: (*name).to_string(),
                    value,
                });
            }
        }
        let [x, y, z, yaw, pitch, roll] = values;
        Ok(Self {
            x,
            y,
            z,
            yaw,
            pitch,
            roll,
        })
    }

    /// 从切片创建，长度必须为 6
    pub fn from_slice(values: &[f64]) -> Result<Self, ValidationError> {
        let array: [f64; CARTESIAN_AXES] =
            values.try_into().map_err(|_| ValidationError::InvalidLength {
                expected: CARTESIAN_AXES,
                actual: values.len(),
            })?;
        Self::from_array(array)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn roll(&self) -> f64 {
        self.roll
    }

    /// 按线格式顺序返回 `[x, y, z, yaw, pitch, roll]`
    pub fn to_array(&self) -> [f64; CARTESIAN_AXES] {
        [self.x, self.y, self.z, self.yaw, self.pitch, self.roll]
    }
}

impl TryFrom<[f64; CARTESIAN_AXES]> for CartesianPose {
    type Error = ValidationError;

    fn try_from(values: [f64; CARTESIAN_AXES]) -> Result<Self, Self::Error> {
        Self::from_array(values)
    }
}

impl TryFrom<&[f64]> for CartesianPose {
    type Error = ValidationError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        Self::from_slice(values)
    }
}

impl From<CartesianPose> for [f64; CARTESIAN_AXES] {
    fn from(pose: CartesianPose) -> Self {
        pose.to_array()
    }
}

/// 关节位姿
///
/// 从基座关节开始依次排列的关节角度。
/// 关节数是否与机器人配置匹配由使用方通过 [`JointPose::check_count`] 校验。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<f64>", into = "Vec<f64>")
)]
pub struct JointPose {
    angles: Vec<f64>,
}

impl JointPose {
    /// 创建关节位姿（至少 1 个关节，全部为有限值）
    pub fn new(angles: Vec<f64>) -> Result<Self, ValidationError> {
        if angles.is_empty() {
            return Err(ValidationError::InvalidLength {
                expected: DEFAULT_JOINT_COUNT,
                actual: 0,
            });
        }
        for (i, &value) in angles.iter().enumerate() {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite {
                    field: format!("j{}", i + 1),
                    value,
                });
            }
        }
        Ok(Self { angles })
    }

    /// 创建并要求恰好 `joint_count` 个关节
    pub fn with_count(angles: Vec<f64>, joint_count: usize) -> Result<Self, ValidationError> {
        if angles.len() != joint_count {
            return Err(ValidationError::InvalidLength {
                expected: joint_count,
                actual: angles.len(),
            });
        }
        Self::new(angles)
    }

    /// 校验关节数与配置一致
    pub fn check_count(&self, joint_count: usize) -> Result<(), ValidationError> {
        if self.angles.len() != joint_count {
            return Err(ValidationError::InvalidLength {
                expected: joint_count,
                actual: self.angles.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// 始终为 false（构造时保证至少 1 个关节）
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.angles
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.angles.iter().copied()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.angles
    }
}

impl TryFrom<Vec<f64>> for JointPose {
    type Error = ValidationError;

    fn try_from(angles: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(angles)
    }
}

impl From<JointPose> for Vec<f64> {
    fn from(pose: JointPose) -> Self {
        pose.angles
    }
}
