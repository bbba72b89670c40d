//! 请求命令编码与解析
//!
//! [`Command`] 与线上的一行请求一一对应：`<verb> <arg>...`。
//! 编码是纯函数，参数顺序和数值格式只在这里定义一次。

use std::fmt;

use crate::pose::{CartesianPose, JointPose};
use crate::types::{Clearance, Percent, ProfileIndex, StationIndex};
use crate::{DecodeError, ValidationError, format_number, parse_number};

/// 应答类型
///
/// 决定该命令的应答行应该如何解码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// 仅状态码（`0` 成功，负数为错误）
    Ack,
    /// 6 个笛卡尔分量
    Cartesian,
    /// N 个关节角度
    Joints,
    /// 抓取/放置三态结果
    Grasp,
}

/// 控制器命令
///
/// 构造后不可变，一个值对应一行请求。
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 加载工位/位置数据文件（覆盖控制器上的所有位置与运动参数）
    LoadFile { path: String },
    /// 保存当前工位/位置数据到文件
    StoreFile { path: String },
    /// 示教工位位置；`clearance` 为 `None` 时沿用已存储的退让量
    TeachPlate {
        station: StationIndex,
        clearance: Option<Clearance>,
    },
    /// 移动到工位
    Move {
        station: StationIndex,
        profile: ProfileIndex,
    },
    /// 移动到笛卡尔位姿
    MoveC {
        profile: ProfileIndex,
        pose: CartesianPose,
    },
    /// 移动到关节位姿
    MoveJ {
        profile: ProfileIndex,
        pose: JointPose,
    },
    /// 查询当前笛卡尔位姿
    WhereC,
    /// 查询当前关节角度
    WhereJ,
    /// 查询目标笛卡尔位姿（静止时为当前位姿）
    DestC,
    /// 查询目标关节角度（静止时为当前角度）
    DestJ,
    /// 从工位抓取料板
    PickPlate {
        station: StationIndex,
        compliance: bool,
        torque: Percent,
    },
    /// 放置料板到工位（结束时夹爪仍然闭合）
    PlacePlate {
        station: StationIndex,
        compliance: bool,
        torque: Percent,
    },
    /// 张开夹爪释放料板
    ReleasePlate { width: f64, speed: Percent },
    /// 空操作，用于确认会话存活
    Nop,
}

impl Command {
    /// 构造 `LoadFile`，路径不能为空且不能包含空白
    pub fn load_file(path: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Command::LoadFile {
            path: check_path(path.into())?,
        })
    }

    /// 构造 `StoreFile`，路径不能为空且不能包含空白
    pub fn store_file(path: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Command::StoreFile {
            path: check_path(path.into())?,
        })
    }

    /// 线上的动词
    pub fn verb(&self) -> &'static str {
        match self {
            Command::LoadFile { .. } => "LoadFile",
            Command::StoreFile { .. } => "StoreFile",
            Command::TeachPlate { .. } => "TeachPlate",
            Command::Move { .. } => "Move",
            Command::MoveC { .. } => "MoveC",
            Command::MoveJ { .. } => "MoveJ",
            Command::WhereC => "wherec",
            Command::WhereJ => "wherej",
            Command::DestC => "DestC",
            Command::DestJ => "DestJ",
            Command::PickPlate { .. } => "PickPlate",
            Command::PlacePlate { .. } => "PlacePlate",
            Command::ReleasePlate { .. } => "ReleasePlate",
            Command::Nop => "nop",
        }
    }

    /// 按线格式顺序排列的参数
    pub fn args(&self) -> Vec<String> {
        match self {
            Command::LoadFile { path } | Command::StoreFile { path } => vec![path.clone()],
            Command::TeachPlate { station, clearance } => {
                let mut args = vec![station.to_string()];
                if let Some(clearance) = clearance {
                    args.push(clearance.to_string());
                }
                args
            },
            Command::Move { station, profile } => vec![station.to_string(), profile.to_string()],
            Command::MoveC { profile, pose } => std::iter::once(profile.to_string())
                .chain(pose.to_array().into_iter().map(format_number))
                .collect(),
            Command::MoveJ { profile, pose } => std::iter::once(profile.to_string())
                .chain(pose.iter().map(format_number))
                .collect(),
            Command::WhereC
            | Command::WhereJ
            | Command::DestC
            | Command::DestJ
            | Command::Nop => Vec::new(),
            Command::PickPlate {
                station,
                compliance,
                torque,
            }
            | Command::PlacePlate {
                station,
                compliance,
                torque,
            } => vec![
                station.to_string(),
                format_flag(*compliance).to_string(),
                torque.to_string(),
            ],
            Command::ReleasePlate { width, speed } => {
                vec![format_number(*width), speed.to_string()]
            },
        }
    }

    /// 编码为一行请求（不含行结束符）
    pub fn encode(&self) -> String {
        let mut line = self.verb().to_string();
        for arg in self.args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }

    /// 该命令期望的应答类型
    pub fn reply_kind(&self) -> ReplyKind {
        match self {
            Command::WhereC | Command::DestC => ReplyKind::Cartesian,
            Command::WhereJ | Command::DestJ => ReplyKind::Joints,
            Command::PickPlate { .. } | Command::PlacePlate { .. } => ReplyKind::Grasp,
            _ => ReplyKind::Ack,
        }
    }

    /// 从一行请求解析命令
    ///
    /// 动词大小写不敏感。`MoveJ` 接受任意个（≥1）关节值，关节数是否匹配由接收方判断。
    pub fn parse(line: &str) -> Result<Self, DecodeError> {
        let mut tokens = line.split_whitespace();
        let verb = tokens
            .next()
            .ok_or_else(|| DecodeError::new(line, "empty command line"))?;
        let args = Args {
            line,
            tokens: tokens.collect(),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "loadfile" => {
                args.expect_len(1)?;
                Command::LoadFile {
                    path: args.tokens[0].to_string(),
                }
            },
            "storefile" => {
                args.expect_len(1)?;
                Command::StoreFile {
                    path: args.tokens[0].to_string(),
                }
            },
            "teachplate" => {
                args.expect_len_between(1, 2)?;
                let clearance = match args.tokens.get(1) {
                    Some(_) => Clearance::from_raw(args.number(1)?).map_err(|e| args.invalid(e))?,
                    None => None,
                };
                Command::TeachPlate {
                    station: args.station(0)?,
                    clearance,
                }
            },
            "move" => {
                args.expect_len(2)?;
                Command::Move {
                    station: args.station(0)?,
                    profile: args.profile(1)?,
                }
            },
            "movec" => {
                args.expect_len(7)?;
                let values = (1..7)
                    .map(|i| args.number(i))
                    .collect::<Result<Vec<_>, _>>()?;
                Command::MoveC {
                    profile: args.profile(0)?,
                    pose: CartesianPose::from_slice(&values).map_err(|e| args.invalid(e))?,
                }
            },
            "movej" => {
                if args.tokens.len() < 2 {
                    return Err(args.arity("at least 2"));
                }
                let values = (1..args.tokens.len())
                    .map(|i| args.number(i))
                    .collect::<Result<Vec<_>, _>>()?;
                Command::MoveJ {
                    profile: args.profile(0)?,
                    pose: JointPose::new(values).map_err(|e| args.invalid(e))?,
                }
            },
            "wherec" => args.no_args(Command::WhereC)?,
            "wherej" => args.no_args(Command::WhereJ)?,
            "destc" => args.no_args(Command::DestC)?,
            "destj" => args.no_args(Command::DestJ)?,
            "nop" => args.no_args(Command::Nop)?,
            "pickplate" => {
                args.expect_len(3)?;
                Command::PickPlate {
                    station: args.station(0)?,
                    compliance: args.flag(1)?,
                    torque: args.percent(2, "torque")?,
                }
            },
            "placeplate" => {
                args.expect_len(3)?;
                Command::PlacePlate {
                    station: args.station(0)?,
                    compliance: args.flag(1)?,
                    torque: args.percent(2, "torque")?,
                }
            },
            "releaseplate" => {
                args.expect_len(2)?;
                Command::ReleasePlate {
                    width: args.number(0)?,
                    speed: args.percent(1, "speed")?,
                }
            },
            _ => return Err(DecodeError::new(line, format!("unknown verb {verb:?}"))),
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// 整数标志编码为 `0` / `1`
fn format_flag(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

fn check_path(path: String) -> Result<String, ValidationError> {
    if path.is_empty() || path.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidPath(path));
    }
    Ok(path)
}

/// 参数 token 解析辅助
struct Args<'a> {
    line: &'a str,
    tokens: Vec<&'a str>,
}

impl Args<'_> {
    fn arity(&self, expected: &str) -> DecodeError {
        DecodeError::new(
            self.line,
            format!("expected {expected} arguments, got {}", self.tokens.len()),
        )
    }

    fn invalid(&self, err: ValidationError) -> DecodeError {
        DecodeError::new(self.line, err.to_string())
    }

    fn expect_len(&self, n: usize) -> Result<(), DecodeError> {
        if self.tokens.len() != n {
            return Err(self.arity(&n.to_string()));
        }
        Ok(())
    }

    fn expect_len_between(&self, min: usize, max: usize) -> Result<(), DecodeError> {
        if !(min..=max).contains(&self.tokens.len()) {
            return Err(self.arity(&format!("{min}..={max}")));
        }
        Ok(())
    }

    fn no_args(&self, command: Command) -> Result<Command, DecodeError> {
        self.expect_len(0)?;
        Ok(command)
    }

    fn integer(&self, i: usize) -> Result<i64, DecodeError> {
        self.tokens[i].parse::<i64>().map_err(|_| {
            DecodeError::new(
                self.line,
                format!("argument {} is not an integer: {:?}", i + 1, self.tokens[i]),
            )
        })
    }

    fn number(&self, i: usize) -> Result<f64, DecodeError> {
        parse_number(self.tokens[i]).ok_or_else(|| {
            DecodeError::new(
                self.line,
                format!("argument {} is not a finite number: {:?}", i + 1, self.tokens[i]),
            )
        })
    }

    fn station(&self, i: usize) -> Result<StationIndex, DecodeError> {
        StationIndex::new(self.integer(i)?).map_err(|e| self.invalid(e))
    }

    fn profile(&self, i: usize) -> Result<ProfileIndex, DecodeError> {
        ProfileIndex::new(self.integer(i)?).map_err(|e| self.invalid(e))
    }

    fn flag(&self, i: usize) -> Result<bool, DecodeError> {
        match self.tokens[i] {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(DecodeError::new(
                self.line,
                format!("argument {} is not a 0/1 flag: {other:?}", i + 1),
            )),
        }
    }

    fn percent(&self, i: usize, field: &'static str) -> Result<Percent, DecodeError> {
        let value = u8::try_from(self.integer(i)?).map_err(|_| {
            DecodeError::new(
                self.line,
                format!("argument {} out of range: {:?}", i + 1, self.tokens[i]),
            )
        })?;
        Percent::new(field, value).map_err(|e| self.invalid(e))
    }
}
