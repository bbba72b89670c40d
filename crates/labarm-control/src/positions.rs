//! 位置文件（CSV）
//!
//! 第一行是表头，跳过。之后每行第一列是标签：
//!
//! ```text
//! type,v1,v2,v3,v4,v5,v6
//! C,100,200,300,0,90,0
//! J,0,10,20,30,40,50
//! ```
//!
//! - `C`：笛卡尔位姿，恰好 6 个数值
//! - `J`：关节位姿，恰好 N 个数值（N 为配置的关节数）
//!
//! 标签两侧的空白和引号会被忽略，行尾的空字段会被忽略。
//! 任何一行出错都会让整个加载失败，不会返回部分结果。

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use labarm_protocol::{
    CARTESIAN_AXES, CartesianPose, JointPose, ValidationError, format_number, parse_number,
};
use thiserror::Error;
use tracing::debug;

/// 位置文件错误
///
/// 行号从 1 开始，表头为第 1 行。
#[derive(Error, Debug)]
pub enum PositionFileError {
    #[error("Failed to access position file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: unknown row tag {tag:?} (expected 'C' or 'J')")]
    UnknownTag { line: u64, tag: String },

    #[error("Line {line}: {kind} row needs {expected} values, got {actual}")]
    FieldCount {
        line: u64,
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Line {line}, column {column}: invalid number {value:?}")]
    InvalidNumber {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("Line {line}: {source}")]
    InvalidPose {
        line: u64,
        #[source]
        source: ValidationError,
    },
}

impl PositionFileError {
    /// 出错的行号（IO / CSV 层错误没有行号）
    pub fn line(&self) -> Option<u64> {
        match self {
            PositionFileError::UnknownTag { line, .. }
            | PositionFileError::FieldCount { line, .. }
            | PositionFileError::InvalidNumber { line, .. }
            | PositionFileError::InvalidPose { line, .. } => Some(*line),
            PositionFileError::Csv(e) => e.position().map(|p| p.line()),
            PositionFileError::Io { .. } => None,
        }
    }
}

/// 位置表：按文件顺序排列的笛卡尔位姿和关节位姿
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionTable {
    pub cartesian: Vec<CartesianPose>,
    pub joints: Vec<JointPose>,
}

impl PositionTable {
    pub fn is_empty(&self) -> bool {
        self.cartesian.is_empty() && self.joints.is_empty()
    }
}

/// 从任意 reader 解析位置表
pub fn parse_positions<R: io::Read>(
    reader: R,
    joint_count: usize,
) -> Result<PositionTable, PositionFileError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = PositionTable::default();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let mut fields: Vec<&str> = record.iter().collect();
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }
        let Some((tag, values)) = fields.split_first() else {
            continue;
        };

        match tag.trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace()) {
            "C" => {
                let values = parse_values(line, values, "Cartesian", CARTESIAN_AXES)?;
                let pose = CartesianPose::from_slice(&values)
                    .map_err(|source| PositionFileError::InvalidPose { line, source })?;
                table.cartesian.push(pose);
            },
            "J" => {
                let values = parse_values(line, values, "joint", joint_count)?;
                let pose = JointPose::with_count(values, joint_count)
                    .map_err(|source| PositionFileError::InvalidPose { line, source })?;
                table.joints.push(pose);
            },
            other => {
                return Err(PositionFileError::UnknownTag {
                    line,
                    tag: other.to_string(),
                });
            },
        }
    }

    debug!(
        "Parsed {} Cartesian and {} joint positions",
        table.cartesian.len(),
        table.joints.len()
    );
    Ok(table)
}

/// 从文件加载位置表
pub fn load_positions<P: AsRef<Path>>(
    path: P,
    joint_count: usize,
) -> Result<PositionTable, PositionFileError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| PositionFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_positions(file, joint_count)
}

/// 按相同格式写出位置表（先笛卡尔行，后关节行）
pub fn write_positions<W: io::Write>(
    writer: W,
    table: &PositionTable,
) -> Result<(), PositionFileError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);

    let width = table
        .joints
        .iter()
        .map(JointPose::len)
        .chain(std::iter::once(CARTESIAN_AXES))
        .max()
        .unwrap_or(CARTESIAN_AXES);
    let header = std::iter::once("type".to_string()).chain((1..=width).map(|i| format!("v{i}")));
    writer.write_record(header)?;

    for pose in &table.cartesian {
        let row = std::iter::once("C".to_string()).chain(pose.to_array().map(format_number));
        writer.write_record(row)?;
    }
    for pose in &table.joints {
        let row = std::iter::once("J".to_string()).chain(pose.iter().map(format_number));
        writer.write_record(row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// 把位置表写入文件
pub fn store_positions<P: AsRef<Path>>(
    path: P,
    table: &PositionTable,
) -> Result<(), PositionFileError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| PositionFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_positions(file, table)
}

fn parse_values(
    line: u64,
    values: &[&str],
    kind: &'static str,
    expected: usize,
) -> Result<Vec<f64>, PositionFileError> {
    if values.len() != expected {
        return Err(PositionFileError::FieldCount {
            line,
            kind,
            expected,
            actual: values.len(),
        });
    }
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            parse_number(value).ok_or_else(|| PositionFileError::InvalidNumber {
                line,
                // 第 1 列是标签
                column: i + 2,
                value: value.to_string(),
            })
        })
        .collect()
}
