//! # 二进制日志格式
//!
//! ```text
//! [Version: 4 bytes, u32 little-endian]   当前为 2
//! [Data: bincode serialized Vec<RobotLogEntry>]
//! ```
//!
//! 版本不匹配的文件会被拒绝（[`LogError::IncompatibleLogFormat`]），读取时一次载入全部条目。

use crate::entry::RobotLogEntry;
use crate::error::LogError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// 日志文件格式版本
pub const LOG_FORMAT_VERSION: u32 = 2;

/// 二进制日志写入器
#[derive(Debug, Clone)]
pub struct RobotBinaryLogWriter<A, O> {
    /// 待写入的条目
    pub data: Vec<RobotLogEntry<A, O>>,
}

impl<A, O> Default for RobotBinaryLogWriter<A, O> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<A: Serialize, O: Serialize> RobotBinaryLogWriter<A, O> {
    /// 使用已有条目创建写入器
    pub fn new(data: Vec<RobotLogEntry<A, O>>) -> Self {
        Self { data }
    }

    /// 追加一个条目
    pub fn push(&mut self, entry: RobotLogEntry<A, O>) {
        self.data.push(entry);
    }

    /// 写入任意 `Write`
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), LogError> {
        writer.write_all(&LOG_FORMAT_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, &self.data)?;
        writer.flush()?;
        Ok(())
    }

    /// 写入文件（覆盖已有文件）
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LogError> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))?;
        debug!(
            "Wrote {} log entries to {}",
            self.data.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

/// 二进制日志读取器
///
/// # Example
///
/// ```no_run
/// use robot_tools::RobotBinaryLogReader;
///
/// let reader = RobotBinaryLogReader::<[i32; 2], [i32; 2]>::from_file("robot.log")?;
/// for entry in &reader.data {
///     println!("{}: {:?}", entry.timeindex, entry.applied_action);
/// }
/// # Ok::<(), robot_tools::LogError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RobotBinaryLogReader<A, O> {
    /// 读取到的全部条目
    pub data: Vec<RobotLogEntry<A, O>>,
}

impl<A, O> Default for RobotBinaryLogReader<A, O> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<A: DeserializeOwned, O: DeserializeOwned> RobotBinaryLogReader<A, O> {
    /// 打开并读取文件
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let mut reader = Self::default();
        reader.read_file(path)?;
        Ok(reader)
    }

    /// 读取文件，替换 `data` 中已有的条目
    pub fn read_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LogError> {
        let file = File::open(path.as_ref())?;
        self.read_from(BufReader::new(file))
    }

    /// 从任意 `Read` 读取
    pub fn read_from<R: Read>(&mut self, mut reader: R) -> Result<(), LogError> {
        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;

        let found = u32::from_le_bytes(version);
        if found != LOG_FORMAT_VERSION {
            return Err(LogError::IncompatibleLogFormat {
                found,
                expected: LOG_FORMAT_VERSION,
            });
        }

        self.data = bincode::deserialize_from(reader)?;
        Ok(())
    }
}

impl<A, O> RobotBinaryLogReader<A, O> {
    /// 条目数量
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 首尾条目的时间跨度（毫秒）
    pub fn time_span_ms(&self) -> Option<f64> {
        let first = self.data.first()?.timestamp;
        let last = self.data.last()?.timestamp;
        Some(last - first)
    }
}
