//! # Robot Tools - 日志格式与记录器
//!
//! **依赖原则**: 只依赖 `robot-driver` 的数据类型，不依赖任何具体驱动
//!
//! ## 包含模块
//!
//! - `binary_log` - 二进制日志格式（版本标记 + bincode）
//! - `entry` - [`RobotLogEntry`]：一个控制步的完整记录
//! - `logger` - [`RobotLogger`]：跟随共享数据的后台记录线程，以及一次性导出 [`save_range`]

pub mod binary_log;
mod entry;
mod error;
pub mod logger;

pub use binary_log::{LOG_FORMAT_VERSION, RobotBinaryLogReader, RobotBinaryLogWriter};
pub use entry::RobotLogEntry;
pub use error::LogError;
pub use logger::{RobotLogger, save_range};
