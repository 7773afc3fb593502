//! 日志错误类型

use robot_timeseries::TimeseriesError;
use std::io;
use thiserror::Error;

/// 日志读写错误
#[derive(Error, Debug)]
pub enum LogError {
    /// 文件版本标记不匹配
    #[error("Incompatible log file format (found version {found}, expected {expected})")]
    IncompatibleLogFormat { found: u32, expected: u32 },

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// 序列化/反序列化失败
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),

    /// 读取共享数据失败
    #[error("Timeseries error: {0}")]
    Timeseries(#[from] TimeseriesError),

    /// 记录线程已启动
    #[error("Logger already started")]
    AlreadyStarted,

    /// 记录线程异常退出
    #[error("Logger thread panicked")]
    ThreadPanicked,
}
