//! 时间序列错误类型定义

use crate::TimeIndex;
use thiserror::Error;

/// 时间序列访问错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeseriesError {
    /// 请求的索引已被环形缓冲区淘汰
    ///
    /// 通常意味着调用方读取太慢（相对于 `history_length`）。
    #[error("Time index {index} is no longer available (oldest retained index: {oldest})")]
    IndexEvicted { index: TimeIndex, oldest: TimeIndex },

    /// 生产者已关闭，请求的索引永远不会再被写入
    #[error("Producer shut down before time index {index} was appended")]
    ProducerShutDown { index: TimeIndex },

    /// 等待超时
    #[error("Timed out waiting for time index {index}")]
    Timeout { index: TimeIndex },

    /// 时间序列为空
    #[error("Timeseries is empty")]
    Empty,

    /// 历史长度非法（必须大于 0）
    #[error("Invalid history length: {0} (must be > 0)")]
    InvalidHistoryLength(usize),
}
