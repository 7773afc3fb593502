//! # Robot Timeseries
//!
//! 控制循环与客户端之间的同步基础设施：固定容量、带时间戳、按索引寻址的历史缓冲区。
//!
//! ## 包含模块
//!
//! - `timeseries` - [`Timeseries`]：阻塞读取 + 有界淘汰的环形缓冲区
//! - `clock` - 进程级单调时钟（毫秒）
//! - `error` - [`TimeseriesError`]
//!
//! ## 索引语义
//!
//! 每次 `append` 分配 `newest + 1`（空序列为 0）。同一控制步在所有序列中使用相同的
//! [`TimeIndex`]，因此索引是跨序列的关联键。

pub mod clock;
mod error;
pub mod timeseries;

/// 控制步索引（单调递增，每次 append 加 1）
pub type TimeIndex = u64;

/// 单调时间戳（毫秒）
pub type TimeStamp = f64;

pub use clock::current_time_ms;
pub use error::TimeseriesError;
pub use timeseries::Timeseries;
