//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use robot_interfaces::prelude::*;
//! ```

// 前端（推荐入口）
pub use robot_client::RobotFrontend;

// 后端与驱动
pub use robot_driver::{
    BackendConfig, BackendState, RobotBackend, RobotData, RobotDriver, Status, TerminationReason,
};

// 时间序列
pub use robot_timeseries::{TimeIndex, TimeStamp, Timeseries};

// 日志
pub use robot_tools::{RobotBinaryLogReader, RobotLogger};

// 错误类型
pub use robot_driver::{BackendError, ConfigError, DriverError, TimingViolation};
pub use robot_timeseries::TimeseriesError;
pub use robot_tools::LogError;
