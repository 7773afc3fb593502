//! Robot Interfaces - 实时机器人控制接口
//!
//! 在控制算法（前端）与设备驱动（后端）之间建立带时序约束的数据通道。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **时间序列** (`timeseries`): 有界、带时间戳、阻塞读取的历史缓冲区
//! - **后端** (`driver`): 驱动接口、共享数据、控制线程与时序检查
//! - **前端** (`client`): 提交动作、按时间索引读取观测
//! - **工具** (`tools`): 二进制日志格式与后台记录器
//!
//! # 快速开始
//!
//! ```rust
//! use robot_interfaces::demo::ClipDriver;
//! use robot_interfaces::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = Arc::new(RobotData::new(1000)?);
//! let config = BackendConfig::new(0.01, 0.05).realtime(false);
//! let mut backend = RobotBackend::new(ClipDriver::new(), data.clone(), config)?;
//! backend.initialize()?;
//!
//! let frontend = RobotFrontend::new(data);
//! let t = frontend.append_desired_action([200, 1200]);
//! assert_eq!(frontend.get_applied_action(t)?, [200, 1000]);
//! # Ok(())
//! # }
//! ```

pub mod demo;
pub mod logging;
pub mod prelude;

/// 时间序列层
pub mod timeseries {
    pub use robot_timeseries::*;
}

/// 后端层
pub mod driver {
    pub use robot_driver::*;
}

/// 前端层
pub mod client {
    pub use robot_client::*;
}

/// 日志工具
pub mod tools {
    pub use robot_tools::*;
}

// --- 用户以此为界 ---

pub use robot_client::RobotFrontend;
pub use robot_driver::{
    BackendConfig, BackendError, BackendState, DriverError, RobotBackend, RobotData, RobotDriver,
    Status, TerminationReason, TimingViolation,
};
pub use robot_timeseries::{TimeIndex, TimeStamp, Timeseries, TimeseriesError};
pub use robot_tools::{
    LogError, RobotBinaryLogReader, RobotBinaryLogWriter, RobotLogEntry, RobotLogger,
};
