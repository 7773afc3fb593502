//! 后端层模块
//!
//! 本模块提供机器人控制循环的后端功能，包括：
//! - 设备驱动接口（[`RobotDriver`]）
//! - 共享数据（四条并行时间序列，[`RobotData`]）
//! - 控制线程管理与时序检查（[`RobotBackend`]）
//! - 每步状态记录（[`Status`]）
//!
//! # 使用场景
//!
//! 集成方实现 [`RobotDriver`]，用 [`RobotBackend`] 驱动它；
//! 提交动作、读取观测应使用 `robot-client` 提供的前端接口。

mod backend;
pub mod config;
mod control_loop;
pub mod data;
mod driver;
mod error;
pub mod state;
pub mod status;

pub use backend::RobotBackend;
pub use config::BackendConfig;
pub use control_loop::TerminationReason;
pub use data::{DEFAULT_HISTORY_LENGTH, RobotData};
pub use driver::RobotDriver;
pub use error::{BackendError, ConfigError, DriverError, TimingViolation};
pub use state::{AtomicBackendState, BackendState};
pub use status::{ActionSource, ErrorStatus, Status};
