//! 驱动层错误类型定义

use robot_timeseries::{TimeIndex, TimeseriesError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 设备驱动错误（由 [`RobotDriver`](crate::RobotDriver) 实现方返回）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// 设备初始化失败
    #[error("Driver initialization failed: {0}")]
    Init(String),

    /// 执行动作失败
    #[error("Driver failed to apply action: {0}")]
    Action(String),
}

/// 时序违规
///
/// 实时模式下是致命错误（控制循环停止），非实时模式下只记录日志。
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimingViolation {
    /// 单次 `apply_action` 耗时超出预算
    #[error(
        "Action at step {step} took {duration_ms:.3}ms (budget: {max_ms:.3}ms)"
    )]
    ActionDuration {
        step: TimeIndex,
        duration_ms: f64,
        max_ms: f64,
    },

    /// 相邻两步的间隔超出 `[min_ms, max_ms]` 窗口
    #[error(
        "Step {step} started {duration_ms:.3}ms after the previous one (window: [{min_ms:.3}, {max_ms:.3}]ms)"
    )]
    InterActionDuration {
        step: TimeIndex,
        duration_ms: f64,
        min_ms: f64,
        max_ms: f64,
    },
}

/// 后端错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// 驱动初始化失败（后端保持 `Created` 状态）
    #[error("Driver initialization failed: {0}")]
    DriverInit(DriverError),

    /// 驱动执行动作失败（致命，不重试）
    #[error("Driver error at step {step}: {source}")]
    Driver {
        step: TimeIndex,
        #[source]
        source: DriverError,
    },

    /// 时序违规（实时模式下致命）
    #[error("Timing violation: {0}")]
    Timing(#[from] TimingViolation),

    /// 等待第一个动作超时
    #[error("No desired action received within {timeout_s}s")]
    FirstActionTimeout { timeout_s: f64 },

    /// 时间序列访问错误
    #[error("Timeseries error: {0}")]
    Timeseries(#[from] TimeseriesError),

    /// 配置非法
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// 后端已初始化
    #[error("Backend already initialized")]
    AlreadyInitialized,

    /// 后端尚未初始化
    #[error("Backend not initialized. Call `initialize()` first")]
    NotInitialized,

    /// 控制线程错误（创建失败或 panic）
    #[error("Control loop thread error: {0}")]
    LoopThread(String),
}

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// 配置值非法
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for BackendError {
    fn from(e: ConfigError) -> Self {
        BackendError::InvalidConfig(e.to_string())
    }
}
