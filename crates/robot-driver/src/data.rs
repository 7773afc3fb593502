//! 共享机器人数据
//!
//! 四条并行的时间序列共享同一个索引域：
//!
//! | 序列 | 写入方 | 读取方 |
//! |------|--------|--------|
//! | `desired_action` | 客户端 | 后端 |
//! | `applied_action` | 后端 | 客户端 |
//! | `observation` | 后端 | 客户端 |
//! | `status` | 后端 | 客户端 |
//!
//! **注意**：`observation[t]` 在执行第 `t` 步动作 **之前** 采集，
//! 反映的是 `applied_action[t-1]` 的结果，而不是 `applied_action[t]`。

use crate::status::Status;
use robot_timeseries::{Timeseries, TimeseriesError};
use std::sync::atomic::{AtomicBool, Ordering};

/// 默认历史长度
pub const DEFAULT_HISTORY_LENGTH: usize = 1000;

/// 机器人数据（后端与客户端共享，通过 `Arc` 持有）
pub struct RobotData<A, O> {
    desired_action: Timeseries<A>,
    applied_action: Timeseries<A>,
    observation: Timeseries<O>,
    status: Timeseries<Status>,
    /// 暂停请求（客户端提交新动作时清除）
    pause_requested: AtomicBool,
}

impl<A, O> std::fmt::Debug for RobotData<A, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotData")
            .field("desired_action", &self.desired_action)
            .field("applied_action", &self.applied_action)
            .field("observation", &self.observation)
            .field("status", &self.status)
            .field("pause_requested", &self.is_pause_requested())
            .finish()
    }
}

impl<A, O> RobotData<A, O> {
    /// 创建新的机器人数据，四条序列使用相同的 `history_length`
    ///
    /// # 错误
    /// - `TimeseriesError::InvalidHistoryLength`: `history_length` 为 0
    pub fn new(history_length: usize) -> Result<Self, TimeseriesError> {
        Ok(Self {
            desired_action: Timeseries::new(history_length)?,
            applied_action: Timeseries::new(history_length)?,
            observation: Timeseries::new(history_length)?,
            status: Timeseries::new(history_length)?,
            pause_requested: AtomicBool::new(false),
        })
    }

    /// 期望动作序列
    pub fn desired_action(&self) -> &Timeseries<A> {
        &self.desired_action
    }

    /// 实际执行动作序列
    pub fn applied_action(&self) -> &Timeseries<A> {
        &self.applied_action
    }

    /// 观测序列
    pub fn observation(&self) -> &Timeseries<O> {
        &self.observation
    }

    /// 状态序列
    pub fn status(&self) -> &Timeseries<Status> {
        &self.status
    }

    /// 历史长度
    pub fn history_length(&self) -> usize {
        self.observation.history_length()
    }

    /// 请求暂停（控制循环下一步生效）
    pub fn request_pause(&self) {
        self.pause_requested.store(true, Ordering::Release);
    }

    /// 清除暂停请求
    pub fn clear_pause(&self) {
        self.pause_requested.store(false, Ordering::Release);
    }

    /// 是否有暂停请求
    pub fn is_pause_requested(&self) -> bool {
        self.pause_requested.load(Ordering::Acquire)
    }

    /// 关闭全部四条序列，唤醒所有阻塞中的读者
    pub fn shutdown(&self) {
        self.desired_action.shutdown();
        self.applied_action.shutdown();
        self.observation.shutdown();
        self.status.shutdown();
    }

    /// 是否已关闭
    pub fn is_shut_down(&self) -> bool {
        self.observation.is_shut_down()
    }
}

impl<A, O> Default for RobotData<A, O> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LENGTH).expect("DEFAULT_HISTORY_LENGTH is non-zero")
    }
}
