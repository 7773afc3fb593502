//! 前端（客户端视图）
//!
//! [`RobotFrontend`] 只持有共享数据，不拥有控制线程。可以任意克隆，
//! 多个前端指向同一个 [`RobotData`] 时行为完全等价。

use robot_driver::{RobotData, Status};
use robot_timeseries::{TimeIndex, TimeStamp, TimeseriesError};
use std::sync::Arc;
use tracing::trace;

/// 前端读取操作结果
pub type Result<T> = std::result::Result<T, TimeseriesError>;

/// 机器人前端
///
/// 所有 `get_*` 方法在索引尚未产生时阻塞，直到后端写入、索引被淘汰或后端关闭。
///
/// # Example
///
/// ```
/// use robot_client::RobotFrontend;
/// use robot_driver::RobotData;
/// use std::sync::Arc;
///
/// let data = Arc::new(RobotData::<i32, i32>::new(100).unwrap());
/// let frontend = RobotFrontend::new(data);
///
/// let t = frontend.append_desired_action(42);
/// assert_eq!(t, 0);
/// assert_eq!(frontend.get_desired_action(t).unwrap(), 42);
/// // 后端尚未执行任何一步
/// assert_eq!(frontend.current_time_index(), None);
/// ```
pub struct RobotFrontend<A, O> {
    data: Arc<RobotData<A, O>>,
}

impl<A, O> Clone for RobotFrontend<A, O> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

impl<A, O> std::fmt::Debug for RobotFrontend<A, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotFrontend")
            .field("current_time_index", &self.current_time_index())
            .finish()
    }
}

impl<A, O> RobotFrontend<A, O> {
    /// 基于共享数据创建前端
    pub fn new(data: Arc<RobotData<A, O>>) -> Self {
        Self { data }
    }

    /// 提交期望动作，返回它被分配的时间索引
    ///
    /// 同时清除暂停请求。
    pub fn append_desired_action(&self, action: A) -> TimeIndex {
        self.data.clear_pause();
        let index = self.data.desired_action().append(action);
        trace!("Desired action submitted at index {}", index);
        index
    }

    /// 观测 `index` 的时间戳（毫秒）
    pub fn get_time_stamp_ms(&self, index: TimeIndex) -> Result<TimeStamp> {
        self.data.observation().timestamp_ms(index)
    }

    /// 阻塞直到第 `index` 步的观测已产生
    ///
    /// 已被淘汰的索引视为已产生，立即返回。
    pub fn wait_until_time_index(&self, index: TimeIndex) -> Result<()> {
        self.data.observation().wait_for_index(index)
    }

    /// 最新一步的索引（后端尚未执行任何一步时为 `None`）
    pub fn current_time_index(&self) -> Option<TimeIndex> {
        self.data.observation().newest_index()
    }

    /// 共享数据
    pub fn robot_data(&self) -> &Arc<RobotData<A, O>> {
        &self.data
    }

    /// 获取第 `index` 步的状态
    pub fn get_status(&self, index: TimeIndex) -> Result<Status> {
        self.data.status().get(index)
    }
}

impl<A: Clone, O> RobotFrontend<A, O> {
    /// 获取第 `index` 步实际执行的动作
    pub fn get_applied_action(&self, index: TimeIndex) -> Result<A> {
        self.data.applied_action().get(index)
    }

    /// 获取第 `index` 步的期望动作（含后端补写的重复动作和中性动作）
    pub fn get_desired_action(&self, index: TimeIndex) -> Result<A> {
        self.data.desired_action().get(index)
    }
}

impl<A, O: Clone> RobotFrontend<A, O> {
    /// 获取第 `index` 步的观测（在执行第 `index` 步动作之前采集）
    pub fn get_observation(&self, index: TimeIndex) -> Result<O> {
        self.data.observation().get(index)
    }
}
