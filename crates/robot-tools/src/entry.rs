//! 日志条目

use robot_driver::{RobotData, Status};
use robot_timeseries::{TimeIndex, TimeStamp, TimeseriesError};
use serde::{Deserialize, Serialize};

/// 一个控制步的完整记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotLogEntry<A, O> {
    /// 时间索引
    pub timeindex: TimeIndex,
    /// 观测时间戳（毫秒）
    pub timestamp: TimeStamp,
    /// 状态
    pub status: Status,
    /// 观测（执行本步动作之前采集）
    pub observation: O,
    /// 期望动作
    pub desired_action: A,
    /// 实际执行的动作
    pub applied_action: A,
}

impl<A: Clone, O: Clone> RobotLogEntry<A, O> {
    /// 从共享数据中读取第 `index` 步
    ///
    /// 调用方应先确认 `status[index]` 已写入：状态是每步最后写入的序列，
    /// 它存在时其余三条序列的同一索引也已存在（驱动报错的步除外，那一步没有实际动作）。
    pub(crate) fn read(
        data: &RobotData<A, O>,
        index: TimeIndex,
        status: Status,
    ) -> Result<Self, TimeseriesError> {
        Ok(Self {
            timeindex: index,
            timestamp: data.observation().timestamp_ms(index)?,
            status,
            observation: data.observation().get(index)?,
            desired_action: data.desired_action().get(index)?,
            applied_action: data.applied_action().get(index)?,
        })
    }
}
