//! 客户端接口模块
//!
//! 本模块提供机器人控制的用户侧接口：
//! - 提交期望动作（[`RobotFrontend::append_desired_action`]）
//! - 按时间索引阻塞读取观测、实际动作和状态
//!
//! # 使用场景
//!
//! 控制算法所在的线程只需要一个 [`RobotFrontend`]；控制线程由
//! [`RobotBackend`](robot_driver::RobotBackend) 持有。前后端通过同一个
//! `Arc<RobotData>` 通信。

mod frontend;

pub use frontend::{Result, RobotFrontend};
