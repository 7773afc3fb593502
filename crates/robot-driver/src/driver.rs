//! 设备驱动能力接口
//!
//! 集成方为具体设备实现 [`RobotDriver`]，后端对该 trait 泛型，不依赖具体硬件类型。

use crate::error::DriverError;

/// 设备驱动
///
/// 驱动对象被移动到控制线程，只由后端调用，客户端线程永远不会直接访问它。
/// 所有方法都应是同步且有界延迟的：阻塞过久的实现会触发后端的时序检查。
///
/// # Example
///
/// ```
/// use robot_driver::{DriverError, RobotDriver};
///
/// struct Counter {
///     position: i32,
/// }
///
/// impl RobotDriver for Counter {
///     type Action = i32;
///     type Observation = i32;
///
///     fn initialize(&mut self) -> Result<(), DriverError> {
///         self.position = 0;
///         Ok(())
///     }
///
///     fn apply_action(&mut self, desired: &i32) -> Result<i32, DriverError> {
///         self.position = *desired;
///         Ok(*desired)
///     }
///
///     fn get_latest_observation(&mut self) -> i32 {
///         self.position
///     }
///
///     fn shutdown(&mut self) {}
/// }
/// ```
pub trait RobotDriver: Send + 'static {
    /// 动作类型（`Default` 作为暂停时的中性动作）
    type Action: Clone + Default + Send + Sync + 'static;
    /// 观测类型
    type Observation: Clone + Send + Sync + 'static;

    /// 初始化设备（控制线程启动前调用）
    fn initialize(&mut self) -> Result<(), DriverError>;

    /// 执行动作，返回实际执行的动作（可能被限幅等修改）
    fn apply_action(&mut self, desired: &Self::Action) -> Result<Self::Action, DriverError>;

    /// 读取最新观测
    fn get_latest_observation(&mut self) -> Self::Observation;

    /// 关闭设备（控制循环退出时调用）
    fn shutdown(&mut self);
}
