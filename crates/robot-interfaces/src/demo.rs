//! 演示用驱动
//!
//! 一个 2 自由度的虚拟机器人：每个自由度的"位置"是一个整数，
//! 执行动作时把期望位置裁剪到 `[MIN_POSITION, MAX_POSITION]`，并为每个自由度模拟一段执行耗时。

use robot_driver::{DriverError, RobotDriver};
use std::time::Duration;
use tracing::debug;

/// 自由度数量
pub const DOF: usize = 2;

/// 位置下限（初始化后的位置）
pub const MIN_POSITION: i32 = 0;

/// 位置上限
pub const MAX_POSITION: i32 = 1000;

/// 演示动作：每个自由度的期望位置
pub type ClipAction = [i32; DOF];

/// 演示观测：每个自由度的当前位置
pub type ClipObservation = [i32; DOF];

/// 裁剪驱动
#[derive(Debug, Clone)]
pub struct ClipDriver {
    state: ClipObservation,
    /// 每个自由度的模拟执行耗时
    dof_delay: Duration,
}

impl Default for ClipDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipDriver {
    /// 每个自由度耗时 1ms
    pub fn new() -> Self {
        Self::with_dof_delay(Duration::from_millis(1))
    }

    /// 指定每个自由度的模拟耗时（`Duration::ZERO` 表示不等待）
    pub fn with_dof_delay(dof_delay: Duration) -> Self {
        Self {
            state: [MIN_POSITION; DOF],
            dof_delay,
        }
    }
}

impl RobotDriver for ClipDriver {
    type Action = ClipAction;
    type Observation = ClipObservation;

    fn initialize(&mut self) -> Result<(), DriverError> {
        self.state = [MIN_POSITION; DOF];
        debug!("Clip driver initialized at {:?}", self.state);
        Ok(())
    }

    fn apply_action(&mut self, desired: &ClipAction) -> Result<ClipAction, DriverError> {
        let mut applied = [MIN_POSITION; DOF];
        for (dof, value) in desired.iter().enumerate() {
            applied[dof] = (*value).clamp(MIN_POSITION, MAX_POSITION);
            if !self.dof_delay.is_zero() {
                spin_sleep::sleep(self.dof_delay);
            }
            self.state[dof] = applied[dof];
        }
        Ok(applied)
    }

    fn get_latest_observation(&mut self) -> ClipObservation {
        self.state
    }

    fn shutdown(&mut self) {
        debug!("Clip driver shut down at {:?}", self.state);
    }
}
