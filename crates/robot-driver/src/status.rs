//! 每步状态记录
//!
//! 后端每个控制步向 status 序列追加一条 [`Status`]，记录动作来源、耗时和错误。

use serde::{Deserialize, Serialize};

/// 本步动作的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActionSource {
    /// 客户端按时提交
    #[default]
    Submitted,
    /// 未按时提交，重复上一个动作（实时模式）
    Repeated,
    /// 暂停中，使用中性动作
    Neutral,
}

/// 错误状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorStatus {
    #[default]
    NoError,
    /// 驱动报告的错误
    DriverError,
    /// 后端检测到的错误（如时序违规）
    BackendError,
}

/// 单步状态
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Status {
    /// 连续重复上一个动作的次数（含本步），按时提交时为 0
    pub action_repetitions: u32,
    /// 动作来源
    pub action_source: ActionSource,
    /// `apply_action` 耗时（毫秒）
    pub action_duration_ms: f64,
    /// 距上一步观测的间隔（毫秒），第 0 步为 `None`
    pub step_interval_ms: Option<f64>,
    /// 本步是否满足全部时序预算
    pub timing_ok: bool,
    /// 错误状态
    pub error_status: ErrorStatus,
    /// 错误描述（无错误时为空）
    pub error_message: String,
}

impl Status {
    /// 是否有错误
    pub fn has_error(&self) -> bool {
        self.error_status != ErrorStatus::NoError
    }

    /// 记录错误
    pub fn set_error(&mut self, error_status: ErrorStatus, message: impl Into<String>) {
        self.error_status = error_status;
        self.error_message = message.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_has_no_error() {
        let status = Status::default();
        assert!(!status.has_error());
        assert_eq!(status.action_source, ActionSource::Submitted);
        assert_eq!(status.action_repetitions, 0);
        assert!(status.error_message.is_empty());
    }

    #[test]
    fn test_set_error() {
        let mut status = Status::default();
        status.set_error(ErrorStatus::DriverError, "encoder lost");
        assert!(status.has_error());
        assert_eq!(status.error_status, ErrorStatus::DriverError);
        assert_eq!(status.error_message, "encoder lost");
    }
}
