//! 后端配置
//!
//! 控制循环的两个时序预算、实时模式开关以及终止条件。
//! 可以从 TOML 加载（所有字段可选，缺省使用默认值）：
//!
//! ```toml
//! max_action_duration_s = 0.002
//! max_inter_action_duration_s = 0.005
//! is_realtime = true
//! max_number_of_actions = 0
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 后端配置
///
/// # Example
///
/// ```
/// use robot_driver::BackendConfig;
///
/// // 默认配置（2ms 动作预算，5ms 步间隔上限，实时模式）
/// let config = BackendConfig::default();
/// assert!(config.is_realtime);
///
/// // 期望步长 1ms，容差比 2：步间隔窗口 [0.5ms, 2ms]
/// let config = BackendConfig::default().with_expected_step(1.0, 2.0);
/// assert_eq!(config.inter_action_window_ms(), (0.5, 2.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// 单次 `apply_action` 最长耗时（秒）
    pub max_action_duration_s: f64,
    /// 相邻两步最长间隔（秒）
    pub max_inter_action_duration_s: f64,
    /// 相邻两步最短间隔（秒），默认 0
    pub min_inter_action_duration_s: f64,
    /// 实时模式：严格执行时序预算，未按时提交动作时重复上一个动作
    pub is_realtime: bool,
    /// 执行指定步数后停止（0 表示不限）
    pub max_number_of_actions: u64,
    /// 等待第一个动作的超时（秒），默认无限
    pub first_action_timeout_s: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_action_duration_s: 0.002,
            max_inter_action_duration_s: 0.005,
            min_inter_action_duration_s: 0.0,
            is_realtime: true,
            max_number_of_actions: 0,
            first_action_timeout_s: f64::INFINITY,
        }
    }
}

impl BackendConfig {
    /// 使用两个时序预算创建配置
    pub fn new(max_action_duration_s: f64, max_inter_action_duration_s: f64) -> Self {
        Self {
            max_action_duration_s,
            max_inter_action_duration_s,
            ..Default::default()
        }
    }

    /// 设置实时模式
    pub fn realtime(mut self, is_realtime: bool) -> Self {
        self.is_realtime = is_realtime;
        self
    }

    /// 设置最大步数（0 表示不限）
    pub fn max_number_of_actions(mut self, max_number_of_actions: u64) -> Self {
        self.max_number_of_actions = max_number_of_actions;
        self
    }

    /// 设置第一个动作的等待超时
    pub fn first_action_timeout(mut self, timeout: Duration) -> Self {
        self.first_action_timeout_s = timeout.as_secs_f64();
        self
    }

    /// 以期望步长和容差比设置步间隔窗口
    ///
    /// 窗口为 `[expected / ratio, expected * ratio]`（毫秒）。容差比小于 1 时窗口为空，
    /// [`validate`](Self::validate) 会拒绝。
    pub fn with_expected_step(mut self, expected_step_duration_ms: f64, tolerance_ratio: f64) -> Self {
        self.min_inter_action_duration_s = expected_step_duration_ms / tolerance_ratio / 1000.0;
        self.max_inter_action_duration_s = expected_step_duration_ms * tolerance_ratio / 1000.0;
        self
    }

    /// 动作耗时上限（毫秒）
    pub fn max_action_duration_ms(&self) -> f64 {
        self.max_action_duration_s * 1000.0
    }

    /// 步间隔窗口 `(min, max)`（毫秒）
    pub fn inter_action_window_ms(&self) -> (f64, f64) {
        (
            self.min_inter_action_duration_s * 1000.0,
            self.max_inter_action_duration_s * 1000.0,
        )
    }

    /// 第一个动作的等待超时，无限时返回 `None`
    pub fn first_action_timeout_duration(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.first_action_timeout_s).ok()
    }

    /// 校验配置
    ///
    /// # 错误
    /// - `ConfigError::Invalid`: 预算非正、窗口颠倒或超时非正
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_action_duration_s > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_action_duration_s must be > 0, got {}",
                self.max_action_duration_s
            )));
        }
        if !(self.max_inter_action_duration_s > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_inter_action_duration_s must be > 0, got {}",
                self.max_inter_action_duration_s
            )));
        }
        if !(self.min_inter_action_duration_s >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_inter_action_duration_s must be >= 0, got {}",
                self.min_inter_action_duration_s
            )));
        }
        if self.min_inter_action_duration_s > self.max_inter_action_duration_s {
            return Err(ConfigError::Invalid(format!(
                "inter-action window is empty: [{}, {}]",
                self.min_inter_action_duration_s, self.max_inter_action_duration_s
            )));
        }
        if !(self.first_action_timeout_s > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "first_action_timeout_s must be > 0, got {}",
                self.first_action_timeout_s
            )));
        }
        Ok(())
    }

    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: BackendConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载并校验
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = BackendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_action_duration_ms(), 2.0);
        assert_eq!(config.inter_action_window_ms(), (0.0, 5.0));
        assert_eq!(config.first_action_timeout_duration(), None);
    }

    #[test]
    fn test_builder_methods() {
        let config = BackendConfig::new(0.01, 0.02)
            .realtime(false)
            .max_number_of_actions(100)
            .first_action_timeout(Duration::from_millis(500));

        assert!(!config.is_realtime);
        assert_eq!(config.max_number_of_actions, 100);
        assert_eq!(
            config.first_action_timeout_duration(),
            Some(Duration::from_millis(500))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_expected_step_window() {
        let config = BackendConfig::default().with_expected_step(10.0, 1.25);
        let (min, max) = config.inter_action_window_ms();
        assert!((min - 8.0).abs() < 1e-9);
        assert!((max - 12.5).abs() < 1e-9);
        assert!(config.validate().is_ok());

        // 容差比 < 1 时窗口颠倒
        let config = BackendConfig::default().with_expected_step(10.0, 0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_budgets() {
        assert!(BackendConfig::new(0.0, 0.005).validate().is_err());
        assert!(BackendConfig::new(0.002, -1.0).validate().is_err());
        assert!(BackendConfig::new(f64::NAN, 0.005).validate().is_err());

        let mut config = BackendConfig::default();
        config.first_action_timeout_s = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = BackendConfig::from_toml_str(
            r#"
max_action_duration_s = 0.01
is_realtime = false
"#,
        )
        .unwrap();

        assert_eq!(config.max_action_duration_s, 0.01);
        assert!(!config.is_realtime);
        // 未指定的字段使用默认值
        assert_eq!(config.max_inter_action_duration_s, 0.005);
        assert_eq!(config.max_number_of_actions, 0);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = BackendConfig::from_toml_str("max_action_duration_s = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = BackendConfig::from_toml_str("max_action_duration_s = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_inter_action_duration_s = 0.1").unwrap();
        writeln!(file, "max_number_of_actions = 42").unwrap();

        let config = BackendConfig::load(file.path()).unwrap();
        assert_eq!(config.max_inter_action_duration_s, 0.1);
        assert_eq!(config.max_number_of_actions, 42);

        let err = BackendConfig::load("/nonexistent/backend.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
