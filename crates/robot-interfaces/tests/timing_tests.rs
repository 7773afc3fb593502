//! 时序检查测试
//!
//! 验证实时模式与非实时模式下对时序违规的不同处理：
//! 1. 实时模式：慢驱动在一步之内触发致命的 `TimingViolation`
//! 2. 非实时模式：只记录在 status 中，循环继续
//! 3. 实时模式下前端未按时提交时重复上一个动作
//! 4. 步间隔窗口的下限

use robot_interfaces::demo::ClipDriver;
use robot_interfaces::driver::{ActionSource, ErrorStatus};
use robot_interfaces::prelude::*;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

/// 每步约 10ms 的慢驱动
fn slow_driver() -> ClipDriver {
    ClipDriver::with_dof_delay(Duration::from_millis(5))
}

#[test]
#[serial]
fn test_slow_driver_is_fatal_in_realtime_mode() {
    let data = Arc::new(RobotData::new(100).unwrap());
    let config = BackendConfig::new(0.002, 1.0).realtime(true);
    let mut backend = RobotBackend::new(slow_driver(), data.clone(), config).unwrap();
    backend.initialize().unwrap();

    let frontend = RobotFrontend::new(data);
    frontend.append_desired_action([10, 10]);

    let reason = backend
        .wait_until_terminated_timeout(Duration::from_secs(5))
        .unwrap()
        .expect("backend should stop on the first slow action");

    match reason.error() {
        Some(BackendError::Timing(TimingViolation::ActionDuration { step, max_ms, .. })) => {
            assert_eq!(*step, 0);
            assert!((*max_ms - 2.0).abs() < 1e-9);
        },
        other => panic!("unexpected termination: {:?}", other),
    }

    // 违规的那一步仍然完整写入
    assert_eq!(frontend.get_applied_action(0).unwrap(), [10, 10]);
    let status = frontend.get_status(0).unwrap();
    assert!(!status.timing_ok);
    assert_eq!(status.error_status, ErrorStatus::BackendError);
    assert!(status.error_message.contains("step 0"));
    assert_eq!(backend.state(), BackendState::Stopped);
}

#[test]
#[serial]
fn test_slow_driver_is_logged_in_non_realtime_mode() {
    let data = Arc::new(RobotData::new(100).unwrap());
    let config = BackendConfig::new(0.002, 1.0).realtime(false);
    let mut backend = RobotBackend::new(slow_driver(), data.clone(), config).unwrap();
    backend.initialize().unwrap();

    let frontend = RobotFrontend::new(data);
    for value in 0..5 {
        let t = frontend.append_desired_action([value, value]);
        assert_eq!(frontend.get_applied_action(t).unwrap(), [value, value]);

        let status = frontend.get_status(t).unwrap();
        assert!(!status.timing_ok);
        assert!(!status.has_error());
    }

    assert!(backend.is_running());
    assert!(backend.error().is_none());
}

#[test]
#[serial]
fn test_late_frontend_repeats_last_action() {
    let data = Arc::new(RobotData::new(1000).unwrap());
    let config = BackendConfig::new(0.05, 0.05).realtime(true);
    let mut backend = RobotBackend::new(ClipDriver::new(), data.clone(), config).unwrap();
    backend.initialize().unwrap();

    let frontend = RobotFrontend::new(data);
    frontend.append_desired_action([1, 1]);
    // 前端 30ms 内不再提交
    spin_sleep::sleep(Duration::from_millis(30));

    let newest = frontend.current_time_index().unwrap();
    assert!(newest >= 1);
    for t in 1..=newest.min(5) {
        assert_eq!(frontend.get_applied_action(t).unwrap(), [1, 1]);
        let status = frontend.get_status(t).unwrap();
        assert_eq!(status.action_source, ActionSource::Repeated);
        assert_eq!(status.action_repetitions, t as u32);
    }
    assert!(backend.error().is_none());
}

#[test]
#[serial]
fn test_inter_action_window_lower_bound() {
    let data = Arc::new(RobotData::new(100).unwrap());
    // 期望步长 50ms，容差 1.25：步间隔必须在 [40ms, 62.5ms]，零耗时驱动第 1 步就过快
    let config = BackendConfig::new(0.05, 1.0)
        .with_expected_step(50.0, 1.25)
        .realtime(true);
    let mut backend =
        RobotBackend::new(ClipDriver::with_dof_delay(Duration::ZERO), data.clone(), config).unwrap();
    backend.initialize().unwrap();

    let frontend = RobotFrontend::new(data);
    frontend.append_desired_action([1, 1]);

    let reason = backend
        .wait_until_terminated_timeout(Duration::from_secs(5))
        .unwrap()
        .expect("backend should stop on the first short interval");
    match reason.error() {
        Some(BackendError::Timing(TimingViolation::InterActionDuration { step, min_ms, .. })) => {
            assert_eq!(*step, 1);
            assert!((*min_ms - 40.0).abs() < 1e-9);
        },
        other => panic!("unexpected termination: {:?}", other),
    }
}
