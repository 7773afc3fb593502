//! 日志集成测试
//!
//! 后端运行时由 `RobotLogger` 记录每一步，写入文件后再读回。

use robot_interfaces::demo::{ClipAction, ClipDriver, ClipObservation};
use robot_interfaces::prelude::*;
use robot_interfaces::tools::{LOG_FORMAT_VERSION, save_range};
use std::sync::Arc;
use std::time::Duration;

fn run_steps(steps: u64) -> (Arc<RobotData<ClipAction, ClipObservation>>, RobotLogger<ClipAction, ClipObservation>) {
    let data = Arc::new(RobotData::new(1000).unwrap());
    let mut logger = RobotLogger::new(data.clone());
    logger.start().unwrap();

    let config = BackendConfig::new(1.0, 1.0)
        .realtime(false)
        .max_number_of_actions(steps);
    let mut backend =
        RobotBackend::new(ClipDriver::with_dof_delay(Duration::ZERO), data.clone(), config).unwrap();
    backend.initialize().unwrap();

    let frontend = RobotFrontend::new(data.clone());
    for value in 0..steps as i32 {
        frontend.append_desired_action([value * 10, 1000 - value * 10]);
    }
    backend.wait_until_terminated().unwrap();

    logger.stop().unwrap();
    (data, logger)
}

#[test]
fn test_logger_captures_every_step() {
    let (data, logger) = run_steps(20);
    assert_eq!(logger.len(), 20);
    assert_eq!(logger.missed_steps(), 0);

    let entries = logger.entries();
    for (t, entry) in entries.iter().enumerate() {
        let t = t as u64;
        assert_eq!(entry.timeindex, t);
        assert_eq!(entry.applied_action, data.applied_action().get(t).unwrap());
        assert_eq!(entry.observation, data.observation().get(t).unwrap());
        assert_eq!(entry.timestamp, data.observation().timestamp_ms(t).unwrap());
        assert_eq!(entry.status, data.status().get(t).unwrap());
    }
}

#[test]
fn test_log_file_round_trip() {
    let (_data, logger) = run_steps(30);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("robot.log");
    logger.write_file(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &LOG_FORMAT_VERSION.to_le_bytes());

    let reader = RobotBinaryLogReader::<ClipAction, ClipObservation>::from_file(&path).unwrap();
    assert_eq!(reader.data, logger.entries());
    assert_eq!(reader.data[3].desired_action, [30, 970]);
    assert!(reader.time_span_ms().unwrap() >= 0.0);
}

#[test]
fn test_incompatible_log_version() {
    let (_data, logger) = run_steps(5);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.log");
    logger.write_file(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[..4].copy_from_slice(&1u32.to_le_bytes());
    std::fs::write(&path, bytes).unwrap();

    let result = RobotBinaryLogReader::<ClipAction, ClipObservation>::from_file(&path);
    assert!(matches!(
        result,
        Err(LogError::IncompatibleLogFormat {
            found: 1,
            expected: 2
        })
    ));
}

#[test]
fn test_save_range_after_run() {
    let (data, _logger) = run_steps(10);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("range.log");
    assert_eq!(save_range(&data, &path, 2, Some(6)).unwrap(), 5);

    let reader = RobotBinaryLogReader::<ClipAction, ClipObservation>::from_file(&path).unwrap();
    assert_eq!(reader.data.first().map(|e| e.timeindex), Some(2));
    assert_eq!(reader.data.last().map(|e| e.timeindex), Some(6));
}
