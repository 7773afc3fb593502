//! Pause/resume and logging demo
//!
//! Runs the clip driver in real-time mode, pauses it for a while (the backend applies
//! neutral actions), resumes, then writes every recorded step to a binary log and
//! reads it back.

use robot_interfaces::demo::{ClipAction, ClipDriver, ClipObservation};
use robot_interfaces::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    robot_interfaces::init_logger!();

    let data = Arc::new(RobotData::default());
    let mut logger = RobotLogger::new(data.clone());
    logger.start()?;

    let config = BackendConfig::new(0.005, 0.01);
    let mut backend = RobotBackend::new(ClipDriver::new(), data.clone(), config)?;
    backend.initialize()?;

    let frontend = RobotFrontend::new(data.clone());

    println!("Moving...");
    for value in (0..=500).step_by(10) {
        let t = frontend.append_desired_action([value, value]);
        frontend.wait_until_time_index(t)?;
        spin_sleep::sleep(Duration::from_millis(2));
    }

    println!("Pausing for 50ms...");
    backend.pause();
    spin_sleep::sleep(Duration::from_millis(50));
    if let Some(t) = frontend.current_time_index() {
        println!("  step {}: applied {:?}", t, frontend.get_applied_action(t.saturating_sub(1))?);
    }

    println!("Resuming...");
    let t = frontend.append_desired_action([700, 300]);
    println!("  step {}: applied {:?}", t, frontend.get_applied_action(t)?);

    backend.request_shutdown();
    let reason = backend.wait_until_terminated()?;
    println!("Backend terminated: {:?}", reason);

    logger.stop()?;
    let path = std::env::temp_dir().join("robot_interfaces_demo.log");
    logger.write_file(&path)?;

    let reader = RobotBinaryLogReader::<ClipAction, ClipObservation>::from_file(&path)?;
    println!(
        "Wrote {} steps ({:.1}ms) to {}",
        reader.len(),
        reader.time_span_ms().unwrap_or_default(),
        path.display()
    );
    Ok(())
}
