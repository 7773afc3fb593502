//! Minimal demo of driver, backend and frontend
//!
//! A 2-DoF dummy robot whose positions are integers. One DoF goes from 200 to 300,
//! the other from 300 to 200; for each submitted action the observation at the
//! same index is printed.

use robot_interfaces::demo::ClipDriver;
use robot_interfaces::prelude::*;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    robot_interfaces::init_logger!();

    let data = Arc::new(RobotData::default());

    // 2ms per action (two DoF at 1ms each) plus scheduling jitter
    let config = BackendConfig::new(0.005, 0.01);
    let mut backend = RobotBackend::new(ClipDriver::new(), data.clone(), config)?;
    backend.initialize()?;

    let frontend = RobotFrontend::new(data);

    for value in 200..=300 {
        let action = [value, 500 - value];
        let index = frontend.append_desired_action(action);
        // Observation at `index` is taken right before action `index` is applied
        let observation = frontend.get_observation(index)?;
        println!(
            "value: {} | action: {} {} observation: {} {}",
            value, action[0], action[1], observation[0], observation[1]
        );
    }

    if let Some(error) = backend.error() {
        eprintln!("backend error: {}", error);
    }
    Ok(())
}
