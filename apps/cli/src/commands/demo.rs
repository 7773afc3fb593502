//! 演示命令
//!
//! 用 2 自由度裁剪驱动启动后端，前端逐步提交动作并打印同一索引的观测。

use anyhow::{Context, Result, bail};
use clap::Args;
use robot_interfaces::demo::ClipDriver;
use robot_interfaces::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// 演示轨迹：一个自由度 200 → 300，另一个 300 → 200，循环往复
const TRAJECTORY_START: i32 = 200;
const TRAJECTORY_LENGTH: u64 = 101;

/// 演示命令参数
#[derive(Args, Debug)]
pub struct DemoCommand {
    /// 后端配置文件（TOML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 提交的动作数
    #[arg(short, long, default_value_t = TRAJECTORY_LENGTH)]
    pub steps: u64,

    /// 记录到二进制日志文件
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// 非实时模式（覆盖配置文件）
    #[arg(long)]
    pub non_realtime: bool,
}

impl DemoCommand {
    /// 演示的默认配置：每步约 2ms（两个自由度各 1ms）
    fn default_config() -> BackendConfig {
        BackendConfig::new(0.005, 0.01)
    }

    fn load_config(&self) -> Result<BackendConfig> {
        let mut config = match &self.config {
            Some(path) => BackendConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Self::default_config(),
        };
        if self.non_realtime {
            config.is_realtime = false;
        }
        Ok(config)
    }

    /// 执行演示
    pub fn execute(&self) -> Result<()> {
        let config = self.load_config()?;
        info!(
            "Starting demo: {} steps, realtime={}",
            self.steps, config.is_realtime
        );

        // Ctrl-C 时提前结束
        let running = Arc::new(AtomicBool::new(true));
        let r = running.clone();
        ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl-C handler")?;

        let data = Arc::new(RobotData::default());

        let mut logger = match &self.log {
            Some(_) => {
                let mut logger = RobotLogger::new(data.clone());
                logger.start()?;
                Some(logger)
            },
            None => None,
        };

        let mut backend = RobotBackend::new(ClipDriver::new(), data.clone(), config)?;
        backend.initialize()?;

        let frontend = RobotFrontend::new(data);

        for step in 0..self.steps {
            if !running.load(Ordering::SeqCst) {
                warn!("Interrupted after {} steps", step);
                break;
            }

            let value = TRAJECTORY_START + (step % TRAJECTORY_LENGTH) as i32;
            let action = [value, 500 - value];
            let index = frontend.append_desired_action(action);

            let observation = match frontend.get_observation(index) {
                Ok(observation) => observation,
                Err(e) => match backend.error() {
                    Some(backend_error) => bail!("Backend stopped at step {}: {}", index, backend_error),
                    None => return Err(e.into()),
                },
            };

            println!(
                "value: {} | action: {} {} observation: {} {}",
                value, action[0], action[1], observation[0], observation[1]
            );
        }

        backend.request_shutdown();
        let reason = backend.wait_until_terminated()?;
        info!("Backend terminated: {:?}", reason);

        if let (Some(logger), Some(path)) = (logger.as_mut(), &self.log) {
            logger.stop()?;
            logger
                .write_file(path)
                .with_context(|| format!("Failed to write log to {}", path.display()))?;
            println!("Wrote {} steps to {}", logger.len(), path.display());
        }

        if let Some(error) = reason.error() {
            bail!("Backend failed: {}", error);
        }
        Ok(())
    }
}
