//! 后端 API 模块
//!
//! 提供对外的 [`RobotBackend`]，封装控制线程的生命周期和终止原因。

use crate::config::BackendConfig;
use crate::control_loop::{BackendShared, TerminationReason, control_loop};
use crate::data::RobotData;
use crate::driver::RobotDriver;
use crate::error::BackendError;
use crate::state::BackendState;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// 控制线程退出等待时间（Drop 时使用）
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// 尚未交给控制线程的驱动
///
/// 线程未能启动时闭包连同本对象一起被丢弃，析构时关闭已初始化的驱动。
struct PendingDriver<D: RobotDriver>(Option<D>);

impl<D: RobotDriver> PendingDriver<D> {
    fn into_inner(mut self) -> Option<D> {
        self.0.take()
    }
}

impl<D: RobotDriver> Drop for PendingDriver<D> {
    fn drop(&mut self) {
        if let Some(mut driver) = self.0.take() {
            info!("Shutting down driver that never reached the control loop");
            driver.shutdown();
        }
    }
}

/// 机器人后端（控制循环的所有者）
///
/// - `initialize()` 初始化驱动并启动控制线程
/// - 控制线程是 `applied_action` / `observation` / `status` 的唯一写入方
/// - Drop 时请求关闭、关闭共享数据（唤醒所有阻塞的客户端）并等待线程退出
///
/// # Example
///
/// ```no_run
/// use robot_driver::{BackendConfig, RobotBackend, RobotData, RobotDriver};
/// use std::sync::Arc;
///
/// # fn example<D: RobotDriver>(driver: D) -> Result<(), Box<dyn std::error::Error>> {
/// let data = Arc::new(RobotData::default());
/// let mut backend = RobotBackend::new(driver, data.clone(), BackendConfig::default())?;
/// backend.initialize()?;
/// // ... 客户端通过 data 提交动作、读取观测 ...
/// # Ok(())
/// # }
/// ```
pub struct RobotBackend<D: RobotDriver> {
    /// 驱动（`initialize()` 时移动到控制线程）
    driver: Option<D>,
    /// 共享数据
    data: Arc<RobotData<D::Action, D::Observation>>,
    /// 配置
    config: BackendConfig,
    /// 与控制线程共享的状态
    shared: Arc<BackendShared>,
    /// 控制线程句柄（Drop 时 join）
    loop_thread: Option<JoinHandle<()>>,
}

impl<D: RobotDriver> RobotBackend<D> {
    /// 创建新的后端（不启动控制线程）
    ///
    /// # 错误
    /// - `BackendError::InvalidConfig`: 配置校验失败
    pub fn new(
        driver: D,
        data: Arc<RobotData<D::Action, D::Observation>>,
        config: BackendConfig,
    ) -> Result<Self, BackendError> {
        config.validate()?;

        Ok(Self {
            driver: Some(driver),
            data,
            config,
            shared: Arc::new(BackendShared::new()),
            loop_thread: None,
        })
    }

    /// 初始化驱动并启动控制线程
    ///
    /// # 错误
    /// - `BackendError::AlreadyInitialized`: 重复调用
    /// - `BackendError::DriverInit`: 驱动初始化失败（可重试）
    /// - `BackendError::LoopThread`: 创建线程失败（驱动随即被关闭，状态变为 `Stopped`）
    pub fn initialize(&mut self) -> Result<(), BackendError> {
        if self.shared.state.get() != BackendState::Created {
            return Err(BackendError::AlreadyInitialized);
        }
        let Some(mut driver) = self.driver.take() else {
            return Err(BackendError::AlreadyInitialized);
        };

        if let Err(e) = driver.initialize() {
            error!("Driver initialization failed: {}", e);
            self.driver = Some(driver);
            return Err(BackendError::DriverInit(e));
        }
        self.shared.state.set(BackendState::Initialized);

        let data = self.data.clone();
        let config = self.config.clone();
        let shared = self.shared.clone();

        let pending = PendingDriver(Some(driver));
        let spawned = std::thread::Builder::new()
            .name("robot-backend".to_string())
            .spawn(move || {
                if let Some(driver) = pending.into_inner() {
                    control_loop(driver, data, config, shared);
                }
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                // 驱动已随闭包关闭，后端不可再用
                error!("Failed to spawn control loop thread: {}", e);
                self.data.shutdown();
                self.shared.state.set(BackendState::Stopped);
                return Err(BackendError::LoopThread(e.to_string()));
            },
        };

        self.loop_thread = Some(handle);
        // 控制线程可能已经因错误退出（状态已为 Stopped），此时不覆盖
        self.shared.state.transition(BackendState::Initialized, BackendState::Running);

        info!(
            "Backend started (realtime: {}, max action: {:.3}ms, inter-action window: {:?}ms)",
            self.config.is_realtime,
            self.config.max_action_duration_ms(),
            self.config.inter_action_window_ms()
        );
        Ok(())
    }

    /// 请求暂停
    ///
    /// 控制循环在下一步停止重复上一个动作，改为执行中性动作（`Action::default()`），
    /// 直到客户端提交新的动作。
    pub fn pause(&self) {
        self.data.request_pause();
    }

    /// 请求关闭控制循环（不等待）
    pub fn request_shutdown(&self) {
        self.shared.request_shutdown();
        self.shared
            .state
            .transition(BackendState::Running, BackendState::ShuttingDown);
    }

    /// 当前生命周期状态
    pub fn state(&self) -> BackendState {
        self.shared.state.get()
    }

    /// 控制循环是否在运行
    pub fn is_running(&self) -> bool {
        self.state() == BackendState::Running
    }

    /// 阻塞直到控制循环终止
    ///
    /// # 错误
    /// - `BackendError::NotInitialized`: 控制线程尚未启动
    pub fn wait_until_terminated(&self) -> Result<TerminationReason, BackendError> {
        self.ensure_started()?;
        self.shared
            .wait_terminated(None)
            .ok_or_else(|| BackendError::LoopThread("termination reason missing".to_string()))
    }

    /// 带超时的 [`wait_until_terminated`](Self::wait_until_terminated)
    ///
    /// 超时返回 `Ok(None)`。
    pub fn wait_until_terminated_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<TerminationReason>, BackendError> {
        self.ensure_started()?;
        Ok(self.shared.wait_terminated(Some(Instant::now() + timeout)))
    }

    /// 终止原因（循环仍在运行时为 `None`）
    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.shared.termination_reason()
    }

    /// 致命错误（终止错误插槽）
    pub fn error(&self) -> Option<BackendError> {
        self.termination_reason()
            .and_then(|reason| reason.error().cloned())
    }

    /// 共享数据
    pub fn robot_data(&self) -> &Arc<RobotData<D::Action, D::Observation>> {
        &self.data
    }

    /// 配置
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn ensure_started(&self) -> Result<(), BackendError> {
        if self.loop_thread.is_none() {
            return Err(BackendError::NotInitialized);
        }
        Ok(())
    }
}

impl<D: RobotDriver> Drop for RobotBackend<D> {
    fn drop(&mut self) {
        // 通知控制线程退出
        self.request_shutdown();

        // 先关闭共享数据：即使驱动调用卡住，阻塞中的客户端也能被唤醒
        self.data.shutdown();

        // 终止原因是控制线程退出前最后写入的；超时则分离线程
        if let Some(handle) = self.loop_thread.take() {
            let deadline = Instant::now() + JOIN_TIMEOUT;
            match self.shared.wait_terminated(Some(deadline)) {
                Some(_) => {
                    if handle.join().is_err() {
                        error!("Control loop thread panicked after termination");
                    }
                },
                None => error!(
                    "Control loop thread failed to shut down within {:?}, detaching",
                    JOIN_TIMEOUT
                ),
            }
        }

        self.shared.state.set(BackendState::Stopped);
    }
}
