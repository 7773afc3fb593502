//! 控制循环模块
//!
//! 后台控制线程的主循环：在驱动与共享数据之间搬运动作和观测，并执行时序检查。
//!
//! # 每步流程（第 `t` 步）
//!
//! 1. 检查关闭请求
//! 2. 选择动作：已提交 → 使用；暂停中 → 中性动作；实时模式 → 重复上一个动作；否则等待提交
//! 3. 采集观测并写入 `observation[t]`（**在执行动作之前**）
//! 4. 执行动作并计时
//! 5. 写入 `applied_action[t]`
//! 6. 写入 `status[t]`
//! 7. 时序违规：实时模式下终止循环，非实时模式下只记录日志

use crate::config::BackendConfig;
use crate::data::RobotData;
use crate::driver::RobotDriver;
use crate::error::{BackendError, TimingViolation};
use crate::state::{AtomicBackendState, BackendState};
use crate::status::{ActionSource, ErrorStatus, Status};
use parking_lot::{Condvar, Mutex};
use robot_timeseries::{TimeIndex, TimeStamp, TimeseriesError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};

/// 等待客户端提交动作时的轮询间隔（用于检查关闭/暂停请求）
pub(crate) const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 控制循环终止原因
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationReason {
    /// 收到关闭请求
    ShutdownRequested,
    /// 达到 `max_number_of_actions`
    MaximumNumberOfActionsReached,
    /// 致命错误（驱动错误、实时模式下的时序违规、首个动作超时等）
    Failed(BackendError),
}

impl TerminationReason {
    /// 致命错误（如果有）
    pub fn error(&self) -> Option<&BackendError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// 是否因错误终止
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// 后端与控制线程共享的状态
pub(crate) struct BackendShared {
    pub(crate) state: AtomicBackendState,
    shutdown_requested: AtomicBool,
    /// 终止原因插槽（控制线程退出前写入）
    termination: Mutex<Option<TerminationReason>>,
    terminated: Condvar,
}

impl BackendShared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicBackendState::new(BackendState::Created),
            shutdown_requested: AtomicBool::new(false),
            termination: Mutex::new(None),
            terminated: Condvar::new(),
        }
    }

    pub(crate) fn request_shutdown(&self) {
        // Release: 控制线程看到 true 时，之前的写入均可见
        self.shutdown_requested.store(true, Ordering::Release);
    }

    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// 写入终止原因并唤醒所有等待者
    pub(crate) fn terminate(&self, reason: TerminationReason) {
        *self.termination.lock() = Some(reason);
        self.terminated.notify_all();
    }

    pub(crate) fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination.lock().clone()
    }

    /// 等待控制循环终止，超时返回 `None`
    pub(crate) fn wait_terminated(&self, deadline: Option<Instant>) -> Option<TerminationReason> {
        let mut termination = self.termination.lock();
        loop {
            if let Some(reason) = termination.as_ref() {
                return Some(reason.clone());
            }
            match deadline {
                None => self.terminated.wait(&mut termination),
                Some(deadline) => {
                    if self
                        .terminated
                        .wait_until(&mut termination, deadline)
                        .timed_out()
                    {
                        return termination.clone();
                    }
                },
            }
        }
    }
}

/// 控制线程入口
///
/// 驱动对象被移动到本线程，只在这里被调用。循环退出后依次：
/// 关闭驱动 → 关闭共享数据（唤醒所有阻塞的客户端） → 写入终止原因。
/// 循环内的 panic（通常来自驱动）被捕获并记为 `BackendError::LoopThread`，
/// 之后的清理照常进行。
pub(crate) fn control_loop<D: RobotDriver>(
    mut driver: D,
    data: Arc<RobotData<D::Action, D::Observation>>,
    config: BackendConfig,
    shared: Arc<BackendShared>,
) {
    if config.is_realtime {
        set_loop_thread_priority();
    }

    let run = panic::catch_unwind(AssertUnwindSafe(|| {
        ControlLoop::new(&mut driver, &data, &config, &shared).run()
    }));
    let reason = run.unwrap_or_else(|payload| {
        TerminationReason::Failed(BackendError::LoopThread(format!(
            "control loop panicked: {}",
            panic_message(payload.as_ref())
        )))
    });

    match &reason {
        TerminationReason::Failed(e) => error!("Control loop terminated with error: {}", e),
        other => info!("Control loop terminated: {:?}", other),
    }

    // 关闭驱动时的 panic 同样捕获
    if panic::catch_unwind(AssertUnwindSafe(|| driver.shutdown())).is_err() {
        error!("Driver panicked during shutdown");
    }
    data.shutdown();
    shared.state.set(BackendState::Stopped);
    shared.terminate(reason);
    trace!("Control loop thread exited");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

/// 设置控制线程优先级（可选 feature）
fn set_loop_thread_priority() {
    #[cfg(feature = "realtime")]
    {
        use thread_priority::*;

        match set_current_thread_priority(ThreadPriority::Max) {
            Ok(_) => {
                info!("Control loop thread priority set to MAX (realtime)");
            },
            Err(e) => {
                warn!(
                    "Failed to set control loop thread priority: {:?}. \
                    On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                    e
                );
            },
        }
    }

    #[cfg(not(feature = "realtime"))]
    trace!("`realtime` feature disabled, control loop runs at default priority");
}

/// 单次控制循环运行的内部状态
struct ControlLoop<'a, D: RobotDriver> {
    driver: &'a mut D,
    data: &'a RobotData<D::Action, D::Observation>,
    config: &'a BackendConfig,
    shared: &'a BackendShared,
    /// 连续重复上一个动作的次数
    action_repetitions: u32,
    /// 上一步观测的时间戳（毫秒）
    previous_observation_ms: Option<TimeStamp>,
    /// 等待第一个动作的截止时间
    first_action_deadline: Option<Instant>,
}

impl<'a, D: RobotDriver> ControlLoop<'a, D> {
    fn new(
        driver: &'a mut D,
        data: &'a RobotData<D::Action, D::Observation>,
        config: &'a BackendConfig,
        shared: &'a BackendShared,
    ) -> Self {
        let first_action_deadline = config
            .first_action_timeout_duration()
            .and_then(|timeout| Instant::now().checked_add(timeout));

        Self {
            driver,
            data,
            config,
            shared,
            action_repetitions: 0,
            previous_observation_ms: None,
            first_action_deadline,
        }
    }

    fn run(&mut self) -> TerminationReason {
        let mut t: TimeIndex = 0;
        loop {
            // Acquire: 看到关闭请求时，必须看到请求方之前的所有写入
            if self.shared.is_shutdown_requested() {
                return TerminationReason::ShutdownRequested;
            }

            if self.config.max_number_of_actions > 0 && t >= self.config.max_number_of_actions {
                return TerminationReason::MaximumNumberOfActionsReached;
            }

            match self.step(t) {
                Ok(true) => t += 1,
                Ok(false) => return TerminationReason::ShutdownRequested,
                Err(e) => return TerminationReason::Failed(e),
            }
        }
    }

    /// 执行第 `t` 步，返回 `Ok(false)` 表示等待动作时收到关闭请求
    fn step(&mut self, t: TimeIndex) -> Result<bool, BackendError> {
        // ============================================================
        // 1. 选择本步动作
        // ============================================================
        let Some((desired, action_source)) = self.select_action(t)? else {
            return Ok(false);
        };

        // ============================================================
        // 2. 采集观测（必须在执行动作之前）
        // ============================================================
        let observation = self.driver.get_latest_observation();
        let observation_index = self.data.observation().append(observation);
        debug_assert_eq!(observation_index, t);
        let observation_ms = self.data.observation().timestamp_ms(observation_index)?;

        let step_interval_ms = self
            .previous_observation_ms
            .replace(observation_ms)
            .map(|previous| observation_ms - previous);
        let mut violation = step_interval_ms.and_then(|interval| self.check_step_interval(t, interval));

        // ============================================================
        // 3. 执行动作（计时）
        // ============================================================
        let started = Instant::now();
        let result = self.driver.apply_action(&desired);
        let action_duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut status = Status {
            action_repetitions: self.action_repetitions,
            action_source,
            action_duration_ms,
            step_interval_ms,
            timing_ok: true,
            ..Default::default()
        };

        let applied = match result {
            Ok(applied) => applied,
            Err(e) => {
                // 不重试：记录到 status 后终止循环
                status.timing_ok = violation.is_none();
                status.set_error(ErrorStatus::DriverError, e.to_string());
                self.data.status().append(status);
                return Err(BackendError::Driver { step: t, source: e });
            },
        };

        let max_action_ms = self.config.max_action_duration_ms();
        if action_duration_ms > max_action_ms {
            violation = Some(TimingViolation::ActionDuration {
                step: t,
                duration_ms: action_duration_ms,
                max_ms: max_action_ms,
            });
        }

        // ============================================================
        // 4. 写入实际动作与状态
        // ============================================================
        self.data.applied_action().append(applied);

        if let Some(violation) = &violation {
            status.timing_ok = false;
            if self.config.is_realtime {
                status.set_error(ErrorStatus::BackendError, violation.to_string());
            }
        }
        self.data.status().append(status);

        trace!(
            "Step {}: source={:?}, action={:.3}ms, interval={:?}",
            t, action_source, action_duration_ms, step_interval_ms
        );

        // ============================================================
        // 5. 时序违规处理
        // ============================================================
        if let Some(violation) = violation {
            if self.config.is_realtime {
                return Err(violation.into());
            }
            warn!("{} (non-realtime mode, continuing)", violation);
        }

        Ok(true)
    }

    /// 选择第 `t` 步的动作，返回 `None` 表示等待期间收到关闭请求
    fn select_action(
        &mut self,
        t: TimeIndex,
    ) -> Result<Option<(D::Action, ActionSource)>, BackendError> {
        loop {
            let desired = self.data.desired_action();

            if desired.newest_index().is_some_and(|newest| newest >= t) {
                self.action_repetitions = 0;
                return Ok(Some((desired.get(t)?, ActionSource::Submitted)));
            }

            if self.data.is_pause_requested() {
                return self
                    .append_synthesized(t, D::Action::default(), ActionSource::Neutral)
                    .map(Some);
            }

            if self.config.is_realtime
                && let Ok(last) = desired.newest_element()
            {
                return self
                    .append_synthesized(t, last, ActionSource::Repeated)
                    .map(Some);
            }

            if !self.wait_for_desired_action(t)? {
                return Ok(None);
            }
        }
    }

    /// 由后端补写第 `t` 步的期望动作（中性动作或重复动作）
    ///
    /// 只在 `t` 仍空缺时写入；若客户端抢先提交了第 `t` 步，丢弃补写的动作，
    /// 本步改用客户端提交的动作。
    fn append_synthesized(
        &mut self,
        t: TimeIndex,
        action: D::Action,
        source: ActionSource,
    ) -> Result<(D::Action, ActionSource), BackendError> {
        let desired = self.data.desired_action();
        if desired.append_at(t, action.clone()).is_err() {
            self.action_repetitions = 0;
            return Ok((desired.get(t)?, ActionSource::Submitted));
        }

        match source {
            ActionSource::Repeated => self.action_repetitions += 1,
            _ => self.action_repetitions = 0,
        }
        Ok((action, source))
    }

    /// 等待客户端提交第 `t` 步的动作
    ///
    /// 返回 `Ok(true)` 表示应重新选择动作（已提交或收到暂停请求），
    /// `Ok(false)` 表示收到关闭请求。
    fn wait_for_desired_action(&self, t: TimeIndex) -> Result<bool, BackendError> {
        let desired = self.data.desired_action();
        loop {
            if self.shared.is_shutdown_requested() {
                return Ok(false);
            }
            if self.data.is_pause_requested() {
                return Ok(true);
            }
            if desired.is_empty()
                && let Some(deadline) = self.first_action_deadline
                && Instant::now() >= deadline
            {
                return Err(BackendError::FirstActionTimeout {
                    timeout_s: self.config.first_action_timeout_s,
                });
            }

            match desired.wait_for_index_timeout(t, WAIT_POLL_INTERVAL) {
                Ok(()) => return Ok(true),
                Err(TimeseriesError::Timeout { .. }) => continue,
                Err(TimeseriesError::ProducerShutDown { .. }) => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// 检查步间隔是否在窗口内
    fn check_step_interval(&self, t: TimeIndex, interval_ms: f64) -> Option<TimingViolation> {
        let (min_ms, max_ms) = self.config.inter_action_window_ms();
        if interval_ms < min_ms || interval_ms > max_ms {
            Some(TimingViolation::InterActionDuration {
                step: t,
                duration_ms: interval_ms,
                min_ms,
                max_ms,
            })
        } else {
            None
        }
    }
}
