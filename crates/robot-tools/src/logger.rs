//! 后台数据记录器
//!
//! [`RobotLogger`] 在后台线程中跟随 [`RobotData`]，每完成一步就缓存一条
//! [`RobotLogEntry`]，停止后可写入二进制日志文件。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use robot_driver::RobotData;
//! use robot_tools::RobotLogger;
//! use std::sync::Arc;
//!
//! let data = Arc::new(RobotData::<[i32; 2], [i32; 2]>::default());
//! let mut logger = RobotLogger::new(data.clone());
//! logger.start()?;
//! // ... 后端运行 ...
//! logger.stop()?;
//! logger.write_file("robot.log")?;
//! # Ok::<(), robot_tools::LogError>(())
//! ```

use crate::binary_log::RobotBinaryLogWriter;
use crate::entry::RobotLogEntry;
use crate::error::LogError;
use crossbeam_channel::{Sender, TryRecvError, bounded};
use parking_lot::Mutex;
use robot_driver::{ErrorStatus, RobotData};
use robot_timeseries::{TimeIndex, TimeseriesError};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 等待下一步时的轮询间隔（用于检查停止信号）
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 后台数据记录器
pub struct RobotLogger<A, O> {
    data: Arc<RobotData<A, O>>,
    /// 已记录的条目
    entries: Arc<Mutex<Vec<RobotLogEntry<A, O>>>>,
    /// 因记录线程落后而被淘汰、未能记录的步数
    missed_steps: Arc<AtomicU64>,
    /// 停止信号
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl<A, O> RobotLogger<A, O>
where
    A: Clone + Send + Sync + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// 创建记录器（不启动线程）
    pub fn new(data: Arc<RobotData<A, O>>) -> Self {
        Self {
            data,
            entries: Arc::new(Mutex::new(Vec::new())),
            missed_steps: Arc::new(AtomicU64::new(0)),
            stop_tx: None,
            thread: None,
        }
    }

    /// 启动后台记录线程
    ///
    /// 从启动时刻的下一步开始记录（已在历史中的步可以用 [`save_range`] 导出）。
    ///
    /// # 错误
    /// - `LogError::AlreadyStarted`: 线程已在运行
    /// - `LogError::Io`: 创建线程失败
    pub fn start(&mut self) -> Result<(), LogError> {
        if self.thread.is_some() {
            return Err(LogError::AlreadyStarted);
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let data = self.data.clone();
        let entries = self.entries.clone();
        let missed_steps = self.missed_steps.clone();
        let first_index = data.status().newest_index().map_or(0, |newest| newest + 1);

        let handle = std::thread::Builder::new()
            .name("robot-logger".to_string())
            .spawn(move || {
                let mut next = first_index;
                // 收到停止信号后，记录到此索引（不含）为止
                let mut stop_at: Option<TimeIndex> = None;
                loop {
                    if stop_at.is_none() {
                        match stop_rx.try_recv() {
                            Ok(()) | Err(TryRecvError::Disconnected) => {
                                stop_at = Some(data.status().newest_index().map_or(0, |newest| newest + 1));
                            },
                            Err(TryRecvError::Empty) => {},
                        }
                    }
                    if stop_at.is_some_and(|end| next >= end) {
                        break;
                    }

                    match data.status().get_timeout(next, POLL_INTERVAL) {
                        Ok(status) => {
                            if status.error_status == ErrorStatus::DriverError {
                                // 驱动报错的步没有实际动作，控制循环随后终止
                                debug!("Skipping step {} (driver error)", next);
                            } else {
                                match RobotLogEntry::read(&data, next, status) {
                                    Ok(entry) => entries.lock().push(entry),
                                    Err(TimeseriesError::IndexEvicted { oldest, .. }) => {
                                        missed_steps.fetch_add(oldest - next, Ordering::Relaxed);
                                        next = oldest;
                                        continue;
                                    },
                                    Err(e) => {
                                        debug!("Logger stopped reading at step {}: {}", next, e);
                                        break;
                                    },
                                }
                            }
                            next += 1;
                        },
                        Err(TimeseriesError::Timeout { .. }) => {},
                        Err(TimeseriesError::IndexEvicted { oldest, .. }) => {
                            warn!(
                                "Logger fell behind: steps {}..{} were evicted before being recorded",
                                next, oldest
                            );
                            missed_steps.fetch_add(oldest - next, Ordering::Relaxed);
                            next = oldest;
                        },
                        Err(TimeseriesError::ProducerShutDown { .. }) => break,
                        Err(e) => {
                            warn!("Logger thread error: {}", e);
                            break;
                        },
                    }
                }
                debug!("Logger thread exited at step {}", next);
            })?;

        self.stop_tx = Some(stop_tx);
        self.thread = Some(handle);
        info!("Robot logger started at step {}", first_index);
        Ok(())
    }

    /// 停止记录线程并等待其退出
    ///
    /// 调用时已完成的步会全部记录后再退出。未启动时直接返回。
    pub fn stop(&mut self) -> Result<(), LogError> {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            handle.join().map_err(|_| LogError::ThreadPanicked)?;
            info!(
                "Robot logger stopped ({} entries, {} missed steps)",
                self.len(),
                self.missed_steps()
            );
        }
        Ok(())
    }

    /// 记录线程是否在运行
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// 已记录的条目数
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// 是否尚未记录任何条目
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// 被淘汰而未能记录的步数
    pub fn missed_steps(&self) -> u64 {
        self.missed_steps.load(Ordering::Relaxed)
    }

    /// 已记录条目的快照
    pub fn entries(&self) -> Vec<RobotLogEntry<A, O>> {
        self.entries.lock().clone()
    }

    /// 清空已记录的条目
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<A, O> RobotLogger<A, O>
where
    A: Clone + Serialize + Send + Sync + 'static,
    O: Clone + Serialize + Send + Sync + 'static,
{
    /// 将已记录的条目写入二进制日志文件
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LogError> {
        RobotBinaryLogWriter::new(self.entries()).write_file(path)
    }
}

impl<A, O> Drop for RobotLogger<A, O> {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            warn!("Logger thread panicked");
        }
    }
}

/// 将历史窗口中 `[start, end]` 范围内已完成的步写入日志文件
///
/// 只读取已存在的数据，不阻塞：范围会被裁剪到当前保留的窗口内，
/// 驱动报错的步（没有实际动作）会被跳过。返回写入的条目数。
///
/// # 参数
/// - `start` / `end`: 闭区间，`end` 为 `None` 时取最新一步
pub fn save_range<A, O, P>(
    data: &RobotData<A, O>,
    path: P,
    start: TimeIndex,
    end: Option<TimeIndex>,
) -> Result<usize, LogError>
where
    A: Clone + Serialize,
    O: Clone + Serialize,
    P: AsRef<Path>,
{
    let mut writer = RobotBinaryLogWriter::default();

    if let (Some(oldest), Some(newest)) = (data.status().oldest_index(), data.status().newest_index()) {
        let first = start.max(oldest);
        let last = end.map_or(newest, |end| end.min(newest));

        for index in first..=last {
            let status = match data.status().get(index) {
                Ok(status) => status,
                // 写入期间被淘汰
                Err(TimeseriesError::IndexEvicted { .. }) => continue,
                Err(e) => return Err(e.into()),
            };
            if status.error_status == ErrorStatus::DriverError {
                continue;
            }
            match RobotLogEntry::read(data, index, status) {
                Ok(entry) => writer.push(entry),
                Err(TimeseriesError::IndexEvicted { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    let count = writer.data.len();
    writer.write_file(path)?;
    Ok(count)
}
