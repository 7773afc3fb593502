//! 有界时间序列
//!
//! 固定容量的环形历史缓冲区，每个元素带有单调递增的 [`TimeIndex`] 和写入时刻的时间戳。
//!
//! # 并发模型
//!
//! - 每个序列一把 `Mutex` + 一个 `Condvar`（Monitor 模式），序列之间不共享锁
//! - `append` 从不阻塞，写入后唤醒所有等待者
//! - `get` 等读取操作在索引尚未写入时阻塞在 `Condvar` 上（不轮询）
//! - 等待谓词每次唤醒都检查三件事：索引已可用、索引已被淘汰、生产者已关闭

use crate::clock::current_time_ms;
use crate::error::TimeseriesError;
use crate::{TimeIndex, TimeStamp};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

/// 时间序列操作结果
pub type Result<T> = std::result::Result<T, TimeseriesError>;

/// 环形缓冲区中的单个元素
#[derive(Debug, Clone)]
struct Element<T> {
    timestamp_ms: TimeStamp,
    value: T,
}

/// 索引在缓冲区中的位置
enum Slot {
    /// 已写入且仍在窗口内（缓冲区下标）
    Present(usize),
    /// 已被淘汰（当前最老索引）
    Evicted(TimeIndex),
    /// 尚未写入
    Pending,
}

/// 受锁保护的内部状态
struct Inner<T> {
    buffer: VecDeque<Element<T>>,
    /// 下一次 `append` 将分配的索引（= newest + 1）
    next_index: TimeIndex,
    is_shut_down: bool,
}

impl<T> Inner<T> {
    fn oldest_index(&self) -> Option<TimeIndex> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.next_index - self.buffer.len() as TimeIndex)
        }
    }

    fn newest_index(&self) -> Option<TimeIndex> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.next_index - 1)
        }
    }

    fn locate(&self, index: TimeIndex) -> Slot {
        if index >= self.next_index {
            return Slot::Pending;
        }
        // next_index > 0 且 index < next_index，因此缓冲区非空
        let oldest = self.next_index - self.buffer.len() as TimeIndex;
        if index < oldest {
            Slot::Evicted(oldest)
        } else {
            Slot::Present((index - oldest) as usize)
        }
    }
}

/// 有界、带时间戳、按索引寻址的历史缓冲区
///
/// 单生产者（每个序列只有一个写入方），多读者。
///
/// # Example
///
/// ```
/// use robot_timeseries::Timeseries;
///
/// let series = Timeseries::new(2).unwrap();
/// assert_eq!(series.append("a"), 0);
/// assert_eq!(series.append("b"), 1);
/// assert_eq!(series.append("c"), 2);
///
/// assert_eq!(series.length(), 2);
/// assert_eq!(series.get(2).unwrap(), "c");
/// assert!(series.get(0).is_err()); // 已被淘汰
/// ```
pub struct Timeseries<T> {
    inner: Mutex<Inner<T>>,
    cond: Condvar,
    history_length: usize,
}

impl<T> std::fmt::Debug for Timeseries<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Timeseries")
            .field("history_length", &self.history_length)
            .field("length", &inner.buffer.len())
            .field("newest_index", &inner.newest_index())
            .field("is_shut_down", &inner.is_shut_down)
            .finish()
    }
}

impl<T> Timeseries<T> {
    /// 创建新的时间序列
    ///
    /// # 错误
    /// - `TimeseriesError::InvalidHistoryLength`: `history_length` 为 0
    pub fn new(history_length: usize) -> Result<Self> {
        if history_length == 0 {
            return Err(TimeseriesError::InvalidHistoryLength(history_length));
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                buffer: VecDeque::with_capacity(history_length),
                next_index: 0,
                is_shut_down: false,
            }),
            cond: Condvar::new(),
            history_length,
        })
    }

    /// 追加一个元素，返回分配的索引
    ///
    /// 缓冲区已满时静默淘汰最老的元素。写入后唤醒所有等待的读者。
    pub fn append(&self, value: T) -> TimeIndex {
        let index = {
            let mut inner = self.inner.lock();
            self.push_locked(&mut inner, value)
        };

        self.cond.notify_all();
        index
    }

    /// 仅当下一个索引恰好是 `expected` 时追加
    ///
    /// 检查与写入在同一把锁内完成。若其他生产者已经写入了 `expected`，
    /// 原样返回 `Err(value)`，序列不变。
    pub fn append_at(&self, expected: TimeIndex, value: T) -> std::result::Result<TimeIndex, T> {
        let index = {
            let mut inner = self.inner.lock();
            if inner.next_index != expected {
                return Err(value);
            }
            self.push_locked(&mut inner, value)
        };

        self.cond.notify_all();
        Ok(index)
    }

    fn push_locked(&self, inner: &mut Inner<T>, value: T) -> TimeIndex {
        if inner.buffer.len() == self.history_length {
            inner.buffer.pop_front();
        }
        inner.buffer.push_back(Element {
            timestamp_ms: current_time_ms(),
            value,
        });
        let index = inner.next_index;
        inner.next_index += 1;
        index
    }

    /// 最新索引（非阻塞），空序列返回 `None`
    pub fn newest_index(&self) -> Option<TimeIndex> {
        self.inner.lock().newest_index()
    }

    /// 仍在窗口内的最老索引（非阻塞），空序列返回 `None`
    pub fn oldest_index(&self) -> Option<TimeIndex> {
        self.inner.lock().oldest_index()
    }

    /// 当前元素个数（≤ `history_length`）
    pub fn length(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.inner.lock().buffer.is_empty()
    }

    /// 容量
    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// 最新元素的时间戳（毫秒），空序列返回 `None`
    pub fn newest_timestamp_ms(&self) -> Option<TimeStamp> {
        self.inner.lock().buffer.back().map(|e| e.timestamp_ms)
    }

    /// 读取指定索引的时间戳（毫秒）
    ///
    /// 阻塞与淘汰语义与 [`get`](Self::get) 相同。
    pub fn timestamp_ms(&self, index: TimeIndex) -> Result<TimeStamp> {
        self.wait_and_read(index, None, |e| e.timestamp_ms)
    }

    /// 等待直到指定索引被写入（不复制元素）
    ///
    /// 已被淘汰的索引视为"已写入"，直接返回 `Ok(())`。
    pub fn wait_for_index(&self, index: TimeIndex) -> Result<()> {
        self.wait_for_index_inner(index, None)
    }

    /// 带超时的 [`wait_for_index`](Self::wait_for_index)
    pub fn wait_for_index_timeout(&self, index: TimeIndex, timeout: Duration) -> Result<()> {
        self.wait_for_index_inner(index, Some(Instant::now() + timeout))
    }

    /// 关闭序列：此后不会再有新的写入
    ///
    /// 唤醒所有阻塞中的读者，仍未就绪的索引返回 `ProducerShutDown`。
    /// 关闭后 `append` 仍然可以调用（永不失败），但没有读者会再等待。
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock();
            if inner.is_shut_down {
                return;
            }
            inner.is_shut_down = true;
            trace!(
                "Timeseries shut down at newest index {:?}",
                inner.newest_index()
            );
        }
        self.cond.notify_all();
    }

    /// 是否已关闭
    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().is_shut_down
    }

    fn wait_for_index_inner(&self, index: TimeIndex, deadline: Option<Instant>) -> Result<()> {
        match self.wait_and_read(index, deadline, |_| ()) {
            Err(TimeseriesError::IndexEvicted { .. }) => Ok(()),
            other => other,
        }
    }

    /// 核心等待逻辑
    ///
    /// 每次被唤醒后重新检查：可用 → 读取；淘汰 → `IndexEvicted`；
    /// 关闭 → `ProducerShutDown`；超时 → `Timeout`。
    fn wait_and_read<R>(
        &self,
        index: TimeIndex,
        deadline: Option<Instant>,
        read: impl FnOnce(&Element<T>) -> R,
    ) -> Result<R> {
        let mut inner = self.inner.lock();
        loop {
            match inner.locate(index) {
                Slot::Present(pos) => return Ok(read(&inner.buffer[pos])),
                Slot::Evicted(oldest) => {
                    return Err(TimeseriesError::IndexEvicted { index, oldest });
                },
                Slot::Pending => {
                    if inner.is_shut_down {
                        return Err(TimeseriesError::ProducerShutDown { index });
                    }
                    if !self.wait(&mut inner, deadline) {
                        return Err(TimeseriesError::Timeout { index });
                    }
                },
            }
        }
    }

    /// 在 `Condvar` 上等待，超时返回 `false`
    fn wait(&self, inner: &mut MutexGuard<'_, Inner<T>>, deadline: Option<Instant>) -> bool {
        match deadline {
            None => {
                self.cond.wait(inner);
                true
            },
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return false;
                }
                // 超时后仍返回 true，由调用方再检查一次状态，下一轮再判定超时
                self.cond.wait_until(inner, deadline);
                true
            },
        }
    }
}

impl<T: Clone> Timeseries<T> {
    /// 读取指定索引的元素
    ///
    /// - 索引在窗口内：立即返回
    /// - 索引在未来：阻塞直到写入
    /// - 索引已被淘汰：`IndexEvicted`
    /// - 等待期间序列被关闭：`ProducerShutDown`
    pub fn get(&self, index: TimeIndex) -> Result<T> {
        self.wait_and_read(index, None, |e| e.value.clone())
    }

    /// 带超时的 [`get`](Self::get)
    ///
    /// 超过 `timeout` 仍未写入时返回 `Timeout`。
    pub fn get_timeout(&self, index: TimeIndex, timeout: Duration) -> Result<T> {
        self.wait_and_read(index, Some(Instant::now() + timeout), |e| {
            e.value.clone()
        })
    }

    /// 最新元素（非阻塞）
    ///
    /// # 错误
    /// - `TimeseriesError::Empty`: 序列为空
    pub fn newest_element(&self) -> Result<T> {
        self.inner
            .lock()
            .buffer
            .back()
            .map(|e| e.value.clone())
            .ok_or(TimeseriesError::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::{Element, Timeseries};
    use crate::TimeIndex;
    use crate::clock::current_time_ms;
    use crate::error::TimeseriesError;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_zero_history_length_is_rejected() {
        let result = Timeseries::<i32>::new(0);
        assert_eq!(
            result.err(),
            Some(TimeseriesError::InvalidHistoryLength(0))
        );
    }

    #[test]
    fn test_empty_series() {
        let series = Timeseries::<i32>::new(4).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.length(), 0);
        assert_eq!(series.newest_index(), None);
        assert_eq!(series.oldest_index(), None);
        assert_eq!(series.newest_timestamp_ms(), None);
        assert_eq!(series.newest_element(), Err(TimeseriesError::Empty));
    }

    #[test]
    fn test_append_assigns_consecutive_indices() {
        let series = Timeseries::new(10).unwrap();
        for i in 0..5 {
            assert_eq!(series.append(i * 10), i as TimeIndex);
        }
        assert_eq!(series.newest_index(), Some(4));
        assert_eq!(series.oldest_index(), Some(0));
        assert_eq!(series.newest_element().unwrap(), 40);
        assert_eq!(series.get(2).unwrap(), 20);
    }

    #[test]
    fn test_append_at_only_fills_expected_index() {
        let series = Timeseries::new(4).unwrap();
        assert_eq!(series.append_at(0, 1), Ok(0));
        assert_eq!(series.append(2), 1);

        // 索引 1 已被其他生产者占用，值原样退回
        assert_eq!(series.append_at(1, 99), Err(99));
        assert_eq!(series.append_at(3, 99), Err(99));
        assert_eq!(series.newest_index(), Some(1));
        assert_eq!(series.get(1).unwrap(), 2);

        assert_eq!(series.append_at(2, 3), Ok(2));
        assert_eq!(series.newest_element().unwrap(), 3);
    }

    #[test]
    fn test_append_at_races_with_append() {
        // 两个生产者争抢同一索引：恰好一个成功，且不会把值挤到下一个索引
        for round in 0..200 {
            let series = Arc::new(Timeseries::new(8).unwrap());
            let other = series.clone();
            let handle = thread::spawn(move || other.append(1));
            let conditional = series.append_at(0, 2);
            handle.join().unwrap();

            match conditional {
                Ok(0) => {
                    assert_eq!(series.get(0).unwrap(), 2, "round {}", round);
                    assert_eq!(series.get(1).unwrap(), 1, "round {}", round);
                },
                Ok(index) => panic!("unexpected index {} in round {}", index, round),
                Err(value) => {
                    assert_eq!(value, 2);
                    assert_eq!(series.newest_index(), Some(0), "round {}", round);
                    assert_eq!(series.get(0).unwrap(), 1, "round {}", round);
                },
            }
        }
    }

    #[test]
    fn test_eviction() {
        let series = Timeseries::new(3).unwrap();
        for i in 0..10 {
            series.append(i);
        }

        assert_eq!(series.length(), 3);
        assert_eq!(series.oldest_index(), Some(7));
        assert_eq!(series.newest_index(), Some(9));

        for i in 7..10 {
            assert_eq!(series.get(i).unwrap(), i as i32);
        }
        assert_eq!(
            series.get(6),
            Err(TimeseriesError::IndexEvicted {
                index: 6,
                oldest: 7
            })
        );
        assert!(matches!(
            series.timestamp_ms(0),
            Err(TimeseriesError::IndexEvicted { .. })
        ));
    }

    #[test]
    fn test_timestamps_are_non_decreasing() {
        let series = Timeseries::new(100).unwrap();
        for i in 0..50 {
            series.append(i);
        }
        let mut last = series.timestamp_ms(0).unwrap();
        for i in 1..50 {
            let ts = series.timestamp_ms(i).unwrap();
            assert!(ts >= last);
            last = ts;
        }
        assert_eq!(series.newest_timestamp_ms(), Some(last));
    }

    #[test]
    fn test_get_blocks_until_append() {
        let series = Arc::new(Timeseries::new(8).unwrap());
        series.append(0);

        let producer = {
            let series = series.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                series.append(42);
            })
        };

        let start = Instant::now();
        let value = series.get(1).unwrap();
        let elapsed = start.elapsed();

        assert_eq!(value, 42);
        assert!(
            elapsed >= Duration::from_millis(40),
            "get returned too early: {:?}",
            elapsed
        );
        producer.join().unwrap();
    }

    #[test]
    fn test_get_timeout() {
        let series = Timeseries::<i32>::new(8).unwrap();
        let start = Instant::now();
        let result = series.get_timeout(0, Duration::from_millis(20));
        assert_eq!(result, Err(TimeseriesError::Timeout { index: 0 }));
        assert!(start.elapsed() >= Duration::from_millis(20));

        series.append(5);
        assert_eq!(series.get_timeout(0, Duration::from_millis(20)), Ok(5));
    }

    #[test]
    fn test_shutdown_wakes_blocked_readers() {
        let series = Arc::new(Timeseries::<i32>::new(8).unwrap());
        series.append(1);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let series = series.clone();
                thread::spawn(move || series.get(5))
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        series.shutdown();

        for reader in readers {
            assert_eq!(
                reader.join().unwrap(),
                Err(TimeseriesError::ProducerShutDown { index: 5 })
            );
        }

        // 已写入的数据在关闭后仍可读取
        assert_eq!(series.get(0), Ok(1));
        assert!(series.is_shut_down());
    }

    #[test]
    fn test_eviction_while_waiting_is_reported() {
        // 读者等待索引 1，生产者一次性写入多个元素把 1 挤出窗口
        let series = Arc::new(Timeseries::new(2).unwrap());
        series.append(0);

        let gate = Arc::new(AtomicBool::new(false));
        let producer = {
            let series = series.clone();
            let gate = gate.clone();
            thread::spawn(move || {
                while !gate.load(Ordering::Acquire) {
                    thread::yield_now();
                }
                thread::sleep(Duration::from_millis(10));
                let mut inner = series.inner.lock();
                for v in 1..5 {
                    if inner.buffer.len() == series.history_length {
                        inner.buffer.pop_front();
                    }
                    inner.buffer.push_back(Element {
                        timestamp_ms: current_time_ms(),
                        value: v,
                    });
                    inner.next_index += 1;
                }
                drop(inner);
                series.cond.notify_all();
            })
        };

        gate.store(true, Ordering::Release);
        let result = series.get(1);
        assert_eq!(
            result,
            Err(TimeseriesError::IndexEvicted {
                index: 1,
                oldest: 3
            })
        );
        producer.join().unwrap();
    }

    #[test]
    fn test_wait_for_index() {
        let series = Arc::new(Timeseries::new(2).unwrap());
        for i in 0..5 {
            series.append(i);
        }
        // 已淘汰视为已写入
        assert_eq!(series.wait_for_index(0), Ok(()));
        assert_eq!(
            series.wait_for_index_timeout(10, Duration::from_millis(10)),
            Err(TimeseriesError::Timeout { index: 10 })
        );

        let waiter = {
            let series = series.clone();
            thread::spawn(move || series.wait_for_index(5))
        };
        thread::sleep(Duration::from_millis(10));
        series.append(5);
        assert_eq!(waiter.join().unwrap(), Ok(()));
    }

    #[test]
    fn test_concurrent_readers_observe_monotonic_indices() {
        const COUNT: i64 = 2_000;
        let series = Arc::new(Timeseries::new(64).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let series = series.clone();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    let mut index: TimeIndex = 0;
                    while index < COUNT as TimeIndex {
                        match series.get(index) {
                            Ok(value) => {
                                // 元素值等于其索引
                                assert_eq!(value, index as i64);
                                seen.push(index);
                                index += 1;
                            },
                            Err(TimeseriesError::IndexEvicted { oldest, .. }) => {
                                index = oldest;
                            },
                            Err(e) => panic!("unexpected error: {}", e),
                        }
                    }
                    seen
                })
            })
            .collect();

        for i in 0..COUNT {
            assert_eq!(series.append(i), i as TimeIndex);
        }

        for reader in readers {
            let seen = reader.join().unwrap();
            assert!(seen.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(seen.last(), Some(&((COUNT - 1) as TimeIndex)));
        }
    }

    proptest! {
        #[test]
        fn prop_length_and_newest_index(history_length in 1usize..64, appends in 0usize..256) {
            let series = Timeseries::new(history_length).unwrap();
            for i in 0..appends {
                series.append(i);
            }

            prop_assert_eq!(series.length(), appends.min(history_length));
            if appends == 0 {
                prop_assert_eq!(series.newest_index(), None);
            } else {
                let newest = (appends - 1) as TimeIndex;
                prop_assert_eq!(series.newest_index(), Some(newest));

                let length = series.length() as TimeIndex;
                for i in 0..appends as TimeIndex {
                    if i + length > newest {
                        prop_assert_eq!(series.get(i).unwrap(), i as usize);
                    } else {
                        let is_evicted = matches!(
                            series.get(i),
                            Err(TimeseriesError::IndexEvicted { .. })
                        );
                        prop_assert!(is_evicted);
                    }
                }
            }
        }
    }
}
