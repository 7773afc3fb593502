//! # 单调时钟
//!
//! 所有时间序列共用同一个进程级单调时间原点，因此不同序列的时间戳可以直接比较。

use crate::TimeStamp;
use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// 进程级时间原点（首次调用时确定）
fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

/// 当前单调时间（毫秒）
///
/// 相对进程级时间原点，保证单调不减。
pub fn current_time_ms() -> TimeStamp {
    instant_to_ms(Instant::now())
}

/// 将 `Instant` 转换为毫秒时间戳
///
/// 早于时间原点的 `Instant` 返回 0。
pub fn instant_to_ms(instant: Instant) -> TimeStamp {
    instant.saturating_duration_since(epoch()).as_secs_f64() * 1000.0
}
