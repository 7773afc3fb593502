//! 后端生命周期状态
//!
//! `Created → Initialized → Running → ShuttingDown → Stopped`

use std::sync::atomic::{AtomicU8, Ordering};

/// 后端生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BackendState {
    /// 已创建，驱动尚未初始化
    #[default]
    Created = 0,
    /// 驱动已初始化，控制线程尚未启动
    Initialized = 1,
    /// 控制线程运行中
    Running = 2,
    /// 已请求关闭或控制循环已终止，等待线程退出
    ShuttingDown = 3,
    /// 控制线程已退出
    Stopped = 4,
}

impl BackendState {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 `Stopped`。
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Initialized,
            2 => Self::Running,
            3 => Self::ShuttingDown,
            _ => Self::Stopped,
        }
    }

    /// 转换为 u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// 后端状态（原子版本，用于线程间共享）
#[derive(Debug)]
pub struct AtomicBackendState {
    inner: AtomicU8,
}

impl AtomicBackendState {
    /// 创建新的原子状态
    pub fn new(state: BackendState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    /// 获取当前状态
    pub fn get(&self) -> BackendState {
        BackendState::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// 设置状态
    pub fn set(&self, state: BackendState) {
        self.inner.store(state.as_u8(), Ordering::Release);
    }

    /// 比较并交换（Compare-and-Swap）
    ///
    /// 仅当当前状态为 `current` 时切换为 `new`，返回是否切换成功。
    pub fn transition(&self, current: BackendState, new: BackendState) -> bool {
        self.inner
            .compare_exchange(
                current.as_u8(),
                new.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for AtomicBackendState {
    fn default() -> Self {
        Self::new(BackendState::default())
    }
}
