//! 日志初始化
//!
//! 通常通过 [`init_logger!`](crate::init_logger) 调用。

use tracing_subscriber::EnvFilter;

/// 初始化全局 tracing subscriber，并把 `log` 记录转发到 tracing
///
/// `RUST_LOG` 存在时优先使用，否则使用 `default_directive`。
/// 重复调用是安全的：已初始化时直接忽略。
pub fn init(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();

    // fmt 的 try_init 可能已经安装了 LogTracer，此时这里会返回错误
    let _ = tracing_log::LogTracer::builder()
        .with_max_level(log::LevelFilter::Trace)
        .init();
}

/// 初始化日志（默认级别 `info`，可通过 `RUST_LOG` 覆盖）
///
/// # Example
///
/// ```
/// robot_interfaces::init_logger!();
/// robot_interfaces::init_logger!("robot_driver=debug,info");
/// ```
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::logging::init("info")
    };
    ($directive:expr) => {
        $crate::logging::init($directive)
    };
}
