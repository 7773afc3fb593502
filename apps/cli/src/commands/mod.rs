//! 命令定义和实现

pub mod demo;
pub mod log;

pub use demo::DemoCommand;
pub use log::LogCommand;
