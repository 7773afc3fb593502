//! 日志命令
//!
//! 查看演示机器人写出的二进制日志

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use robot_interfaces::demo::{ClipAction, ClipObservation};
use robot_interfaces::driver::ErrorStatus;
use robot_interfaces::RobotBinaryLogReader;
use std::path::{Path, PathBuf};

type DemoLogReader = RobotBinaryLogReader<ClipAction, ClipObservation>;

/// 日志子命令
#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// 显示日志概要
    Info(InfoArgs),

    /// 逐条打印日志
    Dump(DumpArgs),
}

/// `log info` 参数
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// 日志文件路径
    pub file: PathBuf,
}

/// `log dump` 参数
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// 日志文件路径
    pub file: PathBuf,

    /// 最多打印的条目数
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl LogCommand {
    /// 执行命令
    pub fn execute(&self) -> Result<()> {
        match self {
            LogCommand::Info(args) => info(&args.file),
            LogCommand::Dump(args) => dump(&args.file, args.limit),
        }
    }
}

fn read_log(path: &Path) -> Result<DemoLogReader> {
    DemoLogReader::from_file(path).with_context(|| format!("Failed to read log {}", path.display()))
}

fn info(path: &Path) -> Result<()> {
    let reader = read_log(path)?;

    println!("File: {}", path.display());
    println!("Entries: {}", reader.len());

    if let (Some(first), Some(last)) = (reader.data.first(), reader.data.last()) {
        println!("Time indices: {} - {}", first.timeindex, last.timeindex);
    }
    if let Some(span) = reader.time_span_ms() {
        println!("Time span: {:.3} ms", span);
    }

    let timing_violations = reader.data.iter().filter(|e| !e.status.timing_ok).count();
    let errors = reader
        .data
        .iter()
        .filter(|e| e.status.error_status != ErrorStatus::NoError)
        .count();
    let max_action_ms = reader
        .data
        .iter()
        .map(|e| e.status.action_duration_ms)
        .fold(0.0_f64, f64::max);

    println!("Timing violations: {}", timing_violations);
    println!("Errors: {}", errors);
    println!("Max action duration: {:.3} ms", max_action_ms);
    Ok(())
}

fn dump(path: &Path, limit: Option<usize>) -> Result<()> {
    let reader = read_log(path)?;
    let limit = limit.unwrap_or(reader.len());

    for entry in reader.data.iter().take(limit) {
        println!(
            "{} t={:.3} desired={:?} applied={:?} observation={:?} source={:?} action={:.3}ms{}",
            entry.timeindex,
            entry.timestamp,
            entry.desired_action,
            entry.applied_action,
            entry.observation,
            entry.status.action_source,
            entry.status.action_duration_ms,
            if entry.status.has_error() {
                format!(" error={}", entry.status.error_message)
            } else {
                String::new()
            }
        );
    }
    Ok(())
}
