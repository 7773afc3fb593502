//! # Robot CLI
//!
//! Command-line interface for robot-interfaces.
//!
//! ```bash
//! # 运行演示机器人（2 自由度裁剪驱动），并记录日志
//! robot-cli demo --steps 500 --log robot.log
//!
//! # 使用 TOML 配置，非实时模式
//! robot-cli demo --config backend.toml --non-realtime
//!
//! # 查看日志
//! robot-cli log info robot.log
//! robot-cli log dump robot.log --limit 20
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{DemoCommand, LogCommand};

/// Robot CLI - 实时机器人接口命令行工具
#[derive(Parser, Debug)]
#[command(name = "robot-cli")]
#[command(about = "Command-line interface for robot-interfaces", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 运行演示机器人
    Demo {
        #[command(flatten)]
        args: DemoCommand,
    },

    /// 查看二进制日志
    #[command(subcommand)]
    Log(LogCommand),
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("robot_cli=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { args } => args.execute(),
        Commands::Log(cmd) => cmd.execute(),
    }
}
