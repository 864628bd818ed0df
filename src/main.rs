use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::Level;

use xfconf_profile::cli;
use xfconf_profile::config::{MergeBehavior, DEFAULT_DIST_PROFILE};

/// xfconf-profile
///
/// 管理 Xfce 设置 profile 的命令行工具
#[derive(Parser)]
#[command(name = "xfconf-profile")]
#[command(author, version = env!("APP_VERSION"), about)]
#[command(
    long_about = "Tool for applying, reverting and managing Xfce profiles.\n\
                  Profiles are JSON files mapping xfconf channels to property values."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 应用 profile.json 中的设置
    Apply {
        /// profile 路径
        path: PathBuf,

        /// 合并方式：soft, hard, force（默认取用户配置）
        #[arg(short, long)]
        merge: Option<MergeBehavior>,

        /// 只打印将要执行的操作
        #[arg(long)]
        dry_run: bool,
    },

    /// 把 profile.json 中的属性重置为默认值
    Revert {
        /// profile 路径
        path: PathBuf,

        /// 只打印将要执行的操作
        #[arg(long)]
        dry_run: bool,
    },

    /// 与发行版 profile 同步
    Sync {
        /// 发行版 profile 路径
        #[arg(short, long, default_value = DEFAULT_DIST_PROFILE)]
        profile: PathBuf,

        /// 合并方式：soft, hard, force（默认取用户配置）
        #[arg(short, long)]
        merge: Option<MergeBehavior>,

        /// 只打印将要执行的操作，不修改同步状态
        #[arg(long)]
        dry_run: bool,

        /// 自动调用（用户配置 sync.auto 为 false 时跳过）
        #[arg(long)]
        auto: bool,
    },

    /// 录制 xfconf 变更，Ctrl+C 停止
    Record {
        /// 停止时写入 profile 的路径
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 轮询间隔（毫秒）
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,
    },

    /// 查询属性的发行版默认值（不存在时退出码 127）
    GetDefault {
        /// channel 名
        channel: String,

        /// 属性路径
        property: String,
    },

    /// 显示版本信息
    Version,
}

// ═══════════════════════════════════════════════════════════════════
// 日志
// ═══════════════════════════════════════════════════════════════════

/// 根据 LOG_LEVEL 安装日志订阅器，输出到 stderr
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{}", "Failed to install log subscriber".yellow());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Main
// ═══════════════════════════════════════════════════════════════════

fn run(command: Commands) -> anyhow::Result<i32> {
    match command {
        Commands::Apply {
            path,
            merge,
            dry_run,
        } => cli::apply_command(&path, merge, dry_run)?,
        Commands::Revert { path, dry_run } => cli::revert_command(&path, dry_run)?,
        Commands::Sync {
            profile,
            merge,
            dry_run,
            auto,
        } => cli::sync_command(&profile, merge, dry_run, auto)?,
        Commands::Record {
            output,
            interval_ms,
        } => cli::record_command(output.as_deref(), Duration::from_millis(interval_ms))?,
        Commands::GetDefault { channel, property } => {
            if cli::get_default_command(&channel, &property)?.is_none() {
                return Ok(127);
            }
        }
        Commands::Version => cli::version_command(),
    }
    Ok(0)
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}
