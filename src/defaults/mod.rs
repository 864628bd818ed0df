//! 发行版默认值解析
//!
//! xfconf-query 无法直接查询某个属性的默认值。这里在一个与用户会话隔离的
//! D-Bus session 中启动一次性的 xfconfd，让它以发行版提供的配置目录
//! （/usr/etc/xdg，非 atomic 发行版为 /etc/xdg）为 XDG_CONFIG_HOME，
//! 然后在该 session 内执行 xfconf-query。
//!
//! # 搜索优先级
//!
//! 配置目录：
//! 1. `XFCONF_PROFILE_END_TO_END_TEST` 已设置时使用 `<cwd>/../etc/xdg`
//! 2. `/usr/etc/xdg`
//! 3. `/etc/xdg`
//!
//! xfconfd：
//! 1. 环境变量 `XFCONF_PROFILE_XFCONFD`
//! 2. 常见发行版安装位置（见 [`XFCONFD_CANDIDATES`]）

pub mod session;

pub use session::{SessionState, XfconfdSession, RESOLVE_TIMEOUT};

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::debug;

use crate::error::XfconfError;
use crate::utils::{dir_exists, file_exists, quote_shell};
use crate::xfconf::{PropertyQueries, PropertyValues};

/// 发行版默认配置目录（按优先级）
pub const CONFIG_DIR_CANDIDATES: &[&str] = &["/usr/etc/xdg", "/etc/xdg"];

/// xfconfd 常见安装位置（按优先级）
pub const XFCONFD_CANDIDATES: &[&str] = &[
    "/usr/lib64/xfce4/xfconf/xfconfd",
    "/usr/lib/xfce4/xfconf/xfconfd",
    "/usr/lib/x86_64-linux-gnu/xfce4/xfconf/xfconfd",
    "/usr/libexec/xfce4/xfconf/xfconfd",
];

/// 端到端测试标记
pub const END_TO_END_ENV: &str = "XFCONF_PROFILE_END_TO_END_TEST";

/// xfconfd 路径覆盖
pub const XFCONFD_ENV: &str = "XFCONF_PROFILE_XFCONFD";

/// 默认值来源
pub trait DefaultSource {
    /// 解析一组属性的默认值；不存在的属性为空串
    fn resolve(&self, queries: &PropertyQueries) -> Result<PropertyValues>;
}

/// 基于隔离 xfconfd 会话的默认值来源
#[derive(Debug, Clone, Copy, Default)]
pub struct DistroDefaults;

impl DistroDefaults {
    pub fn new() -> Self {
        Self
    }

    /// 定位发行版默认配置目录
    pub fn locate_config_dir() -> Result<PathBuf> {
        let end_to_end_cwd = match env::var_os(END_TO_END_ENV) {
            Some(_) => Some(env::current_dir().context("Cannot get working directory")?),
            None => None,
        };
        let candidates: Vec<PathBuf> = CONFIG_DIR_CANDIDATES.iter().map(PathBuf::from).collect();

        config_dir_from(end_to_end_cwd.as_deref(), &candidates)
    }

    /// 定位 xfconfd 可执行文件
    pub fn locate_xfconfd() -> Result<PathBuf> {
        let candidates: Vec<PathBuf> = XFCONFD_CANDIDATES.iter().map(PathBuf::from).collect();
        xfconfd_from(env::var_os(XFCONFD_ENV).map(PathBuf::from), &candidates)
    }
}

impl DefaultSource for DistroDefaults {
    fn resolve(&self, queries: &PropertyQueries) -> Result<PropertyValues> {
        if queries.values().all(Vec::is_empty) {
            return Ok(empty_results(queries));
        }

        let xfconfd = Self::locate_xfconfd()?;
        let config_dir = Self::locate_config_dir()?;
        debug!(XDG_CONFIG_HOME = %config_dir.display(), "Using config dir");

        resolve_with_command(
            session_command(&xfconfd, &config_dir),
            queries,
            RESOLVE_TIMEOUT,
        )
    }
}

/// 使用发行版默认配置解析一组属性的默认值
pub fn resolve_defaults(queries: &PropertyQueries) -> Result<PropertyValues> {
    DistroDefaults::new().resolve(queries)
}

/// 构造会话命令：后台启动 xfconfd，等待其就绪后切换为交互 shell
pub fn session_command(xfconfd: &Path, config_dir: &Path) -> Command {
    let script = format!(
        "XDG_CONFIG_HOME={} {} & while ! xfconf-query --list >/dev/null 2>&1; do sleep 0.05; done; exec sh",
        quote_shell(&config_dir.to_string_lossy()),
        quote_shell(&xfconfd.to_string_lossy())
    );

    debug!(cmd = %script, "Launching xfconfd in its own dbus session");

    let mut command = Command::new("dbus-run-session");
    command.args(["--", "sh", "-c", &script]);
    command
}

/// 用给定的会话命令解析默认值
pub fn resolve_with_command(
    command: Command,
    queries: &PropertyQueries,
    timeout: Duration,
) -> Result<PropertyValues> {
    let mut session = XfconfdSession::new(timeout);
    session.start(command)?;

    let mut results = PropertyValues::new();
    for (channel, properties) in queries {
        let values = results.entry(channel.clone()).or_default();
        for property in properties {
            let value = session.query(channel, property)?;
            values.insert(property.clone(), value);
        }
    }

    session.close()?;
    Ok(results)
}

fn first_existing_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| dir_exists(p)).cloned()
}

/// 端到端测试时使用 `<cwd>/../etc/xdg`，否则取第一个存在的候选目录
fn config_dir_from(end_to_end_cwd: Option<&Path>, candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(cwd) = end_to_end_cwd {
        return Ok(cwd.join("..").join("etc").join("xdg"));
    }

    first_existing_dir(candidates).ok_or_else(|| {
        XfconfError::Environment("no xdg directories available - is Xfce installed?".to_string())
            .into()
    })
}

/// 覆盖路径优先（必须存在），否则取第一个存在的候选文件
fn xfconfd_from(override_path: Option<PathBuf>, candidates: &[PathBuf]) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if file_exists(&path) {
            return Ok(path);
        }
        return Err(XfconfError::Environment(format!(
            "{} points to a missing xfconfd: {}",
            XFCONFD_ENV,
            path.display()
        ))
        .into());
    }

    candidates.iter().find(|p| file_exists(p)).cloned().ok_or_else(|| {
        let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
        XfconfError::Environment(format!("no xfconfd found (searched {})", searched.join(", ")))
            .into()
    })
}

fn empty_results(queries: &PropertyQueries) -> PropertyValues {
    queries
        .keys()
        .map(|channel| (channel.clone(), Default::default()))
        .collect()
}
