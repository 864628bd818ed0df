//! 隔离的 xfconfd 会话
//!
//! 在独立的 `dbus-run-session` 中启动 xfconfd 和一个常驻 shell，
//! 通过 stdin 逐条发送 `xfconf-query`，从 stdout 每条读取一行结果。
//!
//! 状态转换：
//!
//! ```text
//! NotStarted ──start──▶ Ready ──query──▶ AwaitingResponse ──line──▶ Ready
//!                         │                     │
//!                       close               timeout / EOF
//!                         ▼                     ▼
//!                       Closed ◀──terminate─────┘
//! ```
//!
//! 整个会话共享一个截止时间；任何路径上都会结束进程组并回收子进程。

use anyhow::{bail, Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::XfconfError;
use crate::utils::quote_shell;

/// 默认值解析的总超时
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// xfconf-query 对不存在属性的提示
const NOT_FOUND_MARKER: &str = "does not exist on channel";

/// 等待进程退出时的轮询间隔
const WAIT_POLL: Duration = Duration::from_millis(10);

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Ready,
    AwaitingResponse,
    Closed,
}

/// xfconfd 会话
pub struct XfconfdSession {
    state: SessionState,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    lines: Option<Receiver<String>>,
    deadline: Instant,
    timeout: Duration,
}

impl XfconfdSession {
    /// 创建会话，截止时间从此刻开始计算
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: SessionState::NotStarted,
            child: None,
            stdin: None,
            lines: None,
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 启动会话进程（stdin/stdout 会被接管）
    pub fn start(&mut self, mut command: Command) -> Result<()> {
        if self.state != SessionState::NotStarted {
            bail!("xfconfd session already started (state: {:?})", self.state);
        }

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        // 独立进程组，结束时连同 xfconfd 一起清理
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .context("failed to start dbus-run-session")?;

        let stdin = child.stdin.take().context("failed to create stdin pipe")?;
        let stdout = child.stdout.take().context("failed to create stdout pipe")?;

        // 读线程只负责转发，读取超时由 recv_timeout 控制
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        debug!(pid = child.id(), "xfconfd session started");

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.lines = Some(rx);
        self.state = SessionState::Ready;
        Ok(())
    }

    /// 查询一个属性，属性不存在时返回空串
    pub fn query(&mut self, channel: &str, property: &str) -> Result<String> {
        if self.state != SessionState::Ready {
            bail!("xfconfd session not ready (state: {:?})", self.state);
        }

        let command = format!(
            "xfconf-query --channel {} --property {} 2>&1\n",
            quote_shell(channel),
            quote_shell(property)
        );

        if let Err(e) = self.write_line(&command) {
            self.terminate();
            return Err(e).context("failed to write to dbus-run-session");
        }
        self.state = SessionState::AwaitingResponse;

        let remaining = self.deadline.saturating_duration_since(Instant::now());
        let received = match &self.lines {
            Some(rx) => rx.recv_timeout(remaining),
            None => Err(RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(line) => {
                self.state = SessionState::Ready;
                if line.contains(NOT_FOUND_MARKER) {
                    debug!(channel = %channel, property = %property, "No default value");
                    Ok(String::new())
                } else {
                    Ok(line)
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(channel = %channel, property = %property, "xfconfd session timed out");
                self.terminate();
                Err(XfconfError::Timeout(self.timeout).into())
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.terminate();
                Err(XfconfError::Environment(
                    "xfconfd session exited before answering".to_string(),
                )
                .into())
            }
        }
    }

    /// 让 shell 退出并等待进程结束；超过截止时间则强制结束并报超时
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => return Ok(()),
            SessionState::NotStarted => {
                self.state = SessionState::Closed;
                return Ok(());
            }
            _ => {}
        }

        // shell 可能已经退出，写失败不影响后续回收
        let _ = self.write_line("exit\n");
        self.stdin = None;

        loop {
            let Some(child) = self.child.as_mut() else {
                break;
            };
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(%status, "xfconfd session exited");
                    self.kill_group();
                    self.child = None;
                    break;
                }
                Ok(None) if Instant::now() < self.deadline => thread::sleep(WAIT_POLL),
                Ok(None) => {
                    self.terminate();
                    return Err(XfconfError::Timeout(self.timeout).into());
                }
                Err(e) => {
                    self.terminate();
                    return Err(e).context("failed to wait for dbus-run-session");
                }
            }
        }

        self.lines = None;
        self.state = SessionState::Closed;
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().context("stdin pipe already closed")?;
        stdin.write_all(line.as_bytes())?;
        stdin.flush()?;
        Ok(())
    }

    /// 强制结束：关闭管道、结束进程组、回收子进程
    fn terminate(&mut self) {
        self.stdin = None;
        self.kill_group();
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.lines = None;
        self.state = SessionState::Closed;
    }

    #[cfg(unix)]
    fn kill_group(&self) {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(child) = &self.child {
            // 进程组可能已不存在（ESRCH），忽略
            let _ = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self) {}
}

impl Drop for XfconfdSession {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            self.terminate();
        }
    }
}
