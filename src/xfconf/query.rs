//! xfconf-query 适配器
//!
//! 每个操作启动一次 `xfconf-query` 进程并阻塞等待退出。

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Command, Output};
use tracing::{debug, trace};

use super::PropertyStore;
use crate::error::XfconfError;

/// 通过 `xfconf-query` 命令行访问 xfconf
#[derive(Debug, Clone)]
pub struct XfconfQuery {
    binary: PathBuf,
}

impl Default for XfconfQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl XfconfQuery {
    /// 使用 PATH 中的 `xfconf-query`
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("xfconf-query"),
        }
    }

    /// 使用指定的可执行文件
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        trace!(binary = %self.binary.display(), ?args, "Running xfconf-query");

        Command::new(&self.binary)
            .args(args)
            .output()
            .with_context(|| {
                format!(
                    "Failed to run {}. Is xfconf installed?",
                    self.binary.display()
                )
            })
    }

    /// 运行写操作，非零退出转为 Adapter 错误（携带合并后的输出）
    fn run_checked(&self, args: &[&str]) -> Result<()> {
        let output = self.run(args)?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));

            return Err(XfconfError::Adapter {
                status: output.status.to_string(),
                output: combined.trim_end().to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl PropertyStore for XfconfQuery {
    fn get(&self, channel: &str, property: &str) -> Result<Option<String>> {
        let output = self.run(&["--channel", channel, "--property", property])?;

        if !output.status.success() {
            debug!(channel = %channel, property = %property, "Property not set");
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Some(stdout.lines().next().unwrap_or("").to_string()))
    }

    fn set(
        &self,
        channel: &str,
        property: &str,
        value_type: &str,
        value: &str,
        create: bool,
    ) -> Result<()> {
        let mut args = vec!["-c", channel, "--property", property, "--type", value_type];
        if create {
            args.push("--create");
        }
        args.extend(["--set", value]);

        self.run_checked(&args)
    }

    fn reset(&self, channel: &str, property: &str) -> Result<()> {
        self.run_checked(&["-c", channel, "--reset", "--property", property])
    }
}
