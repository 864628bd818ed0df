//! 录制 xfconf 变更
//!
//! 按固定间隔重新读取快照，把新增或修改的属性输出为 xfconf-query 命令，
//! 同时累积成一份 profile，停止时可以写入文件。

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::snapshot::{PropertyValue, Snapshot, XfconfItem};
use crate::profile::{Profile, Reporter};

/// 默认轮询间隔
pub const RECORD_INTERVAL: Duration = Duration::from_millis(250);

/// 录制时间元数据键
pub const RECORDED_AT_KEY: &str = "X-Recorded-At";

/// 变更录制器
pub struct Recorder<'a> {
    dir: PathBuf,
    interval: Duration,
    reporter: &'a dyn Reporter,
    stop: Arc<AtomicBool>,
}

impl<'a> Recorder<'a> {
    pub fn new(dir: impl Into<PathBuf>, interval: Duration, reporter: &'a dyn Reporter) -> Self {
        Self {
            dir: dir.into(),
            interval,
            reporter,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 停止标志，置为 true 后循环在下一次轮询时结束
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// SIGINT / SIGTERM 时停止录制
    pub fn stop_on_signals(&self) -> Result<()> {
        use signal_hook::consts::{SIGINT, SIGTERM};

        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&self.stop))
                .with_context(|| format!("failed to register handler for signal {}", signal))?;
        }
        Ok(())
    }

    /// 录制直到停止，返回累积的 profile
    pub fn run(&self) -> Result<Profile> {
        let mut previous = Snapshot::capture(&self.dir)
            .with_context(|| format!("failed to read xfconf settings in {}", self.dir.display()))?;
        let mut profile = Profile::new();

        info!(dir = %self.dir.display(), items = previous.len(), "Recording started");

        while !self.stop.load(Ordering::SeqCst) {
            thread::sleep(self.interval);

            let current = match Snapshot::capture(&self.dir) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    // xfconfd 可能正在写文件，下一轮重试
                    warn!(error = %format!("{:#}", e), "Failed to capture snapshot");
                    continue;
                }
            };

            for item in current.diff_items(&previous) {
                self.reporter.recorded(&item.to_command());
                record_item(&mut profile, item);
            }

            previous = current;
        }

        profile.set_metadata(RECORDED_AT_KEY, Value::String(Local::now().to_rfc3339()));
        info!(properties = profile.len(), "Recording stopped");
        Ok(profile)
    }
}

/// 写出录制结果
pub fn save_recording(profile: &Profile, path: &Path) -> Result<()> {
    profile
        .save(path)
        .with_context(|| format!("failed to write recorded profile {}", path.display()))
}

fn record_item(profile: &mut Profile, item: &XfconfItem) {
    match &item.value {
        PropertyValue::Scalar(value) => {
            profile.insert(&item.channel, &item.path, typed_value(&item.value_type, value));
        }
        PropertyValue::Array(_) => {
            warn!(
                channel = %item.channel,
                property = %item.path,
                "Array properties cannot be stored in a profile, skipping"
            );
        }
    }
}

/// 按 xfconf 类型转换为 JSON 值，无法转换时保留字符串
fn typed_value(value_type: &str, value: &str) -> Value {
    let parsed = match value_type {
        "bool" => value.parse::<bool>().ok().map(Value::Bool),
        "int" | "uint" | "int64" | "uint64" => value
            .parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| value.parse::<u64>().ok().map(Value::from)),
        "double" | "float" => value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        debug!(value_type = %value_type, "Recording value as string");
        Value::String(value.to_string())
    })
}
