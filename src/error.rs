//! 错误类型
//!
//! 所有公共 API 返回 `anyhow::Result`，根因统一使用 [`XfconfError`]，
//! 调用方可以通过 `downcast_ref::<XfconfError>()` 区分错误种类。

use std::path::PathBuf;
use thiserror::Error;

/// xfconf-profile 的错误种类
#[derive(Debug, Error)]
pub enum XfconfError {
    /// 读写、创建目录失败
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// profile / XML / YAML 格式错误
    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// xfconf-query 以非零状态退出
    #[error("xfconf-query failed ({status}):\nOutput: {output}")]
    Adapter { status: String, output: String },

    /// 缺少 xfconfd、默认配置目录或 home 目录
    #[error("{0}")]
    Environment(String),

    /// 默认值解析超时
    #[error("timeout: xfconf-query took too long to respond (limit {0:?})")]
    Timeout(std::time::Duration),

    /// previous 存在但 current 缺失
    #[error("invalid sync state in {0}: previous snapshot without current")]
    StateCorruption(PathBuf),
}

impl XfconfError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        XfconfError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(what: impl Into<String>, message: impl ToString) -> Self {
        XfconfError::Parse {
            what: what.into(),
            message: message.to_string(),
        }
    }
}

/// 从 anyhow 错误链中取出 [`XfconfError`]
pub fn error_kind(err: &anyhow::Error) -> Option<&XfconfError> {
    err.chain().find_map(|e| e.downcast_ref::<XfconfError>())
}
