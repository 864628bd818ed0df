//! 同步状态管理
//!
//! 状态目录保存最近两次应用的发行版 profile 原样副本：
//!
//! ```text
//! $XDG_STATE_HOME/xfconf-profile/sync/
//! ├── current/profile.json    # 最近一次应用
//! └── previous/profile.json   # 上一次应用
//! ```
//!
//! 哪些目录存在决定了同步时的状态（见 [`StateLayout`]）。

pub mod sync;

pub use sync::{SyncOptions, SyncOutcome};

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::sync_state_root;
use crate::utils::{create_dir_all, dir_exists, remove_dir_all_if_exists};

/// 状态目录中的 profile 文件名
pub const PROFILE_FILENAME: &str = "profile.json";

/// 状态目录布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLayout {
    /// current 与 previous 都不存在（首次运行）
    Empty,
    /// current 存在
    Steady,
    /// previous 存在但 current 缺失
    Corrupt,
}

/// 持久化的同步状态
#[derive(Debug, Clone)]
pub struct SyncState {
    root: PathBuf,
}

impl SyncState {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 使用 XDG 默认位置
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(sync_state_root()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_dir(&self) -> PathBuf {
        self.root.join("current")
    }

    pub fn previous_dir(&self) -> PathBuf {
        self.root.join("previous")
    }

    pub fn current_profile(&self) -> PathBuf {
        self.current_dir().join(PROFILE_FILENAME)
    }

    pub fn previous_profile(&self) -> PathBuf {
        self.previous_dir().join(PROFILE_FILENAME)
    }

    pub fn layout(&self) -> StateLayout {
        match (dir_exists(&self.current_dir()), dir_exists(&self.previous_dir())) {
            (true, _) => StateLayout::Steady,
            (false, true) => StateLayout::Corrupt,
            (false, false) => StateLayout::Empty,
        }
    }

    /// 删除整个状态目录并重建为空
    pub fn reset(&self) -> Result<()> {
        remove_dir_all_if_exists(&self.root)?;
        create_dir_all(&self.root)
    }
}
