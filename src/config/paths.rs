//! XDG 路径
//!
//! `dirs` 在 Linux 上遵循 XDG_CONFIG_HOME / XDG_STATE_HOME，
//! 未设置时回退到 ~/.config 与 ~/.local/state。

use anyhow::Result;
use std::path::PathBuf;

use crate::error::XfconfError;

/// 应用目录名
pub const APP_DIR: &str = "xfconf-profile";

/// 用户配置文件名
pub const CONFIG_FILENAME: &str = "config.yml";

/// 发行版推荐 profile 的默认位置
pub const DEFAULT_DIST_PROFILE: &str = "/usr/share/xfconf-profile/default.json";

/// `$XDG_CONFIG_HOME/xfconf-profile/config.yml`
pub fn config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        XfconfError::Environment("failed to get user config directory".to_string())
    })?;
    Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
}

/// `$XDG_STATE_HOME/xfconf-profile/sync`
pub fn sync_state_root() -> Result<PathBuf> {
    let base = dirs::state_dir().ok_or_else(|| {
        XfconfError::Environment("failed to get user home directory".to_string())
    })?;
    Ok(base.join(APP_DIR).join("sync"))
}

/// `$XDG_CONFIG_HOME/xfce4/xfconf/xfce-perchannel-xml`
pub fn xfconf_xml_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| {
        XfconfError::Environment("failed to get user config directory".to_string())
    })?;
    Ok(base.join("xfce4").join("xfconf").join("xfce-perchannel-xml"))
}
