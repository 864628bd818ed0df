// xfconf-profile - Library Root
//
// 应用、撤销、同步与录制 Xfce xfconf 设置 profile

pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod profile;
pub mod record;
pub mod state;
pub mod utils;
pub mod xfconf;

// 重新导出常用类型
pub use config::{Config, ExcludePatterns, MergeBehavior};
pub use defaults::{resolve_defaults, DefaultSource, DistroDefaults};
pub use error::{error_kind, XfconfError};
pub use profile::{ApplyReport, Profile, ProfileRunner, Reporter};
pub use state::{SyncOutcome, SyncState};
pub use xfconf::{PropertyStore, XfconfQuery};
