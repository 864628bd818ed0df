//! Profile 加载、合并策略与 apply / revert

pub mod merge;
pub mod model;
pub mod report;
pub mod runner;

pub use merge::{should_revert, Decision, MergePolicy};
pub use model::{is_metadata_key, render_value, Profile, ProfileEntry, METADATA_PREFIX};
pub use report::{ConsoleReporter, Reporter, SkipReason};
pub use runner::{ApplyReport, ProfileRunner};
