//! 发行版 profile 同步
//!
//! 发行版升级可能带来新的推荐 profile。同步时撤销旧 profile、
//! 应用新 profile，未变化时不做任何写入。

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{StateLayout, SyncState};
use crate::config::{ExcludePatterns, MergeBehavior};
use crate::error::XfconfError;
use crate::profile::{Profile, ProfileRunner};
use crate::utils::{
    copy_file, create_dir_all, file_exists, files_identical, remove_dir_all_if_exists, rename,
};

/// 一次同步的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// 首次运行，已完整应用
    Initialized,
    /// profile 未变化
    InSync,
    /// 已撤销旧 profile 并应用新 profile
    Updated,
    /// 状态损坏，重置后执行的结果
    Recovered(Box<SyncOutcome>),
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Initialized => write!(f, "initialized"),
            SyncOutcome::InSync => write!(f, "already in sync"),
            SyncOutcome::Updated => write!(f, "updated"),
            SyncOutcome::Recovered(inner) => write!(f, "recovered from invalid state, {}", inner),
        }
    }
}

/// 同步参数
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions<'a> {
    pub behavior: MergeBehavior,
    pub exclude: &'a ExcludePatterns,
    pub dry_run: bool,
}

impl SyncState {
    /// 把发行版 profile 同步到用户设置
    ///
    /// dry-run 只影响 apply / revert，状态目录照常轮换。
    pub fn sync(
        &self,
        dist: &Path,
        runner: &ProfileRunner<'_>,
        options: SyncOptions<'_>,
    ) -> Result<SyncOutcome> {
        // 在动状态目录之前确认发行版 profile 可用
        let dist_profile = Profile::load(dist)
            .with_context(|| format!("failed to load distribution profile {}", dist.display()))?;

        let layout = self.layout();
        debug!(root = %self.root().display(), ?layout, dry_run = options.dry_run, "Sync state");

        match layout {
            StateLayout::Corrupt => {
                warn!("{}", XfconfError::StateCorruption(self.root().to_path_buf()));
                runner.reporter().status("Invalid state: resetting data");
                self.reset().context("failed to reset state directory")?;
                let outcome = self.initialize(dist, &dist_profile, runner, options)?;
                Ok(SyncOutcome::Recovered(Box::new(outcome)))
            }
            StateLayout::Empty => self.initialize(dist, &dist_profile, runner, options),
            StateLayout::Steady => self.steady(dist, &dist_profile, runner, options),
        }
    }

    fn initialize(
        &self,
        dist: &Path,
        dist_profile: &Profile,
        runner: &ProfileRunner<'_>,
        options: SyncOptions<'_>,
    ) -> Result<SyncOutcome> {
        runner.reporter().status("Empty state");
        runner.apply_profile(dist_profile, options.behavior, options.exclude, options.dry_run)?;

        create_dir_all(&self.current_dir()).context("failed to create current directory")?;
        copy_file(dist, &self.current_profile()).context("failed to copy distribution profile")?;
        info!(path = %self.current_profile().display(), "Sync state initialized");

        Ok(SyncOutcome::Initialized)
    }

    fn steady(
        &self,
        dist: &Path,
        dist_profile: &Profile,
        runner: &ProfileRunner<'_>,
        options: SyncOptions<'_>,
    ) -> Result<SyncOutcome> {
        runner.reporter().status("Steady state");

        remove_dir_all_if_exists(&self.previous_dir())
            .context("failed to remove previous directory")?;
        rename(&self.current_dir(), &self.previous_dir())
            .context("failed to move current to previous")?;
        create_dir_all(&self.current_dir()).context("failed to create current directory")?;
        copy_file(dist, &self.current_profile()).context("failed to copy distribution profile")?;

        let previous_path = self.previous_profile();
        if !file_exists(&previous_path) {
            warn!(
                path = %previous_path.display(),
                "Previous profile missing, applying without revert"
            );
            runner.apply_profile(
                dist_profile,
                options.behavior,
                options.exclude,
                options.dry_run,
            )?;
            return Ok(SyncOutcome::Updated);
        }

        if files_identical(&self.current_profile(), &previous_path)? {
            runner
                .reporter()
                .status("Configurations identical -- no changes required");
            return Ok(SyncOutcome::InSync);
        }

        runner
            .reporter()
            .status("Configurations differ -- reverting old and applying new");
        let previous = Profile::load(&previous_path)?;
        runner.revert_profile(&previous, options.exclude, options.dry_run)?;
        runner.apply_profile(dist_profile, options.behavior, options.exclude, options.dry_run)?;

        Ok(SyncOutcome::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::testing::FakeDefaults;
    use crate::error::error_kind;
    use crate::profile::report::testing::RecordingReporter;
    use crate::xfconf::testing::{reset, set, FakeStore};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        state: SyncState,
        dist: PathBuf,
        store: FakeStore,
        defaults: FakeDefaults,
        reporter: RecordingReporter,
        exclude: ExcludePatterns,
    }

    impl Fixture {
        fn new(dist_content: &str) -> Self {
            let temp = TempDir::new().unwrap();
            let dist = temp.path().join("default.json");
            fs::write(&dist, dist_content).unwrap();
            Self {
                state: SyncState::new(temp.path().join("state/sync")),
                dist,
                _temp: temp,
                store: FakeStore::new(),
                defaults: FakeDefaults::default(),
                reporter: RecordingReporter::default(),
                exclude: ExcludePatterns::default(),
            }
        }

        fn write_dist(&self, content: &str) {
            fs::write(&self.dist, content).unwrap();
        }

        fn sync(&self, dry_run: bool) -> Result<SyncOutcome> {
            let runner = ProfileRunner::new(&self.store, &self.defaults, &self.reporter);
            self.state.sync(
                &self.dist,
                &runner,
                SyncOptions {
                    behavior: MergeBehavior::Hard,
                    exclude: &self.exclude,
                    dry_run,
                },
            )
        }
    }

    #[test]
    fn test_first_run_initializes() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);

        assert_eq!(fx.sync(false).unwrap(), SyncOutcome::Initialized);
        assert_eq!(fx.store.calls(), vec![set("ch", "p", "1")]);
        assert_eq!(
            fs::read_to_string(fx.state.current_profile()).unwrap(),
            r#"{"ch": {"p": "1"}}"#
        );
        assert!(!fx.state.previous_dir().exists());
    }

    #[test]
    fn test_second_sync_is_idempotent() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}, "other": {"q": true}}"#);
        fx.sync(false).unwrap();
        fx.store.clear_calls();

        assert_eq!(fx.sync(false).unwrap(), SyncOutcome::InSync);
        assert!(fx.store.calls().is_empty());
        assert_eq!(fx.state.layout(), StateLayout::Steady);
        assert!(fx.state.previous_profile().is_file());
    }

    #[test]
    fn test_changed_profile_reverts_then_applies() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);
        fx.sync(false).unwrap();
        fx.store.clear_calls();

        fx.write_dist(r#"{"ch": {"p": "2"}}"#);
        assert_eq!(fx.sync(false).unwrap(), SyncOutcome::Updated);

        assert_eq!(fx.store.calls(), vec![reset("ch", "p"), set("ch", "p", "2")]);
        assert_eq!(
            fs::read_to_string(fx.state.previous_profile()).unwrap(),
            r#"{"ch": {"p": "1"}}"#
        );
        assert_eq!(
            fs::read_to_string(fx.state.current_profile()).unwrap(),
            r#"{"ch": {"p": "2"}}"#
        );
    }

    #[test]
    fn test_corrupt_state_is_rebuilt_like_first_run() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);
        fs::create_dir_all(fx.state.previous_dir()).unwrap();
        fs::write(fx.state.previous_profile(), r#"{"old": {"x": "y"}}"#).unwrap();

        let outcome = fx.sync(false).unwrap();

        assert_eq!(outcome, SyncOutcome::Recovered(Box::new(SyncOutcome::Initialized)));
        assert_eq!(fx.store.calls(), vec![set("ch", "p", "1")]);
        assert!(!fx.state.previous_dir().exists());
        assert!(fx.state.current_profile().is_file());
        assert!(fx
            .reporter
            .lines()
            .contains(&"Invalid state: resetting data".to_string()));
    }

    #[test]
    fn test_missing_dist_leaves_state_untouched() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);
        fx.sync(false).unwrap();
        fs::remove_file(&fx.dist).unwrap();

        let err = fx.sync(false).unwrap_err();

        assert!(matches!(error_kind(&err), Some(XfconfError::Io { .. })));
        assert!(fx.state.current_profile().is_file());
        assert!(!fx.state.previous_dir().exists());
    }

    #[test]
    fn test_dry_run_empty_init_materializes_current() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);

        assert_eq!(fx.sync(true).unwrap(), SyncOutcome::Initialized);

        assert!(fx.store.calls().is_empty());
        assert!(fx.reporter.lines().contains(&"set? ch::p=1".to_string()));
        assert_eq!(
            fs::read_to_string(fx.state.current_profile()).unwrap(),
            r#"{"ch": {"p": "1"}}"#
        );
        assert_eq!(fx.state.layout(), StateLayout::Steady);
    }

    #[test]
    fn test_dry_run_steady_rotates_without_adapter_calls() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);
        fx.sync(false).unwrap();
        fx.store.clear_calls();
        fx.write_dist(r#"{"ch": {"p": "2"}}"#);

        assert_eq!(fx.sync(true).unwrap(), SyncOutcome::Updated);

        assert!(fx.store.calls().is_empty());
        assert_eq!(
            fs::read_to_string(fx.state.previous_profile()).unwrap(),
            r#"{"ch": {"p": "1"}}"#
        );
        assert_eq!(
            fs::read_to_string(fx.state.current_profile()).unwrap(),
            r#"{"ch": {"p": "2"}}"#
        );
        let lines = fx.reporter.lines();
        assert!(lines.contains(&"reset? ch::p".to_string()));
        assert!(lines.contains(&"set? ch::p=2".to_string()));
    }

    #[test]
    fn test_dry_run_corrupt_state_is_reset() {
        let fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);
        fs::create_dir_all(fx.state.previous_dir()).unwrap();

        let outcome = fx.sync(true).unwrap();

        assert_eq!(outcome, SyncOutcome::Recovered(Box::new(SyncOutcome::Initialized)));
        assert!(fx.store.calls().is_empty());
        assert!(!fx.state.previous_dir().exists());
        assert!(fx.state.current_profile().is_file());
    }

    #[test]
    fn test_failed_apply_does_not_initialize() {
        let mut fx = Fixture::new(r#"{"ch": {"p": "1"}}"#);
        fx.store = FakeStore::new().failing_on("ch", "p");

        assert!(fx.sync(false).is_err());
        assert_eq!(fx.state.layout(), StateLayout::Empty);
    }
}
