//! apply / revert 执行器

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use super::merge::{should_revert, Decision, MergePolicy};
use super::model::Profile;
use super::report::{Reporter, SkipReason};
use crate::config::{ExcludePatterns, MergeBehavior};
use crate::defaults::DefaultSource;
use crate::xfconf::PropertyStore;

/// 写入 xfconf 时声明的类型
const VALUE_TYPE: &str = "string";

/// 一次 apply / revert 的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// 已设置 / 已重置（dry-run 时为将要执行）的属性数
    pub applied: usize,
    /// 因用户修改而跳过
    pub skipped: usize,
    /// 因排除规则而跳过
    pub excluded: usize,
}

impl ApplyReport {
    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Excluded => self.excluded += 1,
            SkipReason::Customized => self.skipped += 1,
        }
    }

    /// 合并另一份统计
    pub fn merge(&mut self, other: ApplyReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.excluded += other.excluded;
    }
}

/// 把 profile 应用到属性存储上
///
/// 遇到第一个失败立即返回，已写入的属性不会回滚。
pub struct ProfileRunner<'a> {
    store: &'a dyn PropertyStore,
    defaults: &'a dyn DefaultSource,
    reporter: &'a dyn Reporter,
}

impl<'a> ProfileRunner<'a> {
    pub fn new(
        store: &'a dyn PropertyStore,
        defaults: &'a dyn DefaultSource,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            store,
            defaults,
            reporter,
        }
    }

    pub fn reporter(&self) -> &dyn Reporter {
        self.reporter
    }

    /// 加载并应用 profile 文件
    pub fn apply(
        &self,
        path: &Path,
        behavior: MergeBehavior,
        exclude: &ExcludePatterns,
        dry_run: bool,
    ) -> Result<ApplyReport> {
        let profile = Profile::load(path)?;
        self.apply_profile(&profile, behavior, exclude, dry_run)
    }

    pub fn apply_profile(
        &self,
        profile: &Profile,
        behavior: MergeBehavior,
        exclude: &ExcludePatterns,
        dry_run: bool,
    ) -> Result<ApplyReport> {
        let policy = MergePolicy::prepare(profile, behavior, exclude, self.store, self.defaults)?;
        let mut report = ApplyReport::default();

        debug!(merge = %behavior, properties = profile.len(), dry_run, "Applying profile");

        for entry in profile.entries() {
            match policy.should_apply(entry.channel, entry.property) {
                Decision::Skip(reason) => {
                    self.reporter.skipped(entry.channel, entry.property, reason);
                    report.record_skip(reason);
                }
                Decision::Apply => {
                    let value = entry.rendered();
                    self.reporter
                        .setting(entry.channel, entry.property, &value, dry_run);

                    if !dry_run {
                        self.store
                            .set(entry.channel, entry.property, VALUE_TYPE, &value, true)
                            .with_context(|| {
                                format!("failed to set {}::{}", entry.channel, entry.property)
                            })?;
                    }
                    report.applied += 1;
                }
            }
        }

        info!(
            applied = report.applied,
            skipped = report.skipped,
            excluded = report.excluded,
            "Profile applied"
        );
        Ok(report)
    }

    /// 加载并撤销 profile 文件
    pub fn revert(
        &self,
        path: &Path,
        exclude: &ExcludePatterns,
        dry_run: bool,
    ) -> Result<ApplyReport> {
        let profile = Profile::load(path)?;
        self.revert_profile(&profile, exclude, dry_run)
    }

    /// 把 profile 中的属性重置为 xfconf 内置默认值
    pub fn revert_profile(
        &self,
        profile: &Profile,
        exclude: &ExcludePatterns,
        dry_run: bool,
    ) -> Result<ApplyReport> {
        let mut report = ApplyReport::default();

        debug!(properties = profile.len(), dry_run, "Reverting profile");

        for entry in profile.entries() {
            match should_revert(exclude, entry.channel, entry.property) {
                Decision::Skip(reason) => {
                    self.reporter.skipped(entry.channel, entry.property, reason);
                    report.record_skip(reason);
                }
                Decision::Apply => {
                    self.reporter
                        .resetting(entry.channel, entry.property, dry_run);

                    if !dry_run {
                        self.store
                            .reset(entry.channel, entry.property)
                            .with_context(|| {
                                format!("failed to reset {}::{}", entry.channel, entry.property)
                            })?;
                    }
                    report.applied += 1;
                }
            }
        }

        info!(reset = report.applied, excluded = report.excluded, "Profile reverted");
        Ok(report)
    }
}
