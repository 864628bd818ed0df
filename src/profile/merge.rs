//! 合并策略
//!
//! 决定 profile 中的每个属性在 apply / revert 时是否生效。

use anyhow::{Context, Result};
use tracing::debug;

use super::model::Profile;
use super::report::SkipReason;
use crate::config::{ExcludePatterns, MergeBehavior};
use crate::defaults::DefaultSource;
use crate::xfconf::{gather_current_values, PropertyQueries, PropertyStore, PropertyValues};

/// 单个属性的处理决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Apply,
    Skip(SkipReason),
}

/// 一次 apply 使用的合并策略
///
/// soft 模式下，当前值与默认值在构造时一次性收集。
pub struct MergePolicy<'a> {
    behavior: MergeBehavior,
    exclude: &'a ExcludePatterns,
    live: PropertyValues,
    defaults: PropertyValues,
}

impl<'a> MergePolicy<'a> {
    /// 为 profile 准备策略
    ///
    /// 只有 soft 模式需要查询，且只查询未被排除的属性；
    /// 没有需要查询的属性时不会启动默认值会话。
    pub fn prepare(
        profile: &Profile,
        behavior: MergeBehavior,
        exclude: &'a ExcludePatterns,
        store: &dyn PropertyStore,
        defaults: &dyn DefaultSource,
    ) -> Result<Self> {
        let mut policy = Self {
            behavior,
            exclude,
            live: PropertyValues::new(),
            defaults: PropertyValues::new(),
        };

        if behavior != MergeBehavior::Soft {
            return Ok(policy);
        }

        let queries = eligible_queries(profile, exclude);
        if queries.is_empty() {
            return Ok(policy);
        }

        debug!(channels = queries.len(), "Gathering live and default values");
        policy.live = gather_current_values(store, &queries);
        policy.defaults = defaults
            .resolve(&queries)
            .context("failed to resolve default values")?;

        Ok(policy)
    }

    pub fn should_apply(&self, channel: &str, property: &str) -> Decision {
        match self.behavior {
            MergeBehavior::Force => Decision::Apply,
            _ if self.exclude.is_excluded(channel, property) => {
                Decision::Skip(SkipReason::Excluded)
            }
            MergeBehavior::Hard => Decision::Apply,
            MergeBehavior::Soft => {
                let live = lookup(&self.live, channel, property);
                let default = lookup(&self.defaults, channel, property);
                if live == default {
                    Decision::Apply
                } else {
                    debug!(
                        channel = %channel,
                        property = %property,
                        live = %live,
                        default = %default,
                        "Customized by user"
                    );
                    Decision::Skip(SkipReason::Customized)
                }
            }
        }
    }
}

/// revert 只受排除规则影响
pub fn should_revert(exclude: &ExcludePatterns, channel: &str, property: &str) -> Decision {
    if exclude.is_excluded(channel, property) {
        Decision::Skip(SkipReason::Excluded)
    } else {
        Decision::Apply
    }
}

fn eligible_queries(profile: &Profile, exclude: &ExcludePatterns) -> PropertyQueries {
    let mut queries = PropertyQueries::new();
    for entry in profile.entries() {
        if exclude.is_excluded(entry.channel, entry.property) {
            continue;
        }
        queries
            .entry(entry.channel.to_string())
            .or_default()
            .push(entry.property.to_string());
    }
    queries
}

fn lookup<'v>(values: &'v PropertyValues, channel: &str, property: &str) -> &'v str {
    values
        .get(channel)
        .and_then(|props| props.get(property))
        .map(String::as_str)
        .unwrap_or("")
}
