//! 子命令实现
//!
//! 每个命令加载用户配置、组装真实的 xfconf 存储与默认值来源，
//! 然后调用库中的对应操作，最后打印彩色摘要。

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{xfconf_xml_dir, Config, MergeBehavior};
use crate::defaults::{resolve_defaults, DistroDefaults};
use crate::profile::{ApplyReport, ConsoleReporter, ProfileRunner};
use crate::record::{save_recording, Recorder};
use crate::state::{SyncOptions, SyncOutcome, SyncState};
use crate::xfconf::{PropertyQueries, XfconfQuery};

fn print_summary(verb: &str, report: &ApplyReport, dry_run: bool) {
    let prefix = if dry_run { "Would have " } else { "" };
    println!(
        "{} {}{} {} properties ({} customized, {} excluded)",
        "✓".green(),
        prefix,
        verb,
        report.applied,
        report.skipped,
        report.excluded
    );
}

// ═══════════════════════════════════════════════════════════════════
// apply / revert
// ═══════════════════════════════════════════════════════════════════

/// 应用 profile
pub fn apply_command(path: &Path, merge: Option<MergeBehavior>, dry_run: bool) -> Result<()> {
    let config = Config::load()?;
    let behavior = merge.unwrap_or(config.merge);

    let store = XfconfQuery::new();
    let defaults = DistroDefaults::new();
    let reporter = ConsoleReporter;
    let runner = ProfileRunner::new(&store, &defaults, &reporter);

    let report = runner
        .apply(path, behavior, &config.exclude, dry_run)
        .with_context(|| format!("failed to apply profile {}", path.display()))?;

    print_summary("applied", &report, dry_run);
    Ok(())
}

/// 撤销 profile
pub fn revert_command(path: &Path, dry_run: bool) -> Result<()> {
    let config = Config::load()?;

    let store = XfconfQuery::new();
    let defaults = DistroDefaults::new();
    let reporter = ConsoleReporter;
    let runner = ProfileRunner::new(&store, &defaults, &reporter);

    let report = runner
        .revert(path, &config.exclude, dry_run)
        .with_context(|| format!("failed to revert profile {}", path.display()))?;

    print_summary("reset", &report, dry_run);
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════
// sync
// ═══════════════════════════════════════════════════════════════════

/// 同步发行版 profile
pub fn sync_command(
    profile: &Path,
    merge: Option<MergeBehavior>,
    dry_run: bool,
    auto: bool,
) -> Result<()> {
    let config = Config::load()?;

    if auto && !config.sync.auto {
        println!("{}", "Auto sync disabled in user config".yellow());
        return Ok(());
    }

    let state = SyncState::open_default()?;
    let store = XfconfQuery::new();
    let defaults = DistroDefaults::new();
    let reporter = ConsoleReporter;
    let runner = ProfileRunner::new(&store, &defaults, &reporter);

    let options = SyncOptions {
        behavior: merge.unwrap_or(config.merge),
        exclude: &config.exclude,
        dry_run,
    };

    let outcome = state
        .sync(profile, &runner, options)
        .with_context(|| format!("failed to sync profile {}", profile.display()))?;

    info!(%outcome, "Sync finished");
    let message = format!("Sync {}", outcome);
    match outcome {
        SyncOutcome::InSync => println!("{} {}", "✓".green(), message),
        _ => println!("{} {}", "✓".green(), message.green()),
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════
// record
// ═══════════════════════════════════════════════════════════════════

/// 录制变更，Ctrl+C 结束
pub fn record_command(output: Option<&Path>, interval: Duration) -> Result<()> {
    let dir = xfconf_xml_dir()?;
    let reporter = ConsoleReporter;
    let recorder = Recorder::new(dir, interval, &reporter);
    recorder.stop_on_signals()?;

    println!(
        "{} {}",
        "Recording changes to xfconf...".cyan(),
        "(Ctrl+C to stop)".dimmed()
    );

    let profile = recorder.run()?;

    match output {
        Some(path) => {
            save_recording(&profile, path)?;
            println!(
                "{} Wrote {} recorded properties to {}",
                "✓".green(),
                profile.len(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{} Recorded {} properties", "✓".green(), profile.len()),
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════
// get-default
// ═══════════════════════════════════════════════════════════════════

/// 打印属性的发行版默认值，不存在时返回 None
pub fn get_default_command(channel: &str, property: &str) -> Result<Option<String>> {
    let mut queries = PropertyQueries::new();
    queries.insert(channel.to_string(), vec![property.to_string()]);

    let values = resolve_defaults(&queries)?;
    let value = values
        .get(channel)
        .and_then(|props| props.get(property))
        .cloned()
        .unwrap_or_default();

    if value.is_empty() {
        return Ok(None);
    }
    println!("{}", value);
    Ok(Some(value))
}

// ═══════════════════════════════════════════════════════════════════
// version
// ═══════════════════════════════════════════════════════════════════

pub fn version_command() {
    println!(
        "{} {}",
        env!("CARGO_PKG_NAME").cyan().bold(),
        env!("APP_VERSION")
    );
    println!("  commit: {}", env!("APP_COMMIT"));
    println!("  built:  {}", env!("APP_BUILD_DATE"));
}
