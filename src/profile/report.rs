//! 进度输出
//!
//! 核心逻辑只通过注入的 [`Reporter`] 输出面向用户的进度行，
//! 诊断日志则使用 `tracing`。

use colored::*;

/// 跳过属性的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 命中排除规则
    Excluded,
    /// 用户已修改（soft 模式）
    Customized,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Excluded => "excluded",
            SkipReason::Customized => "customized by user",
        }
    }
}

/// 面向用户的进度输出
pub trait Reporter {
    /// 将要设置属性
    fn setting(&self, channel: &str, property: &str, value: &str, dry_run: bool);

    /// 将要重置属性
    fn resetting(&self, channel: &str, property: &str, dry_run: bool);

    /// 跳过属性
    fn skipped(&self, channel: &str, property: &str, reason: SkipReason);

    /// 记录到的变更（record 命令）
    fn recorded(&self, command: &str);

    /// 普通状态信息
    fn status(&self, message: &str);
}

/// 彩色终端输出
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

fn dry_run_tag(dry_run: bool) -> ColoredString {
    if dry_run {
        "[dry-run] ".dimmed()
    } else {
        "".normal()
    }
}

impl Reporter for ConsoleReporter {
    fn setting(&self, channel: &str, property: &str, value: &str, dry_run: bool) {
        println!(
            "{} {}Setting {}::{} ➔ {}",
            "•".bright_blue(),
            dry_run_tag(dry_run),
            channel,
            property,
            value
        );
    }

    fn resetting(&self, channel: &str, property: &str, dry_run: bool) {
        println!(
            "{} {}Resetting {}::{}",
            "•".bright_yellow(),
            dry_run_tag(dry_run),
            channel,
            property
        );
    }

    fn skipped(&self, channel: &str, property: &str, reason: SkipReason) {
        println!(
            "{} Skipping {}::{} ({})",
            "−".dimmed(),
            channel,
            property,
            reason.as_str().dimmed()
        );
    }

    fn recorded(&self, command: &str) {
        println!("{} {}", "•".bright_cyan(), command);
    }

    fn status(&self, message: &str) {
        println!("{}", message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// 把输出记录为字符串，便于断言
    #[derive(Default)]
    pub struct RecordingReporter {
        pub lines: RefCell<Vec<String>>,
    }

    impl RecordingReporter {
        pub fn lines(&self) -> Vec<String> {
            self.lines.borrow().clone()
        }

        fn push(&self, line: String) {
            self.lines.borrow_mut().push(line);
        }
    }

    impl Reporter for RecordingReporter {
        fn setting(&self, channel: &str, property: &str, value: &str, dry_run: bool) {
            let tag = if dry_run { "?" } else { "" };
            self.push(format!("set{} {}::{}={}", tag, channel, property, value));
        }

        fn resetting(&self, channel: &str, property: &str, dry_run: bool) {
            let tag = if dry_run { "?" } else { "" };
            self.push(format!("reset{} {}::{}", tag, channel, property));
        }

        fn skipped(&self, channel: &str, property: &str, reason: SkipReason) {
            self.push(format!("skip {}::{} {}", channel, property, reason.as_str()));
        }

        fn recorded(&self, command: &str) {
            self.push(format!("recorded {}", command));
        }

        fn status(&self, message: &str) {
            self.push(message.to_string());
        }
    }
}
