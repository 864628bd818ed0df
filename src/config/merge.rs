//! 合并策略
//!
//! 决定 apply 时是否覆盖用户已修改的属性

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

use crate::error::XfconfError;

/// apply 时的合并行为
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeBehavior {
    /// 跳过用户改过（与发行版默认值不同）的属性
    #[default]
    Soft,
    /// 应用所有未被排除的属性
    Hard,
    /// 应用所有属性，忽略排除规则
    Force,
}

impl MergeBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeBehavior::Soft => "soft",
            MergeBehavior::Hard => "hard",
            MergeBehavior::Force => "force",
        }
    }

    /// 从字符串解析（忽略大小写）
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "soft" => Some(MergeBehavior::Soft),
            "hard" => Some(MergeBehavior::Hard),
            "force" => Some(MergeBehavior::Force),
            _ => None,
        }
    }
}

impl fmt::Display for MergeBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MergeBehavior {
    type Err = XfconfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeBehavior::parse(s).ok_or_else(|| {
            XfconfError::parse(
                "merge behavior",
                format!("'{}': must be 'soft', 'hard', or 'force'", s),
            )
        })
    }
}

impl<'de> Deserialize<'de> for MergeBehavior {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(MergeBehavior::parse("soft"), Some(MergeBehavior::Soft));
        assert_eq!(MergeBehavior::parse("HARD"), Some(MergeBehavior::Hard));
        assert_eq!(MergeBehavior::parse("Force"), Some(MergeBehavior::Force));
        assert_eq!(MergeBehavior::parse("gentle"), None);
    }

    #[test]
    fn test_from_str_error_message() {
        let err = "gentle".parse::<MergeBehavior>().unwrap_err();
        assert!(err.to_string().contains("must be 'soft', 'hard', or 'force'"));
    }

    #[test]
    fn test_deserialize_yaml() {
        let behavior: MergeBehavior = serde_yaml::from_str("Hard").unwrap();
        assert_eq!(behavior, MergeBehavior::Hard);
        assert!(serde_yaml::from_str::<MergeBehavior>("sometimes").is_err());
    }
}
