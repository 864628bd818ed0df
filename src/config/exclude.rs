//! 排除规则
//!
//! 每条正则匹配 `channel + property` 的直接拼接（中间没有分隔符）。
//! 因此 ("a", "bc") 与 ("ab", "c") 会得到相同的匹配串。

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::XfconfError;

/// 已编译的排除正则集合
#[derive(Debug, Clone, Default)]
pub struct ExcludePatterns {
    patterns: Vec<Regex>,
}

impl ExcludePatterns {
    /// 编译一组正则，遇到非法正则立即报错
    pub fn new<I, S>(patterns: I) -> Result<Self, XfconfError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled: Vec<Regex> = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if compiled.iter().any(|re| re.as_str() == pattern) {
                continue;
            }
            let re = Regex::new(pattern).map_err(|_| {
                XfconfError::parse(
                    "exclude patterns",
                    format!("invalid exclude regular expression: {}", pattern),
                )
            })?;
            compiled.push(re);
        }
        Ok(Self { patterns: compiled })
    }

    /// 属性是否被排除
    pub fn is_excluded(&self, channel: &str, property: &str) -> bool {
        let representation = format!("{}{}", channel, property);
        self.patterns.iter().any(|re| re.is_match(&representation))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<'de> Deserialize<'de> for ExcludePatterns {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        ExcludePatterns::new(raw).map_err(serde::de::Error::custom)
    }
}
