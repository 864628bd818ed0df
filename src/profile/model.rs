//! Profile 数据模型
//!
//! profile.json 顶层键为 channel 名，值为 `属性路径 → 标量` 的对象。
//! 以 `X-` 开头的顶层键是元数据，不会被 apply / revert / sync。

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::XfconfError;
use crate::utils::{read_file, write_file};

/// 元数据键前缀
pub const METADATA_PREFIX: &str = "X-";

/// 是否为元数据键
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_PREFIX)
}

/// 把 JSON 值渲染成传给 xfconf-query 的字符串
///
/// 字符串原样输出，null 为空串，其余使用 JSON 文本。
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 单个属性条目
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry<'a> {
    pub channel: &'a str,
    pub property: &'a str,
    pub value: &'a Value,
}

impl ProfileEntry<'_> {
    /// 渲染后的值
    pub fn rendered(&self) -> String {
        render_value(self.value)
    }
}

/// 一份 profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    channels: BTreeMap<String, BTreeMap<String, Value>>,
    metadata: BTreeMap<String, Value>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 profile JSON
    pub fn parse(content: &str) -> Result<Self> {
        let root: Map<String, Value> = serde_json::from_str(content)
            .map_err(|e| XfconfError::parse("profile JSON", e))?;

        let mut profile = Profile::new();

        for (key, value) in root {
            if is_metadata_key(&key) {
                profile.metadata.insert(key, value);
                continue;
            }

            let Value::Object(properties) = value else {
                return Err(XfconfError::parse(
                    "profile JSON",
                    format!("channel '{}' must map to an object of properties", key),
                )
                .into());
            };

            profile
                .channels
                .insert(key, properties.into_iter().collect());
        }

        Ok(profile)
    }

    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_file(path).context("failed to read file")?;
        Self::parse(&content).with_context(|| format!("failed to load profile {}", path.display()))
    }

    /// 写入文件（格式化 JSON，包含元数据）
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json())
            .context("Failed to serialize profile to JSON")?;
        write_file(path, format!("{}\n", json).as_bytes())
    }

    /// 转为 JSON 对象
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (key, value) in &self.metadata {
            root.insert(key.clone(), value.clone());
        }
        for (channel, properties) in &self.channels {
            let props: Map<String, Value> = properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            root.insert(channel.clone(), Value::Object(props));
        }
        Value::Object(root)
    }

    /// 设置属性值（元数据 channel 会被忽略）
    pub fn insert(&mut self, channel: &str, property: &str, value: Value) {
        if is_metadata_key(channel) {
            return;
        }
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(property.to_string(), value);
    }

    /// 设置元数据
    pub fn set_metadata(&mut self, key: &str, value: Value) {
        let key = if is_metadata_key(key) {
            key.to_string()
        } else {
            format!("{}{}", METADATA_PREFIX, key)
        };
        self.metadata.insert(key, value);
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// 按 channel、属性路径排序遍历所有非元数据属性
    pub fn entries(&self) -> impl Iterator<Item = ProfileEntry<'_>> {
        self.channels.iter().flat_map(|(channel, properties)| {
            properties.iter().map(move |(property, value)| ProfileEntry {
                channel,
                property,
                value,
            })
        })
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.channels.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
