//! xfconf 设置快照
//!
//! 读取 `xfce-perchannel-xml/*.xml`，把嵌套的 property 树展平成
//! `(channel, 属性路径) → XfconfItem`。
//!
//! - `type="empty"` 为分支节点，名字作为子节点路径前缀
//! - `type="array"` 收集子节点（`<value>` 或 `<property>`）为有序列表
//! - 其他类型为标量叶子

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::XfconfError;
use crate::utils::{dir_exists, quote_shell, read_file};

/// 路径分隔符
pub const PATH_SEPARATOR: char = '/';

const BRANCH_TYPE: &str = "empty";
const ARRAY_TYPE: &str = "array";

// ═══════════════════════════════════════════════════════════════════
// XML 结构
// ═══════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct ChannelXml {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "property", default)]
    properties: Vec<PropertyXml>,
}

#[derive(Debug, Deserialize)]
struct PropertyXml {
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@type", default)]
    value_type: String,
    #[serde(rename = "@value", default)]
    value: String,
    #[serde(rename = "property", default)]
    properties: Vec<PropertyXml>,
    #[serde(rename = "value", default)]
    values: Vec<ValueXml>,
}

#[derive(Debug, Deserialize)]
struct ValueXml {
    #[serde(rename = "@type", default)]
    value_type: String,
    #[serde(rename = "@value", default)]
    value: String,
}

// ═══════════════════════════════════════════════════════════════════
// 展平后的条目
// ═══════════════════════════════════════════════════════════════════

/// 数组元素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayEntry {
    pub value_type: String,
    pub value: String,
}

/// 属性值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Scalar(String),
    Array(Vec<ArrayEntry>),
}

/// 一个展平后的 xfconf 属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XfconfItem {
    pub channel: String,
    pub path: String,
    pub value_type: String,
    pub value: PropertyValue,
}

impl XfconfItem {
    /// 等价的 xfconf-query 命令，所有参数都经过 shell 转义
    pub fn to_command(&self) -> String {
        let mut cmd = format!(
            "xfconf-query --create -c {} -p {}",
            quote_shell(&self.channel),
            quote_shell(&self.path)
        );

        match &self.value {
            PropertyValue::Scalar(value) => {
                cmd.push_str(&format!(
                    " --type {} --set {}",
                    quote_shell(&self.value_type),
                    quote_shell(value)
                ));
            }
            PropertyValue::Array(entries) => {
                for entry in entries {
                    cmd.push_str(&format!(
                        " --type {} --set {}",
                        quote_shell(&entry.value_type),
                        quote_shell(&entry.value)
                    ));
                }
            }
        }

        cmd
    }
}

/// 三路比较结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotChanges {
    pub added: Vec<XfconfItem>,
    pub removed: Vec<XfconfItem>,
    /// (旧, 新)
    pub changed: Vec<(XfconfItem, XfconfItem)>,
}

impl SnapshotChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════
// 快照
// ═══════════════════════════════════════════════════════════════════

/// 某一时刻的 xfconf 设置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    items: BTreeMap<(String, String), XfconfItem>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取目录下所有 channel XML；目录不存在时返回空快照
    pub fn capture(dir: &Path) -> Result<Self> {
        let mut snapshot = Snapshot::new();

        if !dir_exists(dir) {
            debug!(dir = %dir.display(), "xfconf directory missing, empty snapshot");
            return Ok(snapshot);
        }

        for file in channel_files(dir)? {
            let content = read_file(&file)?;
            snapshot
                .add_channel_xml(&content)
                .with_context(|| format!("failed to read channel {}", file.display()))?;
        }

        Ok(snapshot)
    }

    /// 解析一个 channel XML 并加入快照
    pub fn add_channel_xml(&mut self, content: &str) -> Result<()> {
        for item in parse_channel_xml(content)? {
            self.items
                .insert((item.channel.clone(), item.path.clone()), item);
        }
        Ok(())
    }

    pub fn get(&self, channel: &str, path: &str) -> Option<&XfconfItem> {
        self.items.get(&(channel.to_string(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 所有条目的命令形式
    pub fn commands(&self) -> Vec<String> {
        self.items.values().map(XfconfItem::to_command).collect()
    }

    /// 命令形式不在旧快照中的条目（新增或修改）
    pub fn diff_items<'a>(&'a self, old: &Snapshot) -> Vec<&'a XfconfItem> {
        let before: BTreeSet<String> = old.commands().into_iter().collect();
        self.items
            .values()
            .filter(|item| !before.contains(&item.to_command()))
            .collect()
    }

    /// 新增或修改条目的命令形式；删除与重排不会出现
    pub fn diff(&self, old: &Snapshot) -> Vec<String> {
        self.diff_items(old)
            .into_iter()
            .map(XfconfItem::to_command)
            .collect()
    }

    /// 与旧快照做完整比较
    pub fn compare(&self, old: &Snapshot) -> SnapshotChanges {
        let mut changes = SnapshotChanges::default();

        for (key, item) in &self.items {
            match old.items.get(key) {
                None => changes.added.push(item.clone()),
                Some(previous) if previous != item => {
                    changes.changed.push((previous.clone(), item.clone()))
                }
                Some(_) => {}
            }
        }

        for (key, item) in &old.items {
            if !self.items.contains_key(key) {
                changes.removed.push(item.clone());
            }
        }

        changes
    }
}

fn channel_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| XfconfError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| XfconfError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// 展平一个 channel XML 文档
pub fn parse_channel_xml(content: &str) -> Result<Vec<XfconfItem>> {
    let channel: ChannelXml =
        quick_xml::de::from_str(content).map_err(|e| XfconfError::parse("channel XML", e))?;

    let mut items = Vec::new();
    for property in &channel.properties {
        flatten(property, &channel.name, "", &mut items);
    }
    Ok(items)
}

fn flatten(property: &PropertyXml, channel: &str, parent: &str, items: &mut Vec<XfconfItem>) {
    let path = format!("{}{}{}", parent, PATH_SEPARATOR, property.name);

    match property.value_type.as_str() {
        BRANCH_TYPE => {
            for child in &property.properties {
                flatten(child, channel, &path, items);
            }
        }
        ARRAY_TYPE => {
            let entries = property
                .values
                .iter()
                .map(|v| ArrayEntry {
                    value_type: v.value_type.clone(),
                    value: v.value.clone(),
                })
                .chain(property.properties.iter().map(|p| ArrayEntry {
                    value_type: p.value_type.clone(),
                    value: p.value.clone(),
                }))
                .collect();

            items.push(XfconfItem {
                channel: channel.to_string(),
                path,
                value_type: property.value_type.clone(),
                value: PropertyValue::Array(entries),
            });
        }
        _ => items.push(XfconfItem {
            channel: channel.to_string(),
            path,
            value_type: property.value_type.clone(),
            value: PropertyValue::Scalar(property.value.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const XFWM4: &str = r#"<?xml version="1.0" encoding="UTF-8"?>

<channel name="xfwm4" version="1.0">
  <property name="general" type="empty">
    <property name="theme" type="string" value="Greybird"/>
    <property name="workspace_count" type="int" value="4"/>
    <property name="workspace_names" type="array">
      <value type="string" value="Workspace 1"/>
      <value type="string" value="Workspace 2"/>
      <value type="string" value="Workspace 3"/>
    </property>
  </property>
</channel>
"#;

    fn snapshot(xml: &str) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.add_channel_xml(xml).unwrap();
        snapshot
    }

    #[test]
    fn test_two_level_branch_yields_one_leaf() {
        let xml = r#"<channel name="xsettings" version="1.0">
  <property name="Net" type="empty">
    <property name="ThemeName" type="string" value="Adwaita"/>
  </property>
</channel>"#;

        let items = parse_channel_xml(xml).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].channel, "xsettings");
        assert_eq!(items[0].path, "/Net/ThemeName");
        assert_eq!(items[0].value, PropertyValue::Scalar("Adwaita".to_string()));
    }

    #[test]
    fn test_array_collects_children_in_order() {
        let snapshot = snapshot(XFWM4);
        let item = snapshot.get("xfwm4", "/general/workspace_names").unwrap();

        let PropertyValue::Array(entries) = &item.value else {
            panic!("expected array, got {:?}", item.value);
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].value, "Workspace 1");
        assert_eq!(entries[2].value, "Workspace 3");
        assert!(entries.iter().all(|e| e.value_type == "string"));
    }

    #[test]
    fn test_array_with_property_children() {
        let xml = r#"<channel name="xfce4-panel" version="1.0">
  <property name="panels" type="array">
    <property name="0" type="int" value="1"/>
    <property name="1" type="int" value="2"/>
  </property>
</channel>"#;

        let items = parse_channel_xml(xml).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].value,
            PropertyValue::Array(vec![
                ArrayEntry { value_type: "int".into(), value: "1".into() },
                ArrayEntry { value_type: "int".into(), value: "2".into() },
            ])
        );
    }

    #[test]
    fn test_array_folds_nested_branches() {
        // xfce4-panel.xml 的 /panels 同时带有 <value> 和分支子节点
        let xml = r#"<channel name="xfce4-panel" version="1.0">
  <property name="panels" type="array">
    <value type="int" value="1"/>
    <property name="dark-mode" type="bool" value="true"/>
    <property name="panel-1" type="empty">
      <property name="size" type="uint" value="28"/>
    </property>
  </property>
</channel>"#;

        let items = parse_channel_xml(xml).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, "/panels");
        assert_eq!(
            items[0].value,
            PropertyValue::Array(vec![
                ArrayEntry { value_type: "int".into(), value: "1".into() },
                ArrayEntry { value_type: "bool".into(), value: "true".into() },
                ArrayEntry { value_type: "empty".into(), value: "".into() },
            ])
        );
    }

    #[test]
    fn test_same_path_in_two_channels() {
        let mut snapshot = Snapshot::new();
        snapshot
            .add_channel_xml(r#"<channel name="a"><property name="x" type="int" value="1"/></channel>"#)
            .unwrap();
        snapshot
            .add_channel_xml(r#"<channel name="b"><property name="x" type="int" value="2"/></channel>"#)
            .unwrap();

        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_to_command_quotes_arguments() {
        let item = XfconfItem {
            channel: "xfwm4".into(),
            path: "/general/title_font".into(),
            value_type: "string".into(),
            value: PropertyValue::Scalar("It's Sans 9".into()),
        };

        assert_eq!(
            item.to_command(),
            r#"xfconf-query --create -c 'xfwm4' -p '/general/title_font' --type 'string' --set 'It'\''s Sans 9'"#
        );

        let array = snapshot(XFWM4);
        let cmd = array
            .get("xfwm4", "/general/workspace_names")
            .unwrap()
            .to_command();
        assert_eq!(cmd.matches("--type 'string' --set").count(), 3);
    }

    #[test]
    fn test_diff_reports_additions_and_changes_only() {
        let old = snapshot(XFWM4);
        let new = snapshot(
            r#"<channel name="xfwm4" version="1.0">
  <property name="general" type="empty">
    <property name="theme" type="string" value="Default"/>
    <property name="button_layout" type="string" value="O|HMC"/>
  </property>
</channel>"#,
        );

        let diff = new.diff(&old);

        assert_eq!(diff.len(), 2);
        assert!(diff.iter().any(|c| c.contains("'/general/theme'") && c.contains("'Default'")));
        assert!(diff.iter().any(|c| c.contains("'/general/button_layout'")));
        // 删除的属性不出现
        assert!(!diff.iter().any(|c| c.contains("workspace_count")));
        assert!(new.diff(&new).is_empty());
    }

    #[test]
    fn test_compare_three_way() {
        let old = snapshot(XFWM4);
        let new = snapshot(
            r#"<channel name="xfwm4" version="1.0">
  <property name="general" type="empty">
    <property name="theme" type="string" value="Default"/>
    <property name="workspace_count" type="int" value="4"/>
    <property name="button_layout" type="string" value="O|HMC"/>
  </property>
</channel>"#,
        );

        let changes = new.compare(&old);

        assert_eq!(changes.added.len(), 1);
        assert_eq!(changes.added[0].path, "/general/button_layout");
        assert_eq!(changes.removed.len(), 1);
        assert_eq!(changes.removed[0].path, "/general/workspace_names");
        assert_eq!(changes.changed.len(), 1);
        assert_eq!(changes.changed[0].1.path, "/general/theme");
    }

    #[test]
    fn test_capture_reads_xml_files_only() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("xfwm4.xml"), XFWM4).unwrap();
        fs::write(temp.path().join("notes.txt"), "not xml").unwrap();

        let snapshot = Snapshot::capture(temp.path()).unwrap();
        assert_eq!(snapshot.len(), 3);

        let missing = Snapshot::capture(&temp.path().join("missing")).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("broken.xml"), "<channel name=").unwrap();

        let err = Snapshot::capture(temp.path()).unwrap_err();
        assert!(matches!(
            crate::error::error_kind(&err),
            Some(XfconfError::Parse { .. })
        ));
    }
}
