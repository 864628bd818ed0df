//! xfconf 属性存储
//!
//! [`PropertyStore`] 是核心逻辑与真实 xfconf 之间唯一的 I/O 边界，
//! 生产环境由 [`XfconfQuery`] 调用 `xfconf-query` 实现。

pub mod query;

pub use query::XfconfQuery;

use anyhow::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// channel → 待查询的属性路径
pub type PropertyQueries = BTreeMap<String, Vec<String>>;

/// channel → 属性路径 → 值（不存在时为空串）
pub type PropertyValues = BTreeMap<String, BTreeMap<String, String>>;

/// 属性存储操作
pub trait PropertyStore {
    /// 读取当前值，属性不存在时返回 None
    fn get(&self, channel: &str, property: &str) -> Result<Option<String>>;

    /// 设置属性值，`create` 为 true 时属性不存在则创建
    fn set(
        &self,
        channel: &str,
        property: &str,
        value_type: &str,
        value: &str,
        create: bool,
    ) -> Result<()>;

    /// 重置为 xfconf 内置默认值
    fn reset(&self, channel: &str, property: &str) -> Result<()>;
}

/// 查询一组属性的当前值
///
/// 读取失败或属性不存在都归一化为空串。
pub fn gather_current_values(
    store: &dyn PropertyStore,
    queries: &PropertyQueries,
) -> PropertyValues {
    let mut results = PropertyValues::new();

    for (channel, properties) in queries {
        let values = results.entry(channel.clone()).or_default();

        for property in properties {
            let value = match store.get(channel, property) {
                Ok(Some(value)) => value,
                Ok(None) => String::new(),
                Err(e) => {
                    debug!(
                        channel = %channel,
                        property = %property,
                        error = %e,
                        "get failed, treating as unset"
                    );
                    String::new()
                }
            };
            values.insert(property.clone(), value);
        }
    }

    results
}

#[cfg(test)]
pub(crate) mod testing {
    //! 测试用的内存属性存储，记录所有调用

    use super::*;
    use crate::error::XfconfError;
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Set {
            channel: String,
            property: String,
            value: String,
        },
        Reset {
            channel: String,
            property: String,
        },
    }

    #[derive(Default)]
    pub struct FakeStore {
        pub live: RefCell<PropertyValues>,
        pub calls: RefCell<Vec<Call>>,
        /// 对这些 (channel, property) 的写操作返回 Adapter 错误
        pub failing: BTreeSet<(String, String)>,
    }

    impl FakeStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_live(self, channel: &str, property: &str, value: &str) -> Self {
            self.live
                .borrow_mut()
                .entry(channel.to_string())
                .or_default()
                .insert(property.to_string(), value.to_string());
            self
        }

        pub fn failing_on(mut self, channel: &str, property: &str) -> Self {
            self.failing
                .insert((channel.to_string(), property.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn clear_calls(&self) {
            self.calls.borrow_mut().clear();
        }

        fn check_failure(&self, channel: &str, property: &str) -> Result<()> {
            if self
                .failing
                .contains(&(channel.to_string(), property.to_string()))
            {
                return Err(XfconfError::Adapter {
                    status: "exit status: 1".to_string(),
                    output: format!("Property \"{}\" is locked", property),
                }
                .into());
            }
            Ok(())
        }
    }

    impl PropertyStore for FakeStore {
        fn get(&self, channel: &str, property: &str) -> Result<Option<String>> {
            Ok(self
                .live
                .borrow()
                .get(channel)
                .and_then(|props| props.get(property))
                .cloned())
        }

        fn set(
            &self,
            channel: &str,
            property: &str,
            _value_type: &str,
            value: &str,
            _create: bool,
        ) -> Result<()> {
            self.check_failure(channel, property)?;
            self.calls.borrow_mut().push(Call::Set {
                channel: channel.to_string(),
                property: property.to_string(),
                value: value.to_string(),
            });
            self.live
                .borrow_mut()
                .entry(channel.to_string())
                .or_default()
                .insert(property.to_string(), value.to_string());
            Ok(())
        }

        fn reset(&self, channel: &str, property: &str) -> Result<()> {
            self.check_failure(channel, property)?;
            self.calls.borrow_mut().push(Call::Reset {
                channel: channel.to_string(),
                property: property.to_string(),
            });
            if let Some(props) = self.live.borrow_mut().get_mut(channel) {
                props.remove(property);
            }
            Ok(())
        }
    }

    pub fn set(channel: &str, property: &str, value: &str) -> Call {
        Call::Set {
            channel: channel.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        }
    }

    pub fn reset(channel: &str, property: &str) -> Call {
        Call::Reset {
            channel: channel.to_string(),
            property: property.to_string(),
        }
    }
}
