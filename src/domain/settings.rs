//! 衍生設定作用的設定物件
//!
//! [`Settings`] 將設定名稱對應到 [`Setting`]。JSON 物件一律存成
//! [`Setting::Table`]，`(container, key)` 目標與巢狀路徑才能直接存取其項目。

use crate::utils::error::{Result, SettingsError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// 延遲計算的設定：由其他設定計算出值
pub type DeriveFn = Arc<dyn Fn(&Settings) -> Result<Value> + Send + Sync>;

#[derive(Clone)]
pub enum Setting {
    Value(Value),
    Derived(DeriveFn),
    Table(BTreeMap<String, Setting>),
}

impl Setting {
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Settings) -> Result<Value> + Send + Sync + 'static,
    {
        Setting::Derived(Arc::new(f))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Setting::Derived(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Setting::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&BTreeMap<String, Setting>> {
        match self {
            Setting::Table(table) => Some(table),
            _ => None,
        }
    }

    /// 具體的 JSON 形式，尚未套用的衍生項目輸出為 `null`
    pub fn to_json(&self) -> Value {
        match self {
            Setting::Value(value) => value.clone(),
            Setting::Derived(_) => Value::Null,
            Setting::Table(table) => Value::Object(
                table
                    .iter()
                    .map(|(key, setting)| (key.clone(), setting.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Value(value) => write!(f, "Value({})", value),
            Setting::Derived(_) => f.write_str("Derived(<fn>)"),
            Setting::Table(table) => f.debug_map().entries(table.iter()).finish(),
        }
    }
}

impl From<Value> for Setting {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Setting::Table(
                map.into_iter()
                    .map(|(key, value)| (key, Setting::from(value)))
                    .collect(),
            ),
            other => Setting::Value(other),
        }
    }
}

impl From<&str> for Setting {
    fn from(value: &str) -> Self {
        Setting::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Setting {
    fn from(value: String) -> Self {
        Setting::Value(Value::String(value))
    }
}

impl From<bool> for Setting {
    fn from(value: bool) -> Self {
        Setting::Value(Value::Bool(value))
    }
}

impl From<i64> for Setting {
    fn from(value: i64) -> Self {
        Setting::Value(Value::from(value))
    }
}

impl From<BTreeMap<String, Setting>> for Setting {
    fn from(table: BTreeMap<String, Setting>) -> Self {
        Setting::Table(table)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    entries: BTreeMap<String, Setting>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 物件建立設定
    pub fn from_json(map: Map<String, Value>) -> Self {
        let mut settings = Self::new();
        settings.merge_json(map);
        settings
    }

    /// `map` 的頂層鍵會取代既有項目
    pub fn merge_json(&mut self, map: Map<String, Value>) {
        for (name, value) in map {
            self.entries.insert(name, Setting::from(value));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Setting> {
        self.entries.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, setting: impl Into<Setting>) {
        self.entries.insert(name.into(), setting.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Setting> {
        self.entries.remove(name)
    }

    /// `name` 的具體值；不存在、為表格或仍待衍生時為 `None`
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Setting::as_value)
    }

    pub fn require(&self, name: &str) -> Result<&Value> {
        self.value(name).ok_or_else(|| SettingsError::missing(name))
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    pub fn require_str(&self, name: &str) -> Result<&str> {
        self.str(name).ok_or_else(|| SettingsError::missing(name))
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    /// 將字串清單設定轉為路徑，非字串元素略過
    pub fn paths(&self, name: &str) -> Vec<PathBuf> {
        match self.value(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(PathBuf::from)
                .collect(),
            Some(Value::String(single)) => vec![PathBuf::from(single)],
            _ => Vec::new(),
        }
    }

    /// `<container>[<key>]`
    pub fn entry(&self, container: &str, key: &str) -> Option<&Setting> {
        self.get(container)
            .and_then(Setting::as_table)
            .and_then(|table| table.get(key))
    }

    /// 寫入 `<container>[<key>]`，容器不存在時自動建立
    pub fn set_entry(
        &mut self,
        container: &str,
        key: &str,
        setting: impl Into<Setting>,
    ) -> Result<()> {
        self.set_path(&[container, key], setting)
    }

    /// 解析巢狀路徑，例如 `["WEBPACK_LOADER", "DEFAULT", "STATS_FILE"]`
    pub fn lookup_path(&self, path: &[&str]) -> Option<&Setting> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get(first)?;
        for segment in rest {
            current = current.as_table()?.get(*segment)?;
        }
        Some(current)
    }

    /// 寫入巢狀路徑，自動建立尚不存在的中間表格
    pub fn set_path(&mut self, path: &[&str], setting: impl Into<Setting>) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            return Err(SettingsError::malformed("", "empty setting path"));
        };
        let Some((first, middle)) = parents.split_first() else {
            self.set(*last, setting);
            return Ok(());
        };

        let mut current = self
            .entries
            .entry(first.to_string())
            .or_insert_with(|| Setting::Table(BTreeMap::new()));
        for segment in middle {
            current = match current {
                Setting::Table(table) => table
                    .entry(segment.to_string())
                    .or_insert_with(|| Setting::Table(BTreeMap::new())),
                _ => {
                    return Err(SettingsError::malformed(
                        path.join("."),
                        format!("'{}' is not a container", segment),
                    ))
                }
            };
        }

        match current {
            Setting::Table(table) => {
                table.insert(last.to_string(), setting.into());
                Ok(())
            }
            _ => Err(SettingsError::malformed(
                path.join("."),
                "parent is not a container",
            )),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(name, setting)| (name.clone(), setting.to_json()))
                .collect(),
        )
    }
}
