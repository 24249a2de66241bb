//! 由其他設定衍生而來的設定
//!
//! 衍生設定在 [`DerivationRegistry::apply`] 執行前保存一個可呼叫物件，
//! 執行時以整個設定呼叫它並以結果取代。事先將已註冊的名稱設為具體值即可覆寫衍生。

use crate::domain::settings::{Setting, Settings};
use crate::utils::error::{Result, SettingsError};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Getter = Arc<dyn Fn(&Settings) -> Option<Setting> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut Settings, Value) -> Result<()> + Send + Sync>;

/// 名稱或 `(container, key)` 無法觸及的目標所用的 getter/setter
#[derive(Clone)]
pub struct Accessor {
    label: String,
    getter: Getter,
    setter: Setter,
}

impl Accessor {
    pub fn new<G, S>(label: impl Into<String>, getter: G, setter: S) -> Self
    where
        G: Fn(&Settings) -> Option<Setting> + Send + Sync + 'static,
        S: Fn(&mut Settings, Value) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            getter: Arc::new(getter),
            setter: Arc::new(setter),
        }
    }

    /// 任意巢狀項目的存取器，例如 `WEBPACK_LOADER[DEFAULT][STATS_FILE]`
    pub fn nested(path: &[&str]) -> Self {
        let owned: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        let label = match owned.split_first() {
            Some((first, rest)) => {
                let keys: String = rest.iter().map(|key| format!("[{}]", key)).collect();
                format!("{}{}", first, keys)
            }
            None => String::new(),
        };
        let get_path = owned.clone();
        Self::new(
            label,
            move |settings| {
                let path: Vec<&str> = get_path.iter().map(String::as_str).collect();
                settings.lookup_path(&path).cloned()
            },
            move |settings, value| {
                let path: Vec<&str> = owned.iter().map(String::as_str).collect();
                settings.set_path(&path, value)
            },
        )
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor").field("label", &self.label).finish()
    }
}

#[derive(Debug, Clone)]
pub enum DerivationTarget {
    Name(String),
    Entry { container: String, key: String },
    Accessor(Accessor),
}

impl DerivationTarget {
    /// 解析設定檔中宣告的目標：`NAME` 或 `CONTAINER[key]`
    pub fn parse(declared: &str) -> Result<Self> {
        let declared = declared.trim();
        if declared.is_empty() {
            return Err(SettingsError::malformed(declared, "target is empty"));
        }

        match declared.find('[') {
            None => {
                if declared.contains(']') {
                    return Err(SettingsError::malformed(declared, "unbalanced ']'"));
                }
                Ok(DerivationTarget::Name(declared.to_string()))
            }
            Some(open) => {
                let container = &declared[..open];
                let Some(key) = declared[open + 1..].strip_suffix(']') else {
                    return Err(SettingsError::malformed(declared, "missing closing ']'"));
                };
                if container.is_empty() || key.is_empty() {
                    return Err(SettingsError::malformed(
                        declared,
                        "expected CONTAINER[key]",
                    ));
                }
                if key.contains('[') || key.contains(']') {
                    return Err(SettingsError::malformed(
                        declared,
                        "only one level of nesting is supported",
                    ));
                }
                Ok(DerivationTarget::Entry {
                    container: container.to_string(),
                    key: key.to_string(),
                })
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            DerivationTarget::Name(name) => name.clone(),
            DerivationTarget::Entry { container, key } => format!("{}[{}]", container, key),
            DerivationTarget::Accessor(accessor) => accessor.label().to_string(),
        }
    }
}

impl From<&str> for DerivationTarget {
    fn from(name: &str) -> Self {
        DerivationTarget::Name(name.to_string())
    }
}

impl From<String> for DerivationTarget {
    fn from(name: String) -> Self {
        DerivationTarget::Name(name)
    }
}

impl From<(&str, &str)> for DerivationTarget {
    fn from((container, key): (&str, &str)) -> Self {
        DerivationTarget::Entry {
            container: container.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<Accessor> for DerivationTarget {
    fn from(accessor: Accessor) -> Self {
        DerivationTarget::Accessor(accessor)
    }
}

enum Outcome {
    Derived(Value),
    Concrete,
}

/// 待衍生設定的有序清單
#[derive(Debug, Clone, Default)]
pub struct DerivationRegistry {
    targets: Vec<DerivationTarget>,
}

impl DerivationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 註冊衍生設定，可重複呼叫；同一名稱註冊兩次就會衍生兩次
    pub fn register<I, T>(&mut self, targets: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<DerivationTarget>,
    {
        self.targets.extend(targets.into_iter().map(Into::into));
    }

    /// 註冊以字串宣告的目標，格式錯誤的宣告記錄後忽略
    pub fn register_declared<I, S>(&mut self, declared: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for item in declared {
            match DerivationTarget::parse(item.as_ref()) {
                Ok(target) => self.targets.push(target),
                Err(e) => tracing::warn!("Ignoring derived setting declaration: {}", e),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> &[DerivationTarget] {
        &self.targets
    }

    /// 清空註冊表 (測試之間使用)
    pub fn reset(&mut self) {
        self.targets.clear();
    }

    /// 依註冊順序衍生所有設定
    ///
    /// 已有具體值的目標會略過；失敗只記錄，不會中斷其餘的衍生。
    pub fn apply(&self, settings: &mut Settings) {
        tracing::debug!("Deriving {} registered settings", self.targets.len());

        for target in &self.targets {
            match Self::derive_one(target, settings) {
                Ok(Outcome::Derived(value)) => {
                    tracing::info!("Setting '{}' to derived value '{}'", target.label(), value);
                }
                Ok(Outcome::Concrete) => {
                    tracing::debug!("Setting '{}' already has a value, skipping", target.label());
                }
                Err(SettingsError::MissingAttribute { name }) => {
                    tracing::warn!(
                        "Derived setting '{}' was not found - ignoring. (missing '{}')",
                        target.label(),
                        name
                    );
                }
                Err(e) => {
                    tracing::warn!("Could not derive setting '{}': {}", target.label(), e);
                }
            }
        }
    }

    fn derive_one(target: &DerivationTarget, settings: &mut Settings) -> Result<Outcome> {
        match target {
            DerivationTarget::Name(name) => {
                let current = settings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SettingsError::missing(name.as_str()))?;
                let Setting::Derived(derive) = current else {
                    return Ok(Outcome::Concrete);
                };
                let value = derive(&*settings)?;
                settings.set(name.as_str(), value.clone());
                Ok(Outcome::Derived(value))
            }
            DerivationTarget::Entry { container, key } => {
                let table = settings
                    .get(container)
                    .ok_or_else(|| SettingsError::missing(container.as_str()))?;
                let Some(table) = table.as_table() else {
                    return Err(SettingsError::malformed(
                        target.label(),
                        format!("'{}' is not a container", container),
                    ));
                };
                let current = table
                    .get(key)
                    .cloned()
                    .ok_or_else(|| SettingsError::missing(target.label()))?;
                let Setting::Derived(derive) = current else {
                    return Ok(Outcome::Concrete);
                };
                let value = derive(&*settings)?;
                settings.set_entry(container, key, value.clone())?;
                Ok(Outcome::Derived(value))
            }
            DerivationTarget::Accessor(accessor) => {
                let current = (accessor.getter)(&*settings)
                    .ok_or_else(|| SettingsError::missing(accessor.label()))?;
                let Setting::Derived(derive) = current else {
                    return Ok(Outcome::Concrete);
                };
                let value = derive(&*settings)?;
                (accessor.setter)(settings, value.clone())?;
                Ok(Outcome::Derived(value))
            }
        }
    }
}
