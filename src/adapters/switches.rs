use crate::domain::ports::FeatureSwitches;
use std::collections::HashSet;

/// 靜態的啟用開關集合，鍵為 `namespace.name`
#[derive(Debug, Clone, Default)]
pub struct SwitchSet {
    enabled: HashSet<String>,
}

impl SwitchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_namespace<I, S>(namespace: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut switches = Self::new();
        for name in names {
            switches.enable(format!("{}.{}", namespace, name.as_ref()));
        }
        switches
    }

    pub fn enable(&mut self, name: impl Into<String>) {
        self.enabled.insert(name.into());
    }
}

impl FeatureSwitches for SwitchSet {
    fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }
}
