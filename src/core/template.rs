//! 設定檔中宣告的衍生設定字串範本
//!
//! `"{STATIC_ROOT}/webpack-stats.json"` 由 `STATIC_ROOT` 衍生字串；
//! `"{CONTAINER[key]}"` 讀取容器項目。只有單一佔位符的範本會原樣回傳被引用的值。

use crate::domain::settings::{Setting, Settings};
use crate::utils::error::{Result, SettingsError};
use regex::{Captures, Regex};
use serde_json::Value;

const PLACEHOLDER: &str = r"\{([A-Za-z_][A-Za-z0-9_]*)(?:\[([^\[\]{}]+)\])?\}";

fn placeholder_regex() -> Result<Regex> {
    Regex::new(PLACEHOLDER).map_err(|e| SettingsError::ConfigError {
        message: format!("invalid placeholder pattern: {}", e),
    })
}

/// 將 `source` 包成衍生設定，衍生時才渲染
pub fn template(source: impl Into<String>) -> Setting {
    let source = source.into();
    Setting::derived(move |settings| render(&source, settings))
}

pub fn render(source: &str, settings: &Settings) -> Result<Value> {
    let re = placeholder_regex()?;

    if let Some(caps) = re.captures(source) {
        if caps.get(0).map(|m| m.as_str()) == Some(source) {
            return lookup(settings, &caps);
        }
    }

    let mut failure = None;
    let rendered = re.replace_all(source, |caps: &Captures| match lookup(settings, caps) {
        Ok(Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(e) => {
            if failure.is_none() {
                failure = Some(e);
            }
            String::new()
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(Value::String(rendered.into_owned())),
    }
}

/// 具體值與表格可解析；不存在或仍待衍生的設定視為缺少
fn lookup(settings: &Settings, caps: &Captures) -> Result<Value> {
    let name = &caps[1];
    let (found, label) = match caps.get(2) {
        None => (settings.get(name), name.to_string()),
        Some(key) => (
            settings.entry(name, key.as_str()),
            format!("{}[{}]", name, key.as_str()),
        ),
    };
    match found {
        Some(Setting::Value(value)) => Ok(value.clone()),
        Some(table @ Setting::Table(_)) => Ok(table.to_json()),
        Some(Setting::Derived(_)) | None => Err(SettingsError::missing(label)),
    }
}
