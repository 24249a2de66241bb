use crate::domain::settings::{Setting, Settings};
use crate::theming;
use crate::utils::error::Result;
use serde_json::Value;

/// 已安裝的應用程式，`ready` 在衍生設定套用後執行一次
pub trait AppConfig: Send + Sync {
    fn name(&self) -> &str;
    fn verbose_name(&self) -> &str;

    fn ready(&self, _settings: &mut Settings) -> Result<()> {
        Ok(())
    }
}

pub struct ThemingConfig;

impl AppConfig for ThemingConfig {
    fn name(&self) -> &str {
        "openedx.core.djangoapps.theming"
    }

    fn verbose_name(&self) -> &str {
        "Comprehensive Theming"
    }

    fn ready(&self, settings: &mut Settings) -> Result<()> {
        if settings.bool("ENABLE_COMPREHENSIVE_THEMING").unwrap_or(false) {
            theming::enable_theming(settings)?;
        }
        Ok(())
    }
}

pub struct MicrositeConfigurationConfig;

impl AppConfig for MicrositeConfigurationConfig {
    fn name(&self) -> &str {
        "common.djangoapps.microsite_configuration"
    }

    fn verbose_name(&self) -> &str {
        "Microsite Configuration"
    }

    // Mako 需要在設定完成後才加入 microsite 目錄
    fn ready(&self, settings: &mut Settings) -> Result<()> {
        let enabled = matches!(
            settings.entry("FEATURES", "USE_MICROSITES"),
            Some(Setting::Value(Value::Bool(true)))
        );
        if !enabled {
            return Ok(());
        }
        let Some(root) = settings.str("MICROSITE_ROOT_DIR").map(str::to_string) else {
            tracing::warn!("USE_MICROSITES is set but MICROSITE_ROOT_DIR is not");
            return Ok(());
        };

        let mut dirs: Vec<Value> = match settings.entry("MAKO_TEMPLATES", "main") {
            Some(Setting::Value(Value::Array(items))) => items.clone(),
            _ => Vec::new(),
        };
        let root_value = Value::String(root);
        if !dirs.contains(&root_value) {
            tracing::debug!("Adding microsite root {} to the Mako template path", root_value);
            dirs.insert(0, root_value);
        }
        settings.set_entry("MAKO_TEMPLATES", "main", Value::Array(dirs))
    }
}

/// 讓 bootstrap 知道這是帶有管理指令的應用程式
pub struct UtilConfig;

impl AppConfig for UtilConfig {
    fn name(&self) -> &str {
        "openedx.core.djangoapps.util"
    }

    fn verbose_name(&self) -> &str {
        "Open edX Utilities"
    }
}

pub fn default_apps() -> Vec<Box<dyn AppConfig>> {
    vec![
        Box::new(MicrositeConfigurationConfig),
        Box::new(ThemingConfig),
        Box::new(UtilConfig),
    ]
}
