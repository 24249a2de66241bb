use crate::app::tasks::retry::RetryPolicy;
use crate::config::profiles::Profile;
use crate::core::template::template;
use crate::core::{Bootstrap, DerivationRegistry, DerivationTarget, Settings};
use crate::utils::error::{Result, SettingsError};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SAILTHRU_API_URL: &str = "https://api.sailthru.com";

/// 設定檔：`[settings]` 數值、`[derived]` 範本，以及 `[marketing]` / `[email]` 任務區段
#[derive(Debug, Clone, Default)]
pub struct SettingsFile {
    pub settings: Map<String, Value>,
    pub derived: Vec<(String, String)>,
    pub marketing: Option<MarketingConfig>,
    pub email: Option<EmailConfig>,
}

/// Sailthru 整合設定 (`EmailMarketingConfiguration`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sailthru_key: String,
    #[serde(default)]
    pub sailthru_secret: String,
    pub sailthru_enroll_template: Option<String>,
    #[serde(default = "default_retry_interval")]
    pub sailthru_retry_interval: u64,
    #[serde(default = "default_max_retries")]
    pub sailthru_max_retries: u32,
    #[serde(default = "default_content_cache_age")]
    pub sailthru_content_cache_age: u64,
    #[serde(default = "default_api_url")]
    pub sailthru_api_url: String,
    /// `sailthru` 命名空間下啟用的開關，例如 `audit_purchase_enabled`
    #[serde(default)]
    pub switches: Vec<String>,
}

fn default_retry_interval() -> u64 {
    3600
}

fn default_max_retries() -> u32 {
    3
}

fn default_content_cache_age() -> u64 {
    3600
}

/// 一年
const MAX_CONTENT_CACHE_AGE: u64 = 365 * 24 * 3600;

fn default_api_url() -> String {
    DEFAULT_SAILTHRU_API_URL.to_string()
}

impl Default for MarketingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sailthru_key: String::new(),
            sailthru_secret: String::new(),
            sailthru_enroll_template: None,
            sailthru_retry_interval: default_retry_interval(),
            sailthru_max_retries: default_max_retries(),
            sailthru_content_cache_age: default_content_cache_age(),
            sailthru_api_url: default_api_url(),
            switches: Vec::new(),
        }
    }
}

impl MarketingConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.sailthru_retry_interval),
            self.sailthru_max_retries,
        )
    }

    pub fn content_cache_age(&self) -> Duration {
        Duration::from_secs(self.sailthru_content_cache_age)
    }
}

impl Validate for MarketingConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        validate_non_empty_string("marketing.sailthru_key", &self.sailthru_key)?;
        validate_non_empty_string("marketing.sailthru_secret", &self.sailthru_secret)?;
        validate_url("marketing.sailthru_api_url", &self.sailthru_api_url)?;
        validate_positive_number(
            "marketing.sailthru_max_retries",
            u64::from(self.sailthru_max_retries),
            1,
        )?;
        validate_range(
            "marketing.sailthru_content_cache_age",
            self.sailthru_content_cache_age,
            0,
            MAX_CONTENT_CACHE_AGE,
        )?;
        Ok(())
    }
}

/// 啟用信重試設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_activation_attempts")]
    pub retry_activation_email_max_attempts: u32,
    /// 每次嘗試間隔秒數
    #[serde(default = "default_activation_timeout")]
    pub retry_activation_email_timeout: f64,
}

fn default_activation_attempts() -> u32 {
    5
}

fn default_activation_timeout() -> f64 {
    0.5
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            retry_activation_email_max_attempts: default_activation_attempts(),
            retry_activation_email_timeout: default_activation_timeout(),
        }
    }
}

impl EmailConfig {
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let countdown = Duration::try_from_secs_f64(self.retry_activation_email_timeout).map_err(
            |e| SettingsError::InvalidConfigValueError {
                field: "email.retry_activation_email_timeout".to_string(),
                value: self.retry_activation_email_timeout.to_string(),
                reason: e.to_string(),
            },
        )?;
        Ok(RetryPolicy::new(
            countdown,
            self.retry_activation_email_max_attempts,
        ))
    }
}

impl Validate for EmailConfig {
    fn validate(&self) -> Result<()> {
        validate_range(
            "email.retry_activation_email_timeout",
            self.retry_activation_email_timeout,
            0.0,
            3600.0,
        )?;
        self.retry_policy().map(|_| ())
    }
}

impl SettingsFile {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::debug!("Loaded settings file {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        let mut table: toml::Table = toml::from_str(&processed)?;

        let settings = match table.remove("settings") {
            Some(toml::Value::Table(section)) => {
                match serde_json::to_value(toml::Value::Table(section))? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                }
            }
            Some(_) => {
                return Err(SettingsError::ConfigError {
                    message: "[settings] must be a table".to_string(),
                })
            }
            None => Map::new(),
        };

        let mut derived = Vec::new();
        match table.remove("derived") {
            Some(toml::Value::Table(section)) => {
                for (target, value) in section {
                    match value {
                        toml::Value::String(source) => derived.push((target, source)),
                        other => tracing::warn!(
                            "Ignoring derived setting '{}': expected a template string, got {}",
                            target,
                            other.type_str()
                        ),
                    }
                }
            }
            Some(_) => {
                return Err(SettingsError::ConfigError {
                    message: "[derived] must be a table".to_string(),
                })
            }
            None => {}
        }

        let marketing = table
            .remove("marketing")
            .map(|section| section.try_into::<MarketingConfig>())
            .transpose()?;
        let email = table
            .remove("email")
            .map(|section| section.try_into::<EmailConfig>())
            .transpose()?;

        for unknown in table.keys() {
            tracing::warn!("Ignoring unknown settings section [{}]", unknown);
        }

        Ok(Self {
            settings,
            derived,
            marketing,
            email,
        })
    }

    /// 替換環境變數 (例如 ${LMS_BASE})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SettingsError::ConfigError {
            message: format!("invalid env pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn to_settings(&self) -> Settings {
        Settings::from_json(self.settings.clone())
    }

    /// 在尚無具體值的位置安裝 `[derived]` 範本並註冊目標，格式錯誤的目標記錄後略過
    pub fn register_derived(&self, settings: &mut Settings, registry: &mut DerivationRegistry) {
        for (declared, source) in &self.derived {
            let target = match DerivationTarget::parse(declared) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!("Ignoring derived setting declaration: {}", e);
                    continue;
                }
            };

            match &target {
                DerivationTarget::Name(name) => {
                    if !settings.contains(name) {
                        settings.set(name.as_str(), template(source.as_str()));
                    }
                }
                DerivationTarget::Entry { container, key } => {
                    if settings.entry(container, key).is_none() {
                        if let Err(e) = settings.set_entry(container, key, template(source.as_str()))
                        {
                            tracing::warn!("Ignoring derived setting '{}': {}", declared, e);
                            continue;
                        }
                    }
                }
                DerivationTarget::Accessor(_) => {}
            }
            registry.register([target]);
        }
    }

    /// 套用 `profile` 後回傳設定與待完成的 bootstrap
    pub fn bootstrap(&self, profile: Profile) -> Result<(Settings, Bootstrap)> {
        let mut settings = self.to_settings();
        let mut registry = DerivationRegistry::new();
        self.register_derived(&mut settings, &mut registry);
        profile.apply(&mut settings, &mut registry)?;
        Ok((settings, Bootstrap::with_default_apps(registry)))
    }

    pub fn marketing(&self) -> MarketingConfig {
        self.marketing.clone().unwrap_or_default()
    }

    pub fn email(&self) -> EmailConfig {
        self.email.clone().unwrap_or_default()
    }
}

impl Validate for SettingsFile {
    fn validate(&self) -> Result<()> {
        if let Some(root) = self.settings.get("LMS_ROOT_URL") {
            match root.as_str() {
                Some(url) => validate_url("settings.LMS_ROOT_URL", url)?,
                None => {
                    return Err(SettingsError::InvalidConfigValueError {
                        field: "settings.LMS_ROOT_URL".to_string(),
                        value: root.to_string(),
                        reason: "Expected a string".to_string(),
                    })
                }
            }
        }

        if let Some(Value::Array(dirs)) = self.settings.get("COMPREHENSIVE_THEME_DIRS") {
            for dir in dirs {
                validate_path(
                    "settings.COMPREHENSIVE_THEME_DIRS",
                    dir.as_str().unwrap_or_default(),
                )?;
            }
        }

        if let Some(marketing) = &self.marketing {
            marketing.validate()?;
        }
        if let Some(email) = &self.email {
            email.validate()?;
        }
        Ok(())
    }
}
