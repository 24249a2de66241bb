use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Setting '{name}' was not found")]
    MissingAttribute { name: String },

    #[error("Malformed derivation target '{target}': {reason}")]
    MalformedTarget { target: String, reason: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Task requested a retry: {reason}")]
    RetryRequested { reason: String },

    #[error("Task '{task}' gave up after {attempts} attempts")]
    MaxRetriesExceeded { task: String, attempts: u32 },

    #[error("Mail delivery failed: {message}")]
    MailError { message: String },
}

impl SettingsError {
    pub fn missing(name: impl Into<String>) -> Self {
        SettingsError::MissingAttribute { name: name.into() }
    }

    pub fn malformed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        SettingsError::MalformedTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// 是否為任務可重試的錯誤
    pub fn is_retry(&self) -> bool {
        matches!(self, SettingsError::RetryRequested { .. })
    }
}

pub type Result<T> = std::result::Result<T, SettingsError>;
