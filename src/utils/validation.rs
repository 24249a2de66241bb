use crate::utils::error::{Result, SettingsError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SettingsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SettingsError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SettingsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SettingsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SettingsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(SettingsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SettingsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SettingsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("LMS_ROOT_URL", "https://example.com").is_ok());
        assert!(validate_url("LMS_ROOT_URL", "http://lms.testserver.fake").is_ok());
        assert!(validate_url("LMS_ROOT_URL", "").is_err());
        assert!(validate_url("LMS_ROOT_URL", "invalid-url").is_err());
        assert!(validate_url("LMS_ROOT_URL", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("COMPREHENSIVE_THEME_DIRS", "/edx/app/themes").is_ok());
        assert!(validate_path("COMPREHENSIVE_THEME_DIRS", "").is_err());
        assert!(validate_path("COMPREHENSIVE_THEME_DIRS", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("sailthru_max_retries", 3, 1).is_ok());
        assert!(validate_positive_number("sailthru_max_retries", 0, 1).is_err());
    }

    #[test]
    fn test_validate_non_empty_and_range() {
        assert!(validate_non_empty_string("sailthru_key", "abc").is_ok());
        assert!(validate_non_empty_string("sailthru_key", "   ").is_err());
        assert!(validate_range("timeout", 0.5, 0.0, 60.0).is_ok());
        assert!(validate_range("timeout", -1.0, 0.0, 60.0).is_err());
    }
}
