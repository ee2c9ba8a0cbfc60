use crate::utils::error::{BotError, Result};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(BotError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extension(field_name: &str, file: &str, allowed_extensions: &[&str]) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    match std::path::Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => Ok(()),
        Some(extension) => Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                extension,
                allowed_extensions.join(", ")
            ),
        }),
        None => Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: file.to_string(),
            reason: "File has no extension or invalid filename".to_string(),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| BotError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 憑證必須存在且不能是未替換的 `${VAR}` 佔位字
pub fn validate_credential(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() || (value.starts_with("${") && value.ends_with('}')) {
        return Err(BotError::MissingConfigError {
            field: field_name.to_string(),
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
        return Err(BotError::InvalidConfigValueError {
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
        assert!(validate_url("api_base", "https://api.line.me").is_ok());
        assert!(validate_url("api_base", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("api_base", "").is_err());
        assert!(validate_url("api_base", "invalid-url").is_err());
        assert!(validate_url("api_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_credential() {
        assert!(validate_credential("LINE_CHANNEL_SECRET", "abc123").is_ok());
        assert!(matches!(
            validate_credential("LINE_CHANNEL_SECRET", "   "),
            Err(BotError::MissingConfigError { .. })
        ));
        assert!(matches!(
            validate_credential("LINE_CHANNEL_SECRET", "${LINE_CHANNEL_SECRET}"),
            Err(BotError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("data_file", "cleaned_qian_data.csv", &["csv"]).is_ok());
        assert!(validate_file_extension("data_file", "DATA.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("data_file", "data.xlsx", &["csv"]).is_err());
        assert!(validate_file_extension("data_file", "data", &["csv"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("port", 5000u16, 1, u16::MAX).is_ok());
        assert!(validate_range("port", 0u16, 1, u16::MAX).is_err());
    }
}
