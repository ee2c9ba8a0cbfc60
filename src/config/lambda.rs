#[cfg(feature = "lambda")]
use crate::adapters::line_client::DEFAULT_API_BASE;
#[cfg(feature = "lambda")]
use crate::config::{DEFAULT_DATA_FILE, DEFAULT_REPLY_TIMEOUT_SECS};
#[cfg(feature = "lambda")]
use crate::core::{ConfigProvider, Storage};
#[cfg(feature = "lambda")]
use crate::utils::error::{BotError, Result};
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::env;

#[cfg(feature = "lambda")]
#[derive(Clone)]
pub struct LambdaConfig {
    pub channel_access_token: String,
    pub channel_secret: String,
    pub s3_bucket: String,
    pub s3_data_key: String,
    pub s3_region: String,
    pub api_base: String,
    pub reply_timeout_secs: u64,
}

#[cfg(feature = "lambda")]
impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            channel_access_token: required_env("LINE_CHANNEL_ACCESS_TOKEN")?,
            channel_secret: required_env("LINE_CHANNEL_SECRET")?,
            s3_bucket: required_env("S3_BUCKET")?,
            s3_data_key: env::var("S3_DATA_KEY").unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string()),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-northeast-1".to_string()),
            api_base: env::var("LINE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            reply_timeout_secs: env::var("REPLY_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_REPLY_TIMEOUT_SECS),
        })
    }
}

#[cfg(feature = "lambda")]
fn required_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| BotError::MissingConfigError {
        field: name.to_string(),
    })
}

#[cfg(feature = "lambda")]
impl std::fmt::Debug for LambdaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambdaConfig")
            .field("channel_access_token", &"<redacted>")
            .field("channel_secret", &"<redacted>")
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_data_key", &self.s3_data_key)
            .field("s3_region", &self.s3_region)
            .field("api_base", &self.api_base)
            .field("reply_timeout_secs", &self.reply_timeout_secs)
            .finish()
    }
}

#[cfg(feature = "lambda")]
impl ConfigProvider for LambdaConfig {
    fn channel_access_token(&self) -> &str {
        &self.channel_access_token
    }

    fn channel_secret(&self) -> &str {
        &self.channel_secret
    }

    fn data_file(&self) -> &str {
        &self.s3_data_key
    }

    fn api_base_url(&self) -> &str {
        &self.api_base
    }

    fn reply_timeout_secs(&self) -> u64 {
        self.reply_timeout_secs
    }
}

#[cfg(feature = "lambda")]
impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::*;

        validate_credential("LINE_CHANNEL_ACCESS_TOKEN", &self.channel_access_token)?;
        validate_credential("LINE_CHANNEL_SECRET", &self.channel_secret)?;

        // 驗證S3 bucket名稱
        validate_s3_bucket_name("S3_BUCKET", &self.s3_bucket)?;
        validate_non_empty_string("S3_DATA_KEY", &self.s3_data_key)?;
        validate_file_extension("S3_DATA_KEY", &self.s3_data_key, &["csv"])?;
        validate_aws_region("S3_REGION", &self.s3_region)?;

        validate_url("LINE_API_BASE", &self.api_base)?;
        validate_range("REPLY_TIMEOUT_SECS", self.reply_timeout_secs, 1, 60)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    let invalid = |reason: &str| BotError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: bucket_name.to_string(),
        reason: reason.to_string(),
    };

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid("S3 bucket name must be between 3 and 63 characters"));
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid("S3 bucket name cannot start or end with a hyphen"));
    }

    Ok(())
}

#[cfg(feature = "lambda")]
fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(BotError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// 從 S3 讀取籤詩資料檔
#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let location = format!("s3://{}/{}", self.bucket, path);

        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| BotError::DataUnavailable {
                path: location.clone(),
                reason: format!("Failed to read from S3: {}", e),
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| BotError::DataUnavailable {
                path: location,
                reason: format!("Failed to collect S3 data: {}", e),
            })?;

        Ok(data.into_bytes().to_vec())
    }
}

#[cfg(all(test, feature = "lambda"))]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;

    fn config() -> LambdaConfig {
        LambdaConfig {
            channel_access_token: "token".to_string(),
            channel_secret: "secret".to_string(),
            s3_bucket: "qian-data".to_string(),
            s3_data_key: DEFAULT_DATA_FILE.to_string(),
            s3_region: "ap-northeast-1".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            reply_timeout_secs: DEFAULT_REPLY_TIMEOUT_SECS,
        }
    }

    #[test]
    fn test_valid_lambda_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_invalid_bucket_and_region() {
        let mut bad_bucket = config();
        bad_bucket.s3_bucket = "Qian_Data".to_string();
        assert!(bad_bucket.validate().is_err());

        let mut bad_region = config();
        bad_region.s3_region = "AP NORTHEAST".to_string();
        assert!(bad_region.validate().is_err());
    }

    #[test]
    fn test_blank_secret_is_missing() {
        let mut blank = config();
        blank.channel_secret = String::new();
        assert!(matches!(
            blank.validate(),
            Err(BotError::MissingConfigError { .. })
        ));
    }
}
