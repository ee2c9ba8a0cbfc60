pub mod cli;
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::validation::Validate;
#[cfg(feature = "cli")]
use clap::Parser;

use crate::utils::error::{BotError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "cleaned_qian_data.csv";
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 10;

/// 從工作目錄 (或其上層目錄) 的 `.env` 載入環境變數。
///
/// 已存在的環境變數不會被覆蓋；找不到 `.env` 時回傳 `Ok(None)`。
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) => dotenv_error(e),
    }
}

/// 從指定路徑載入 `.env`，規則同 [`load_dotenv`]
pub fn load_dotenv_from<P: AsRef<Path>>(path: P) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) => dotenv_error(e),
    }
}

fn dotenv_error(e: dotenvy::Error) -> Result<Option<PathBuf>> {
    if e.not_found() {
        return Ok(None);
    }
    Err(BotError::ConfigError {
        message: format!("cannot load .env file: {}", e),
    })
}

#[cfg(feature = "cli")]
#[derive(Clone, Parser)]
#[command(name = "line-qian-bot")]
#[command(about = "LINE webhook bot that replies with a randomly drawn temple fortune")]
pub struct CliConfig {
    #[arg(long, env = "LINE_CHANNEL_ACCESS_TOKEN", hide_env_values = true)]
    pub channel_access_token: Option<String>,

    #[arg(long, env = "LINE_CHANNEL_SECRET", hide_env_values = true)]
    pub channel_secret: Option<String>,

    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    #[arg(long, env = "QIAN_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: String,

    #[arg(long, env = "LINE_API_BASE", default_value = crate::adapters::line_client::DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, default_value_t = DEFAULT_REPLY_TIMEOUT_SECS)]
    pub reply_timeout_secs: u64,

    /// Path to TOML configuration file (overrides the flags above)
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("channel_access_token", &redacted(&self.channel_access_token))
            .field("channel_secret", &redacted(&self.channel_secret))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_file", &self.data_file)
            .field("api_base", &self.api_base)
            .field("reply_timeout_secs", &self.reply_timeout_secs)
            .field("config", &self.config)
            .field("verbose", &self.verbose)
            .finish()
    }
}

#[cfg(feature = "cli")]
fn redacted(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn channel_access_token(&self) -> &str {
        self.channel_access_token.as_deref().unwrap_or_default()
    }

    fn channel_secret(&self) -> &str {
        self.channel_secret.as_deref().unwrap_or_default()
    }

    fn data_file(&self) -> &str {
        &self.data_file
    }

    fn api_base_url(&self) -> &str {
        &self.api_base
    }

    fn reply_timeout_secs(&self) -> u64 {
        self.reply_timeout_secs
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::*;

        // 兩個憑證缺一不可
        let token = validate_required_field("LINE_CHANNEL_ACCESS_TOKEN", &self.channel_access_token)?;
        validate_credential("LINE_CHANNEL_ACCESS_TOKEN", token)?;
        let secret = validate_required_field("LINE_CHANNEL_SECRET", &self.channel_secret)?;
        validate_credential("LINE_CHANNEL_SECRET", secret)?;

        validate_non_empty_string("host", &self.host)?;
        validate_range("port", self.port, 1, u16::MAX)?;
        validate_path("data_file", &self.data_file)?;
        validate_file_extension("data_file", &self.data_file, &["csv"])?;
        validate_url("api_base", &self.api_base)?;
        validate_range("reply_timeout_secs", self.reply_timeout_secs, 1, 60)?;

        tracing::info!("✅ CLI configuration validation passed");
        Ok(())
    }
}
