use crate::adapters::line_client::DEFAULT_API_BASE;
use crate::config::{DEFAULT_DATA_FILE, DEFAULT_REPLY_TIMEOUT_SECS};
use crate::core::ConfigProvider;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub line: LineConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Clone, Deserialize)]
pub struct LineConfig {
    pub channel_access_token: String,
    pub channel_secret: String,
    pub api_base: Option<String>,
    pub reply_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

impl std::fmt::Debug for TomlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomlConfig")
            .field("server", &self.server)
            .field("line.channel_access_token", &"<redacted>")
            .field("line.channel_secret", &"<redacted>")
            .field("line.api_base", &self.line.api_base)
            .field("line.reply_timeout_seconds", &self.line.reply_timeout_seconds)
            .field("oracle", &self.oracle)
            .finish()
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BotError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LINE_CHANNEL_SECRET})；找不到的變數保留原樣，交給驗證處理
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| BotError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn host(&self) -> &str {
        &self.server.host
    }

    pub fn port(&self) -> u16 {
        self.server.port
    }
}

impl ConfigProvider for TomlConfig {
    fn channel_access_token(&self) -> &str {
        &self.line.channel_access_token
    }

    fn channel_secret(&self) -> &str {
        &self.line.channel_secret
    }

    fn data_file(&self) -> &str {
        &self.oracle.data_file
    }

    fn api_base_url(&self) -> &str {
        self.line.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    fn reply_timeout_secs(&self) -> u64 {
        self.line
            .reply_timeout_seconds
            .unwrap_or(DEFAULT_REPLY_TIMEOUT_SECS)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_credential("line.channel_access_token", &self.line.channel_access_token)?;
        validate_credential("line.channel_secret", &self.line.channel_secret)?;
        validate_url("line.api_base", self.api_base_url())?;
        validate_range("line.reply_timeout_seconds", self.reply_timeout_secs(), 1, 60)?;

        validate_non_empty_string("server.host", &self.server.host)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;

        validate_path("oracle.data_file", &self.oracle.data_file)?;
        validate_file_extension("oracle.data_file", &self.oracle.data_file, &["csv"])?;

        tracing::info!("✅ TOML configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080

[line]
channel_access_token = "toml-token"
channel_secret = "toml-secret"
api_base = "http://127.0.0.1:9000"
reply_timeout_seconds = 5

[oracle]
data_file = "data/qian.csv"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.channel_access_token(), "toml-token");
        assert_eq!(config.channel_secret(), "toml-secret");
        assert_eq!(config.api_base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.reply_timeout_secs(), 5);
        assert_eq!(config.data_file(), "data/qian.csv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_for_optional_sections() {
        let config = TomlConfig::from_toml_str(
            r#"
[line]
channel_access_token = "t"
channel_secret = "s"
"#,
        )
        .unwrap();

        assert_eq!(config.host(), "0.0.0.0");
        assert_eq!(config.port(), 5000);
        assert_eq!(config.data_file(), DEFAULT_DATA_FILE);
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE);
        assert_eq!(config.reply_timeout_secs(), DEFAULT_REPLY_TIMEOUT_SECS);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("QIAN_BOT_TEST_SECRET_7f3a", "from-env-secret");

        let config = TomlConfig::from_toml_str(
            r#"
[line]
channel_access_token = "t"
channel_secret = "${QIAN_BOT_TEST_SECRET_7f3a}"
"#,
        )
        .unwrap();

        assert_eq!(config.channel_secret(), "from-env-secret");
    }

    #[test]
    fn test_unresolved_placeholder_fails_validation() {
        let config = TomlConfig::from_toml_str(
            r#"
[line]
channel_access_token = "${QIAN_BOT_TEST_UNSET_TOKEN_91c2}"
channel_secret = "s"
"#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(BotError::MissingConfigError { field }) if field == "line.channel_access_token"
        ));
    }

    #[test]
    fn test_missing_line_section_is_config_error() {
        let err = TomlConfig::from_toml_str("[server]\nport = 5000\n").unwrap_err();
        assert!(matches!(err, BotError::ConfigError { .. }));
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bot.toml");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let config = TomlConfig::from_file(&path).unwrap();
        assert_eq!(config.port(), 8080);

        assert!(matches!(
            TomlConfig::from_file(temp_dir.path().join("missing.toml")),
            Err(BotError::IoError(_))
        ));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = TomlConfig::from_toml_str(FULL_CONFIG).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("toml-token"));
        assert!(!debug.contains("toml-secret"));
    }
}
