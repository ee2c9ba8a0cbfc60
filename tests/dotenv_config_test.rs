#![cfg(feature = "cli")]

// 會修改行程環境變數，獨立成一個測試執行檔

use clap::Parser;
use line_qian_bot::config::load_dotenv_from;
use line_qian_bot::core::ConfigProvider;
use line_qian_bot::utils::validation::Validate;
use line_qian_bot::CliConfig;
use tempfile::TempDir;

#[test]
fn test_credentials_are_read_from_dotenv_file() {
    let preset_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN").ok();
    let preset_secret = std::env::var("LINE_CHANNEL_SECRET").ok();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(
        &path,
        "# local credentials\n\
         LINE_CHANNEL_ACCESS_TOKEN=dotenv-access-token\n\
         LINE_CHANNEL_SECRET=\"dotenv-channel-secret\"\n",
    )
    .unwrap();

    assert_eq!(load_dotenv_from(&path).unwrap(), Some(path.clone()));

    let config = CliConfig::try_parse_from(["line-qian-bot"]).unwrap();
    assert!(config.validate().is_ok());

    // 既有的環境變數優先於 .env
    assert_eq!(
        config.channel_access_token(),
        preset_token.as_deref().unwrap_or("dotenv-access-token")
    );
    assert_eq!(
        config.channel_secret(),
        preset_secret.as_deref().unwrap_or("dotenv-channel-secret")
    );
}
