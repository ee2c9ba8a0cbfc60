use clap::Parser;
use line_qian_bot::adapters::server;
use line_qian_bot::config;
use line_qian_bot::core::ConfigProvider;
use line_qian_bot::utils::{logger, validation::Validate};
use line_qian_bot::{
    BotError, ChannelSecretVerifier, CliConfig, Dispatcher, LineMessagingClient, LocalStorage,
    OracleStore, TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 必須在解析參數前載入，clap 才讀得到其中的環境變數
    let dotenv = config::load_dotenv();
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("🚀 Starting line-qian-bot");
    match dotenv {
        Ok(Some(path)) => tracing::info!("📄 Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("⚠️ {}", e),
    }
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = start(cli).await {
        tracing::error!(
            "❌ line-qian-bot stopped: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn start(cli: CliConfig) -> line_qian_bot::Result<()> {
    match cli.config.as_deref() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = TomlConfig::from_file(path)?;
            let (host, port) = (config.host().to_string(), config.port());
            run(config, &host, port).await
        }
        None => {
            let (host, port) = (cli.host.clone(), cli.port);
            run(cli, &host, port).await
        }
    }
}

async fn run<C: ConfigProvider + Validate>(
    config: C,
    host: &str,
    port: u16,
) -> line_qian_bot::Result<()> {
    // 驗證配置 (缺少憑證即停止啟動)
    config.validate()?;

    let oracle = OracleStore::new(LocalStorage::new("."), config.data_file());

    // 啟動時先載入；空資料檔延後到第一次抽籤才報錯
    match oracle.preload().await {
        Ok(count) => tracing::info!("📚 {} oracle entries ready", count),
        Err(BotError::EmptyCorpus) => {
            tracing::warn!(
                "⚠️ Oracle data {} has no entries, replies will fail until it is fixed",
                config.data_file()
            );
        }
        Err(e) => return Err(e),
    }

    let verifier = ChannelSecretVerifier::new(config.channel_secret());
    let sender = LineMessagingClient::from_config(&config)?;
    let dispatcher = Arc::new(Dispatcher::new(oracle, verifier, sender));

    server::serve(host, port, dispatcher, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
