use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// hyper/reqwest 的連線層訊息在 info 下太吵
const SERVER_DIRECTIVES: &str = "line_qian_bot=info,axum=warn,hyper=warn,reqwest=warn";
const SERVER_VERBOSE_DIRECTIVES: &str =
    "line_qian_bot=debug,axum::rejection=trace,hyper=info,reqwest=debug";
const LAMBDA_DIRECTIVES: &str =
    "line_qian_bot=info,lambda_http=info,lambda_runtime=warn,aws_config=warn,aws_smithy_runtime=warn";

/// `RUST_LOG` 優先，否則使用預設指令
fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// webhook 伺服器用：精簡格式，verbose 時顯示模組名稱以便追蹤請求階段
pub fn init_cli_logger(verbose: bool) {
    let filter = if verbose {
        env_filter(SERVER_VERBOSE_DIRECTIVES)
    } else {
        env_filter(SERVER_DIRECTIVES)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Lambda 用：CloudWatch 自帶時間戳，輸出扁平化的 JSON
pub fn init_lambda_logger() {
    tracing_subscriber::registry()
        .with(env_filter(LAMBDA_DIRECTIVES))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .without_time()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        for directives in [SERVER_DIRECTIVES, SERVER_VERBOSE_DIRECTIVES, LAMBDA_DIRECTIVES] {
            assert!(
                EnvFilter::try_new(directives).is_ok(),
                "invalid directives: {}",
                directives
            );
        }
    }

    #[test]
    fn test_bot_logs_are_enabled_by_default() {
        assert!(SERVER_DIRECTIVES.starts_with("line_qian_bot=info"));
        assert!(SERVER_VERBOSE_DIRECTIVES.starts_with("line_qian_bot=debug"));
        assert!(LAMBDA_DIRECTIVES.starts_with("line_qian_bot=info"));
    }
}
