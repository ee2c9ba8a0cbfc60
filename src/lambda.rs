#[cfg(feature = "lambda")]
use aws_config::BehaviorVersion;
#[cfg(feature = "lambda")]
use aws_sdk_s3::config::Region;
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use lambda_http::http::{Method, StatusCode};
#[cfg(feature = "lambda")]
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
#[cfg(feature = "lambda")]
use line_qian_bot::core::signature::SIGNATURE_HEADER;
#[cfg(feature = "lambda")]
use line_qian_bot::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use line_qian_bot::{
    BotError, ChannelSecretVerifier, Dispatcher, LambdaConfig, LineMessagingClient, OracleStore,
    S3Storage,
};

#[cfg(feature = "lambda")]
const CALLBACK_PATH: &str = "/callback";

#[cfg(feature = "lambda")]
type LambdaDispatcher =
    Dispatcher<OracleStore<S3Storage>, ChannelSecretVerifier, LineMessagingClient>;

/// REST API Gateway 的 `uri()` 會帶上 stage (例如 `/prod/callback`)，
/// 路由改用不含 stage 的原始路徑；沒有該資訊時退回 `uri()`。
#[cfg(feature = "lambda")]
fn request_path(event: &Request) -> &str {
    match event.raw_http_path() {
        "" => event.uri().path(),
        raw => raw,
    }
}

/// 不屬於 `POST /callback` 的請求直接回應的狀態碼
#[cfg(feature = "lambda")]
fn rejected_route(event: &Request) -> Option<StatusCode> {
    if request_path(event) != CALLBACK_PATH {
        return Some(StatusCode::NOT_FOUND);
    }
    if event.method() != Method::POST {
        return Some(StatusCode::METHOD_NOT_ALLOWED);
    }
    None
}

#[cfg(feature = "lambda")]
async fn function_handler(
    dispatcher: &LambdaDispatcher,
    event: Request,
) -> Result<Response<Body>, Error> {
    if let Some(status) = rejected_route(&event) {
        tracing::debug!(
            "Rejected {} {} with {}",
            event.method(),
            request_path(&event),
            status
        );
        return Ok(Response::builder()
            .status(status)
            .body(Body::from(status.canonical_reason().unwrap_or_default()))?);
    }

    let signature = event
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let outcome = dispatcher
        .handle_request(event.body().as_ref(), signature)
        .await;

    Ok(Response::builder()
        .status(outcome.status_code())
        .body(Body::from(outcome.body()))?)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();
    tracing::info!("Starting line-qian-bot Lambda function");

    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    // 創建AWS配置和S3客戶端
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let s3_client = S3Client::from_conf(config);

    let storage = S3Storage::new(s3_client, lambda_config.s3_bucket.clone());
    let oracle = OracleStore::new(storage, lambda_config.s3_data_key.clone());

    // 冷啟動時預先載入；空資料檔延後到第一次抽籤才報錯
    match oracle.preload().await {
        Ok(count) => tracing::info!("📚 {} oracle entries ready", count),
        Err(BotError::EmptyCorpus) => tracing::warn!("⚠️ Oracle data has no entries"),
        Err(e) => return Err(e.into()),
    }

    let verifier = ChannelSecretVerifier::new(lambda_config.channel_secret.clone());
    let sender = LineMessagingClient::from_config(&lambda_config)?;
    let dispatcher = Dispatcher::new(oracle, verifier, sender);
    let dispatcher = &dispatcher;

    run(service_fn(move |event: Request| async move {
        function_handler(dispatcher, event).await
    }))
    .await
}
