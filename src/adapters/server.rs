use crate::core::dispatch::Dispatcher;
use crate::core::signature::SIGNATURE_HEADER;
use crate::core::{HttpOutcome, OracleSource, ReplySender, SignatureVerifier};
use crate::utils::error::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const CALLBACK_PATH: &str = "/callback";

pub fn router<O, V, R>(dispatcher: Arc<Dispatcher<O, V, R>>) -> Router
where
    O: OracleSource + 'static,
    V: SignatureVerifier + 'static,
    R: ReplySender + 'static,
{
    Router::new()
        .route(CALLBACK_PATH, post(callback::<O, V, R>))
        .with_state(dispatcher)
}

async fn callback<O, V, R>(
    State(dispatcher): State<Arc<Dispatcher<O, V, R>>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str)
where
    O: OracleSource + 'static,
    V: SignatureVerifier + 'static,
    R: ReplySender + 'static,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let outcome = dispatcher.handle_request(&body, signature).await;
    (status_for(outcome), outcome.body())
}

fn status_for(outcome: HttpOutcome) -> StatusCode {
    match outcome {
        HttpOutcome::Ok => StatusCode::OK,
        HttpOutcome::Unauthorized | HttpOutcome::BadRequest => StatusCode::BAD_REQUEST,
    }
}

/// 綁定位址並開始服務，直到 `shutdown` 完成
pub async fn serve<O, V, R, F>(
    host: &str,
    port: u16,
    dispatcher: Arc<Dispatcher<O, V, R>>,
    shutdown: F,
) -> Result<()>
where
    O: OracleSource + 'static,
    V: SignatureVerifier + 'static,
    R: ReplySender + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind((host, port)).await?;
    serve_listener(listener, dispatcher, shutdown).await
}

pub async fn serve_listener<O, V, R, F>(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher<O, V, R>>,
    shutdown: F,
) -> Result<()>
where
    O: OracleSource + 'static,
    V: SignatureVerifier + 'static,
    R: ReplySender + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(
        "🌐 Listening on http://{}{}",
        listener.local_addr()?,
        CALLBACK_PATH
    );

    axum::serve(listener, router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}
