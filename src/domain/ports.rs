use crate::domain::model::{OracleEntry, ReplyInstruction};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn channel_access_token(&self) -> &str;
    fn channel_secret(&self) -> &str;
    fn data_file(&self) -> &str;
    fn api_base_url(&self) -> &str;
    fn reply_timeout_secs(&self) -> u64;
}

/// 抽籤來源
#[async_trait]
pub trait OracleSource: Send + Sync {
    async fn draw(&self) -> Result<OracleEntry>;
}

pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, raw_body: &[u8], signature_header: &str) -> bool;
}

/// 回覆訊息的外部通道 (LINE reply API)
#[async_trait]
pub trait ReplySender: Send + Sync {
    async fn send_reply(&self, instruction: &ReplyInstruction) -> Result<()>;
}
