use crate::core::SignatureVerifier;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::hmac;

/// LINE 平台放簽章的 header (base64 HMAC-SHA256)
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// 驗證 `raw_body` 的 HMAC-SHA256 是否與 header 相符 (常數時間比對)。
///
/// 空密鑰、空 header 或無法解碼的 base64 一律回傳 false。
pub fn verify(raw_body: &[u8], signature_header: &str, secret: &str) -> bool {
    if secret.is_empty() {
        tracing::warn!("⚠️ Channel secret is empty, rejecting webhook signature");
        return false;
    }

    let signature_header = signature_header.trim();
    if signature_header.is_empty() {
        return false;
    }

    let Ok(expected) = STANDARD.decode(signature_header) else {
        tracing::debug!("Signature header is not valid base64");
        return false;
    };

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::verify(&key, raw_body, &expected).is_ok()
}

/// 產生 header 值，供測試與本機工具使用
pub fn sign(raw_body: &[u8], secret: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    STANDARD.encode(hmac::sign(&key, raw_body).as_ref())
}

#[derive(Clone)]
pub struct ChannelSecretVerifier {
    secret: String,
}

impl ChannelSecretVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for ChannelSecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSecretVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureVerifier for ChannelSecretVerifier {
    fn verify(&self, raw_body: &[u8], signature_header: &str) -> bool {
        verify(raw_body, signature_header, &self.secret)
    }
}
