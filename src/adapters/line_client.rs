use crate::core::{ConfigProvider, ReplyInstruction, ReplySender};
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::borrow::Cow;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.line.me";
const REPLY_PATH: &str = "/v2/bot/message/reply";

/// LINE 文字訊息長度上限 (字元數)
pub const MAX_TEXT_CHARS: usize = 5000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyMessageRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: Cow<'a, str>,
}

/// 呼叫 LINE Messaging API reply endpoint 的客戶端
pub struct LineMessagingClient {
    client: Client,
    reply_url: String,
    access_token: String,
}

impl LineMessagingClient {
    pub fn new(api_base: &str, access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            reply_url: format!("{}{}", api_base.trim_end_matches('/'), REPLY_PATH),
            access_token: access_token.into(),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.api_base_url(),
            config.channel_access_token(),
            Duration::from_secs(config.reply_timeout_secs()),
        )
    }

    pub fn reply_url(&self) -> &str {
        &self.reply_url
    }
}

#[async_trait]
impl ReplySender for LineMessagingClient {
    async fn send_reply(&self, instruction: &ReplyInstruction) -> Result<()> {
        let request = ReplyMessageRequest {
            reply_token: &instruction.reply_token,
            messages: vec![TextMessage {
                kind: "text",
                text: truncate_chars(&instruction.message_text, MAX_TEXT_CHARS),
            }],
        };

        tracing::debug!("Sending reply to: {}", self.reply_url);
        let response = self
            .client
            .post(&self.reply_url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Reply API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::SendFailure {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(text[..byte_idx].to_string()),
        None => Cow::Borrowed(text),
    }
}
