use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一支籤：原文與現代化解籤
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleEntry {
    pub original_text: String,
    pub modern_text: String,
}

/// 交給回覆通道的唯一輸出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyInstruction {
    pub reply_token: String,
    pub message_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessageEvent {
    pub reply_token: String,
    pub text: String,
    pub user_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Webhook 事件種類。只有 `TextMessage` 會觸發回覆，其餘種類保留但忽略。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    TextMessage(TextMessageEvent),
    /// 非文字訊息 (貼圖、圖片、位置…)
    OtherMessage {
        reply_token: String,
        message_type: String,
    },
    Follow {
        reply_token: String,
    },
    Unfollow,
    Postback {
        reply_token: String,
        data: String,
    },
    Unknown {
        event_type: String,
    },
}

impl InboundEvent {
    pub fn kind(&self) -> &str {
        match self {
            InboundEvent::TextMessage(_) => "message/text",
            InboundEvent::OtherMessage { .. } => "message",
            InboundEvent::Follow { .. } => "follow",
            InboundEvent::Unfollow => "unfollow",
            InboundEvent::Postback { .. } => "postback",
            InboundEvent::Unknown { event_type } => event_type,
        }
    }
}

/// 解析時被丟棄的事件 (位置 + 原因)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEvent {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedEvents {
    pub destination: Option<String>,
    pub events: Vec<InboundEvent>,
    pub dropped: Vec<DroppedEvent>,
}

impl ParsedEvents {
    pub fn text_messages(&self) -> impl Iterator<Item = &TextMessageEvent> {
        self.events.iter().filter_map(|event| match event {
            InboundEvent::TextMessage(message) => Some(message),
            _ => None,
        })
    }
}

/// 每個請求最終對平台的回應
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpOutcome {
    Ok,
    Unauthorized,
    BadRequest,
}

impl HttpOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            HttpOutcome::Ok => 200,
            HttpOutcome::Unauthorized | HttpOutcome::BadRequest => 400,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            HttpOutcome::Ok => "OK",
            HttpOutcome::Unauthorized | HttpOutcome::BadRequest => "Bad Request",
        }
    }
}

/// 單一請求內各事件的處理統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub replied: usize,
    pub failed: usize,
    pub ignored: usize,
}
