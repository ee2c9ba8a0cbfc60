use crate::core::{DroppedEvent, InboundEvent, ParsedEvents, TextMessageEvent};
use crate::utils::error::{BotError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    destination: Option<String>,
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    reply_token: Option<String>,
    message: Option<RawMessage>,
    postback: Option<RawPostback>,
    source: Option<RawSource>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    message_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPostback {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSource {
    user_id: Option<String>,
}

/// 解析 webhook 內容。
///
/// 只有外層不是合法 JSON 或缺少 `events` 陣列時才回傳 `BodyMalformed`；
/// 單一事件格式錯誤時丟棄該事件並記錄在 `dropped`，其餘事件照常解析。
pub fn parse(raw_body: &[u8]) -> Result<ParsedEvents> {
    let envelope: Envelope =
        serde_json::from_slice(raw_body).map_err(|e| BotError::BodyMalformed {
            message: e.to_string(),
        })?;

    let mut parsed = ParsedEvents {
        destination: envelope.destination,
        events: Vec::with_capacity(envelope.events.len()),
        dropped: Vec::new(),
    };

    for (index, value) in envelope.events.into_iter().enumerate() {
        match decode_event(value) {
            Ok(event) => parsed.events.push(event),
            Err(reason) => {
                tracing::warn!("⚠️ Dropping malformed webhook event #{}: {}", index, reason);
                parsed.dropped.push(DroppedEvent { index, reason });
            }
        }
    }

    tracing::debug!(
        "Parsed {} webhook events ({} dropped)",
        parsed.events.len(),
        parsed.dropped.len()
    );
    Ok(parsed)
}

fn decode_event(value: Value) -> std::result::Result<InboundEvent, String> {
    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or("event has no string 'type' field")?
        .to_string();

    // 不認得的種類不再往下解析
    if !matches!(
        event_type.as_str(),
        "message" | "follow" | "unfollow" | "postback"
    ) {
        return Ok(InboundEvent::Unknown { event_type });
    }

    let raw: RawEvent = serde_json::from_value(value).map_err(|e| e.to_string())?;

    match event_type.as_str() {
        "message" => {
            let reply_token = require_reply_token(raw.reply_token)?;
            let message = raw.message.ok_or("message event without 'message' object")?;
            match message.message_type.as_str() {
                "text" => {
                    let text = message.text.ok_or("text message without 'text'")?;
                    Ok(InboundEvent::TextMessage(TextMessageEvent {
                        reply_token,
                        text,
                        user_id: raw.source.and_then(|source| source.user_id),
                        timestamp: raw.timestamp,
                    }))
                }
                _ => Ok(InboundEvent::OtherMessage {
                    reply_token,
                    message_type: message.message_type,
                }),
            }
        }
        "follow" => Ok(InboundEvent::Follow {
            reply_token: require_reply_token(raw.reply_token)?,
        }),
        "unfollow" => Ok(InboundEvent::Unfollow),
        "postback" => Ok(InboundEvent::Postback {
            reply_token: require_reply_token(raw.reply_token)?,
            data: raw
                .postback
                .map(|postback| postback.data)
                .ok_or("postback event without 'postback' object")?,
        }),
        other => Ok(InboundEvent::Unknown {
            event_type: other.to_string(),
        }),
    }
}

fn require_reply_token(token: Option<String>) -> std::result::Result<String, String> {
    match token {
        Some(token) if !token.trim().is_empty() => Ok(token),
        _ => Err("event without 'replyToken'".to_string()),
    }
}
