use crate::core::events;
use crate::core::{
    DispatchReport, HttpOutcome, InboundEvent, OracleEntry, OracleSource, ReplyInstruction,
    ReplySender, SignatureVerifier, TextMessageEvent,
};
use crate::utils::error::{BotError, Result};

/// 請求處理階段：
/// `Received → Verifying → {Unauthorized | Parsing} → {BadRequest | Dispatching} → Acknowledged`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Received,
    Verifying,
    Unauthorized,
    Parsing,
    BadRequest,
    Dispatching,
    Acknowledged,
}

impl RequestPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestPhase::Unauthorized | RequestPhase::BadRequest | RequestPhase::Acknowledged
        )
    }

    pub fn can_advance_to(self, next: RequestPhase) -> bool {
        use RequestPhase::*;
        matches!(
            (self, next),
            (Received, Verifying)
                | (Verifying, Unauthorized)
                | (Verifying, Parsing)
                | (Parsing, BadRequest)
                | (Parsing, Dispatching)
                | (Dispatching, Acknowledged)
        )
    }

    /// 終止階段對應的 HTTP 結果
    pub fn outcome(self) -> Option<HttpOutcome> {
        match self {
            RequestPhase::Unauthorized => Some(HttpOutcome::Unauthorized),
            RequestPhase::BadRequest => Some(HttpOutcome::BadRequest),
            RequestPhase::Acknowledged => Some(HttpOutcome::Ok),
            _ => None,
        }
    }

    fn advance(&mut self, next: RequestPhase) {
        debug_assert!(
            self.can_advance_to(next),
            "invalid request transition {:?} -> {:?}",
            self,
            next
        );
        tracing::debug!("Request phase {:?} -> {:?}", self, next);
        *self = next;
    }
}

/// 回覆文字格式
pub fn format_reply(entry: &OracleEntry) -> String {
    format!(
        "你抽到：\n\n「{}」\n\n現代解讀：\n{}",
        entry.original_text, entry.modern_text
    )
}

/// 驗證、解析並分派 webhook 事件。
///
/// 抽籤來源、簽章驗證與回覆通道都由外部注入，請求之間不共享可變狀態。
pub struct Dispatcher<O, V, R> {
    oracle: O,
    verifier: V,
    sender: R,
}

impl<O, V, R> Dispatcher<O, V, R>
where
    O: OracleSource,
    V: SignatureVerifier,
    R: ReplySender,
{
    pub fn new(oracle: O, verifier: V, sender: R) -> Self {
        Self {
            oracle,
            verifier,
            sender,
        }
    }

    pub async fn handle_request(&self, raw_body: &[u8], signature_header: &str) -> HttpOutcome {
        let mut phase = RequestPhase::Received;

        phase.advance(RequestPhase::Verifying);
        if !self.verifier.verify(raw_body, signature_header) {
            tracing::warn!("🚫 Rejected webhook request: {}", BotError::AuthenticationFailure);
            phase.advance(RequestPhase::Unauthorized);
            return HttpOutcome::Unauthorized;
        }

        phase.advance(RequestPhase::Parsing);
        let parsed = match events::parse(raw_body) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("🚫 Rejected webhook request: {}", e);
                phase.advance(RequestPhase::BadRequest);
                return HttpOutcome::BadRequest;
            }
        };

        phase.advance(RequestPhase::Dispatching);
        let report = self.dispatch_events(&parsed.events).await;
        tracing::info!(
            "📨 Webhook handled: {} replied, {} failed, {} ignored, {} dropped",
            report.replied,
            report.failed,
            report.ignored,
            parsed.dropped.len()
        );

        phase.advance(RequestPhase::Acknowledged);
        HttpOutcome::Ok
    }

    /// 依序處理每個事件；單一事件失敗不影響後續事件
    pub async fn dispatch_events(&self, events: &[InboundEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (position, event) in events.iter().enumerate() {
            match event {
                InboundEvent::TextMessage(message) => match self.reply_to(message).await {
                    Ok(()) => report.replied += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::error!(
                            "❌ Failed to reply to event #{} (Category: {:?}): {}",
                            position,
                            e.category(),
                            e
                        );
                        tracing::debug!("💡 {}", e.recovery_suggestion());
                    }
                },
                InboundEvent::OtherMessage { message_type, .. } => {
                    tracing::debug!("Ignoring non-text message event: {}", message_type);
                    report.ignored += 1;
                }
                InboundEvent::Follow { .. }
                | InboundEvent::Unfollow
                | InboundEvent::Postback { .. }
                | InboundEvent::Unknown { .. } => {
                    tracing::debug!("Ignoring {} event", event.kind());
                    report.ignored += 1;
                }
            }
        }

        report
    }

    // 使用者的文字不影響抽籤結果
    async fn reply_to(&self, message: &TextMessageEvent) -> Result<()> {
        tracing::debug!(
            "💬 Text message ({} chars), drawing an oracle",
            message.text.chars().count()
        );

        let entry = self.oracle.draw().await?;
        let instruction = ReplyInstruction {
            reply_token: message.reply_token.clone(),
            message_text: format_reply(&entry),
        };

        self.sender.send_reply(&instruction).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signature::{sign, ChannelSecretVerifier};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const SECRET: &str = "test-channel-secret";

    struct StaticOracle {
        entry: Option<OracleEntry>,
    }

    impl StaticOracle {
        fn new(original: &str, modern: &str) -> Self {
            Self {
                entry: Some(OracleEntry {
                    original_text: original.to_string(),
                    modern_text: modern.to_string(),
                }),
            }
        }

        fn empty() -> Self {
            Self { entry: None }
        }
    }

    #[async_trait]
    impl OracleSource for StaticOracle {
        async fn draw(&self) -> Result<OracleEntry> {
            self.entry.clone().ok_or(BotError::EmptyCorpus)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSender {
        sent: Arc<Mutex<Vec<ReplyInstruction>>>,
        failing_tokens: HashSet<String>,
    }

    impl RecordingSender {
        fn failing_on(token: &str) -> Self {
            Self {
                sent: Arc::new(Mutex::new(Vec::new())),
                failing_tokens: HashSet::from([token.to_string()]),
            }
        }

        async fn sent(&self) -> Vec<ReplyInstruction> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl ReplySender for RecordingSender {
        async fn send_reply(&self, instruction: &ReplyInstruction) -> Result<()> {
            if self.failing_tokens.contains(&instruction.reply_token) {
                return Err(BotError::SendFailure {
                    status: 400,
                    body: r#"{"message":"Invalid reply token"}"#.to_string(),
                });
            }
            self.sent.lock().await.push(instruction.clone());
            Ok(())
        }
    }

    fn dispatcher(
        oracle: StaticOracle,
        sender: RecordingSender,
    ) -> Dispatcher<StaticOracle, ChannelSecretVerifier, RecordingSender> {
        Dispatcher::new(oracle, ChannelSecretVerifier::new(SECRET), sender)
    }

    fn webhook_body(tokens: &[&str]) -> Vec<u8> {
        let events: Vec<_> = tokens
            .iter()
            .map(|token| {
                json!({
                    "type": "message",
                    "replyToken": token,
                    "source": {"type": "user", "userId": "U123"},
                    "message": {"id": "1", "type": "text", "text": "我想問工作"}
                })
            })
            .collect();
        serde_json::to_vec(&json!({"destination": "U0", "events": events})).unwrap()
    }

    #[test]
    fn test_format_reply() {
        let entry = OracleEntry {
            original_text: "巍巍獨步向雲間".to_string(),
            modern_text: "目標遠大".to_string(),
        };
        assert_eq!(
            format_reply(&entry),
            "你抽到：\n\n「巍巍獨步向雲間」\n\n現代解讀：\n目標遠大"
        );
    }

    #[test]
    fn test_request_phase_transitions() {
        use RequestPhase::*;

        assert!(Received.can_advance_to(Verifying));
        assert!(Verifying.can_advance_to(Unauthorized));
        assert!(Parsing.can_advance_to(Dispatching));
        assert!(!Received.can_advance_to(Dispatching));
        assert!(!Unauthorized.can_advance_to(Parsing));
        assert!(!Acknowledged.can_advance_to(Received));

        assert_eq!(Unauthorized.outcome(), Some(HttpOutcome::Unauthorized));
        assert_eq!(BadRequest.outcome(), Some(HttpOutcome::BadRequest));
        assert_eq!(Acknowledged.outcome(), Some(HttpOutcome::Ok));
        assert_eq!(Dispatching.outcome(), None);
        assert!(Acknowledged.is_terminal());
        assert!(!Parsing.is_terminal());
    }

    #[tokio::test]
    async fn test_valid_request_replies_once() {
        let sender = RecordingSender::default();
        let dispatcher = dispatcher(StaticOracle::new("巍巍獨步向雲間", "目標遠大"), sender.clone());
        let body = webhook_body(&["token-1"]);

        let outcome = dispatcher.handle_request(&body, &sign(&body, SECRET)).await;

        assert_eq!(outcome, HttpOutcome::Ok);
        let sent = sender.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_token, "token-1");
        assert!(sent[0].message_text.contains("巍巍獨步向雲間"));
        assert!(sent[0].message_text.contains("目標遠大"));
    }

    #[tokio::test]
    async fn test_invalid_signature_is_unauthorized_and_sends_nothing() {
        let sender = RecordingSender::default();
        let dispatcher = dispatcher(StaticOracle::new("原文", "解籤"), sender.clone());
        let body = webhook_body(&["token-1"]);

        let wrong = dispatcher
            .handle_request(&body, &sign(&body, "wrong-secret"))
            .await;
        let missing = dispatcher.handle_request(&body, "").await;

        assert_eq!(wrong, HttpOutcome::Unauthorized);
        assert_eq!(missing, HttpOutcome::Unauthorized);
        assert_eq!(wrong.status_code(), 400);
        assert!(sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_with_valid_signature_is_bad_request() {
        let sender = RecordingSender::default();
        let dispatcher = dispatcher(StaticOracle::new("原文", "解籤"), sender.clone());
        let body = b"{\"events\": [".to_vec();

        let outcome = dispatcher.handle_request(&body, &sign(&body, SECRET)).await;

        assert_eq!(outcome, HttpOutcome::BadRequest);
        assert_eq!(outcome.status_code(), 400);
        assert!(sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_does_not_block_later_events() {
        let sender = RecordingSender::failing_on("expired-token");
        let dispatcher = dispatcher(StaticOracle::new("原文", "解籤"), sender.clone());
        let body = webhook_body(&["expired-token", "fresh-token"]);

        let outcome = dispatcher.handle_request(&body, &sign(&body, SECRET)).await;

        assert_eq!(outcome, HttpOutcome::Ok);
        let sent = sender.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reply_token, "fresh-token");
    }

    #[tokio::test]
    async fn test_empty_corpus_is_reported_per_event() {
        let sender = RecordingSender::default();
        let dispatcher = dispatcher(StaticOracle::empty(), sender.clone());
        let parsed = events::parse(&webhook_body(&["t-1", "t-2"])).unwrap();

        let report = dispatcher.dispatch_events(&parsed.events).await;

        assert_eq!(
            report,
            DispatchReport {
                replied: 0,
                failed: 2,
                ignored: 0
            }
        );
        assert!(sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_non_text_events_are_ignored() {
        let sender = RecordingSender::default();
        let dispatcher = dispatcher(StaticOracle::new("原文", "解籤"), sender.clone());
        let events = vec![
            InboundEvent::Follow {
                reply_token: "f-1".to_string(),
            },
            InboundEvent::OtherMessage {
                reply_token: "s-1".to_string(),
                message_type: "sticker".to_string(),
            },
            InboundEvent::Unknown {
                event_type: "beacon".to_string(),
            },
        ];

        let report = dispatcher.dispatch_events(&events).await;

        assert_eq!(report.ignored, 3);
        assert_eq!(report.replied, 0);
        assert!(sender.sent().await.is_empty());
    }
}
