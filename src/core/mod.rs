pub mod dispatch;
pub mod events;
pub mod oracle;
pub mod signature;

pub use crate::domain::model::{
    DispatchReport, DroppedEvent, HttpOutcome, InboundEvent, OracleEntry, ParsedEvents,
    ReplyInstruction, TextMessageEvent,
};
pub use crate::domain::ports::{
    ConfigProvider, OracleSource, ReplySender, SignatureVerifier, Storage,
};
pub use crate::utils::error::Result;
