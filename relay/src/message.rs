use domain::UserId;
use serde::Deserialize;

/// Inbound WebSocket frames, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// Associates the connection with `user`.
    #[serde(alias = "bootup")]
    Bind { user: UserId },
    Message { chat: InboundChat },
}

/// Chat content as sent by a client. Id and timestamp are assigned on receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InboundChat {
    #[serde(default)]
    pub from: UserId,
    #[serde(default)]
    pub to: UserId,
    #[serde(default)]
    pub message: String,
}

impl Frame {
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
