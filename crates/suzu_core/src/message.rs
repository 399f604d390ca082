use serde::{Deserialize, Serialize};

/// A single inbound chat message, as delivered by the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Channel the message was posted in.
    pub channel: String,
    /// Stable user identifier (login name on most platforms).
    pub user_id: String,
    /// Display name, used when addressing the user in replies.
    pub display_name: String,
    /// Raw message text, untouched by any normalization.
    pub text: String,
    pub is_moderator: bool,
    pub is_subscriber: bool,
    /// Unix timestamp (seconds).
    pub timestamp: i64,
}

impl ChatMessage {
    /// Convenience constructor for the common case where the display name
    /// equals the user id.
    pub fn new(channel: &str, user_id: &str, text: &str, timestamp: i64) -> Self {
        Self {
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
            text: text.to_string(),
            is_moderator: false,
            is_subscriber: false,
            timestamp,
        }
    }
}

/// An action the engine asks the transport to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundAction {
    Say {
        channel: String,
        text: String,
    },
    Mute {
        channel: String,
        user_id: String,
        seconds: u64,
    },
}
