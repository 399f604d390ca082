use async_trait::async_trait;

/// Outbound side of the chat transport.
///
/// The engine never talks to the network itself; it hands everything chat-
/// visible to a `ChatSink`. Implementations live with the transport (IRC,
/// websocket, console harness, test recorder).
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Post a message to the channel.
    async fn send(&self, channel: &str, text: &str) -> anyhow::Result<()>;

    /// Time a user out for `seconds`.
    async fn mute(&self, channel: &str, user_id: &str, seconds: u64) -> anyhow::Result<()>;
}
