use std::future::Future;
use std::pin::Pin;

pub type ChannelFuture<'a, T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>;

/// A message received from a channel.
///
/// `sender` identifies the user, `chat_id` the conversation replies go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub id: String,
    pub sender: String,
    pub chat_id: String,
    pub content: String,
    /// Unix seconds
    pub timestamp: u64,
}

/// Core channel trait — implement for any messaging platform
pub trait Channel: Send + Sync {
    /// Human-readable channel name
    fn name(&self) -> &str;

    /// Send a message through this channel
    fn send<'a>(&'a self, message: &'a str, recipient: &'a str) -> ChannelFuture<'a, ()>;

    /// Show a "composing" indicator to the recipient
    fn send_typing<'a>(&'a self, recipient: &'a str) -> ChannelFuture<'a, ()>;

    /// Start listening for incoming messages (long-running). Returns once
    /// the receiving side is gone.
    fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> ChannelFuture<'_, ()>;
}
