//! Outbound side of a channel: deliver one text message to one recipient.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("channel api error: {0}")]
    Api(String),
}

/// Sends text to a recipient (e.g. a WhatsApp phone number).
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    /// Channel id (e.g. "whatsapp").
    fn id(&self) -> &str;
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), ChannelError>;
}
