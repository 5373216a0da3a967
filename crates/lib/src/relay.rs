//! Relay: one inbound WhatsApp notification in, at most one completion and one reply out.
//!
//! Downstream failures never reach the webhook caller: a failed completion is replaced by the
//! fallback reply, a failed send is logged and dropped. Only an unparseable body is reported.

use std::sync::Arc;

use crate::channels::{extract_first_message, MessageKind, OutboundChannel};
use crate::llm::CompletionBackend;
use crate::prompt::PromptTemplate;

/// Why a well-formed notification produced no outbound calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `entry[0].changes[0].value.messages[0]` was not reachable (e.g. status callbacks).
    NoMessage,
    /// First message is not a text message.
    NotText(String),
    /// Text message with a missing or zero-length body.
    EmptyText,
}

/// Result of handling one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Body was not valid JSON; nothing was sent.
    Malformed,
    Ignored(IgnoreReason),
    /// A reply was attempted.
    Relayed {
        /// The completion failed and the fallback reply was sent instead.
        used_fallback: bool,
        /// The send call succeeded.
        delivered: bool,
    },
}

impl RelayOutcome {
    /// Whether the webhook caller should get a success acknowledgement.
    pub fn acknowledged(&self) -> bool {
        !matches!(self, RelayOutcome::Malformed)
    }
}

/// Stateless relay; cheap to clone and shared across requests.
#[derive(Clone)]
pub struct Relay {
    completion: Arc<dyn CompletionBackend>,
    channel: Arc<dyn OutboundChannel>,
    template: PromptTemplate,
    fallback_reply: String,
}

impl Relay {
    pub fn new(
        completion: Arc<dyn CompletionBackend>,
        channel: Arc<dyn OutboundChannel>,
        template: PromptTemplate,
        fallback_reply: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            channel,
            template,
            fallback_reply: fallback_reply.into(),
        }
    }

    /// Handle a raw notification body: parse, extract, complete, send.
    pub async fn handle_notification(&self, body: &[u8]) -> RelayOutcome {
        let payload: serde_json::Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                log::error!("relay: failed to parse webhook body: {}", e);
                return RelayOutcome::Malformed;
            }
        };

        let Some(message) = extract_first_message(&payload) else {
            log::debug!("relay: notification carries no message");
            return RelayOutcome::Ignored(IgnoreReason::NoMessage);
        };
        if let MessageKind::Other(ref typ) = message.kind {
            log::debug!("relay: ignoring {} message from {}", typ, message.sender_id);
            return RelayOutcome::Ignored(IgnoreReason::NotText(typ.clone()));
        }
        let Some(text) = message.relayable_text() else {
            log::debug!("relay: ignoring empty text message from {}", message.sender_id);
            return RelayOutcome::Ignored(IgnoreReason::EmptyText);
        };

        log::info!("relay: text message from {}", message.sender_id);
        let (reply, used_fallback) = self.reply_for(text).await;

        let delivered = match self.channel.send_text(&message.sender_id, &reply).await {
            Ok(()) => {
                log::info!("relay: reply sent to {} via {}", message.sender_id, self.channel.id());
                true
            }
            Err(e) => {
                log::error!("relay: sending reply to {} failed: {}", message.sender_id, e);
                false
            }
        };

        RelayOutcome::Relayed {
            used_fallback,
            delivered,
        }
    }

    /// Completion text for `text`, or the fallback reply when the completion fails.
    async fn reply_for(&self, text: &str) -> (String, bool) {
        let prompt = self.template.render(text);
        match self.completion.complete(&prompt).await {
            Ok(reply) => (reply, false),
            Err(e) => {
                log::error!("relay: completion failed: {}", e);
                (self.fallback_reply.clone(), true)
            }
        }
    }
}
