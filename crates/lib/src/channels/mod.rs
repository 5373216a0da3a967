//! Communication channels (WhatsApp Cloud API).
//!
//! Inbound: webhook payload model and first-message extraction.
//! Outbound: the [`OutboundChannel`] trait and the Graph API send client.

mod inbound;
mod outbound;
mod whatsapp;

pub use inbound::{extract_first_message, InboundMessage, MessageKind};
pub use outbound::{ChannelError, OutboundChannel};
pub use whatsapp::{WhatsAppClient, WHATSAPP_API_BASE, WHATSAPP_API_VERSION};
