//! Gateway: HTTP server for the WhatsApp webhook.
//!
//! Single port serves a health probe and the webhook (GET handshake, POST notifications).

mod server;
mod verify;

pub use server::{
    router, run_gateway, run_gateway_with_secrets, GatewayState, INTERNAL_ERROR_BODY, OK_BODY, WEBHOOK_PATHS,
};
pub use verify::{verify_subscription, VerificationRequest, FORBIDDEN_BODY};
