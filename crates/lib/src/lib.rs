//! wa-relay core library: config, prompt templates, completion client, WhatsApp channel,
//! relay, and the webhook gateway used by the CLI.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
pub mod llm;
pub mod prompt;
pub mod relay;
