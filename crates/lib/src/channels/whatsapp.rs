//! WhatsApp channel: send text messages via the Cloud API (Graph `/{phone-number-id}/messages`).

use crate::channels::outbound::{ChannelError, OutboundChannel};
use async_trait::async_trait;
use serde::Serialize;

pub const WHATSAPP_API_BASE: &str = "https://graph.facebook.com";
pub const WHATSAPP_API_VERSION: &str = "v20.0";

/// Graph API client bound to one sender phone-number id.
pub struct WhatsAppClient {
    id: String,
    messages_url: String,
    access_token: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'a str,
    to: &'a str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

fn messages_url(api_base: Option<&str>, api_version: Option<&str>, phone_number_id: &str) -> String {
    let base = api_base
        .map(|b| b.trim().trim_end_matches('/'))
        .filter(|b| !b.is_empty())
        .unwrap_or(WHATSAPP_API_BASE);
    let version = api_version
        .map(|v| v.trim().trim_matches('/'))
        .filter(|v| !v.is_empty())
        .unwrap_or(WHATSAPP_API_VERSION);
    format!("{}/{}/{}/messages", base, version, phone_number_id.trim())
}

impl WhatsAppClient {
    pub fn new(
        api_base: Option<&str>,
        api_version: Option<&str>,
        phone_number_id: &str,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            id: "whatsapp".to_string(),
            messages_url: messages_url(api_base, api_version, phone_number_id),
            access_token: access_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Send a text message to a phone number via the messages endpoint.
    pub async fn send_text(&self, to: &str, text: &str) -> Result<(), ChannelError> {
        let body = SendTextRequest {
            messaging_product: "whatsapp",
            to,
            text: TextBody { body: text },
        };
        let res = self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("send message failed: {} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl OutboundChannel for WhatsAppClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), ChannelError> {
        WhatsAppClient::send_text(self, recipient_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_messages_url() {
        assert_eq!(
            messages_url(None, None, "1234567890"),
            "https://graph.facebook.com/v20.0/1234567890/messages"
        );
    }

    #[test]
    fn custom_base_and_version_are_normalized() {
        assert_eq!(
            messages_url(Some("http://127.0.0.1:9999/"), Some("/v21.0/"), " 42 "),
            "http://127.0.0.1:9999/v21.0/42/messages"
        );
        assert_eq!(
            messages_url(Some(""), Some(""), "42"),
            "https://graph.facebook.com/v20.0/42/messages"
        );
    }

    #[test]
    fn send_body_shape() {
        let body = SendTextRequest {
            messaging_product: "whatsapp",
            to: "33600000000",
            text: TextBody { body: "bonjour" },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "messaging_product": "whatsapp",
                "to": "33600000000",
                "text": { "body": "bonjour" }
            })
        );
    }
}
