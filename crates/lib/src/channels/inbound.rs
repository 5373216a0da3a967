//! Inbound WhatsApp notification: only the first message of the first change of the first entry.

use serde::Deserialize;
use serde_json::Value;

/// JSON pointer to the one message a notification is reduced to.
const FIRST_MESSAGE_POINTER: &str = "/entry/0/changes/0/value/messages/0";

/// Message type as reported by WhatsApp (`"text"`, `"image"`, `"audio"`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Other(String),
}

impl MessageKind {
    fn from_type(typ: &str) -> Self {
        if typ == "text" {
            MessageKind::Text
        } else {
            MessageKind::Other(typ.to_string())
        }
    }
}

/// A message extracted from a webhook notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: String,
    pub kind: MessageKind,
    pub text: Option<String>,
}

impl InboundMessage {
    /// Text to relay: present only for text messages with a non-empty body.
    pub fn relayable_text(&self) -> Option<&str> {
        match self.kind {
            MessageKind::Text => self.text.as_deref().filter(|t| !t.is_empty()),
            MessageKind::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    from: Option<String>,
    #[serde(rename = "type")]
    typ: Option<String>,
    text: Option<WireText>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    body: Option<String>,
}

/// Extract `entry[0].changes[0].value.messages[0]`. Any missing segment, empty array, or
/// ill-typed value means "no message"; later entries, changes, and messages are ignored.
pub fn extract_first_message(payload: &Value) -> Option<InboundMessage> {
    let raw = payload.pointer(FIRST_MESSAGE_POINTER)?;
    let wire: WireMessage = match WireMessage::deserialize(raw) {
        Ok(m) => m,
        Err(e) => {
            log::debug!("whatsapp: first message has unexpected shape: {}", e);
            return None;
        }
    };
    let sender_id = wire.from.filter(|f| !f.trim().is_empty())?;
    let kind = MessageKind::from_type(wire.typ.as_deref().unwrap_or_default());
    Some(InboundMessage {
        sender_id,
        kind,
        text: wire.text.and_then(|t| t.body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_text_message() {
        let payload = json!({"entry":[{"changes":[{"value":{"messages":[
            {"from":"33600000000","type":"text","text":{"body":"J'ai mal au dos"}}
        ]}}]}]});
        let msg = extract_first_message(&payload).unwrap();
        assert_eq!(msg.sender_id, "33600000000");
        assert_eq!(msg.kind, MessageKind::Text);
        assert_eq!(msg.relayable_text(), Some("J'ai mal au dos"));
    }

    #[test]
    fn missing_segments_mean_no_message() {
        for payload in [
            json!({}),
            json!({"entry":[]}),
            json!({"entry":[{}]}),
            json!({"entry":[{"changes":[]}]}),
            json!({"entry":[{"changes":[{}]}]}),
            json!({"entry":[{"changes":[{"value":{}}]}]}),
            json!({"entry":[{"changes":[{"value":{"messages":[]}}]}]}),
            json!({"entry":"nope"}),
            json!([1, 2, 3]),
            json!(null),
        ] {
            assert_eq!(extract_first_message(&payload), None, "{}", payload);
        }
    }

    #[test]
    fn status_only_notification_is_ignored() {
        let payload = json!({"entry":[{"changes":[{"value":{
            "statuses":[{"id":"wamid.1","status":"delivered","recipient_id":"33600000000"}]
        }}]}]});
        assert_eq!(extract_first_message(&payload), None);
    }

    #[test]
    fn only_first_message_is_considered() {
        let payload = json!({"entry":[
            {"changes":[{"value":{"messages":[
                {"from":"1","type":"text","text":{"body":"first"}},
                {"from":"2","type":"text","text":{"body":"second"}}
            ]}}]},
            {"changes":[{"value":{"messages":[
                {"from":"3","type":"text","text":{"body":"third"}}
            ]}}]}
        ]});
        let msg = extract_first_message(&payload).unwrap();
        assert_eq!(msg.sender_id, "1");
        assert_eq!(msg.relayable_text(), Some("first"));
    }

    #[test]
    fn non_text_kind_is_not_relayable() {
        let payload = json!({"entry":[{"changes":[{"value":{"messages":[
            {"from":"33600000000","type":"image","image":{"id":"media-1"}}
        ]}}]}]});
        let msg = extract_first_message(&payload).unwrap();
        assert_eq!(msg.kind, MessageKind::Other("image".to_string()));
        assert_eq!(msg.relayable_text(), None);
    }

    #[test]
    fn empty_or_missing_body_is_not_relayable() {
        let empty = json!({"entry":[{"changes":[{"value":{"messages":[
            {"from":"1","type":"text","text":{"body":""}}
        ]}}]}]});
        assert_eq!(extract_first_message(&empty).unwrap().relayable_text(), None);

        let missing = json!({"entry":[{"changes":[{"value":{"messages":[
            {"from":"1","type":"text"}
        ]}}]}]});
        assert_eq!(extract_first_message(&missing).unwrap().relayable_text(), None);
    }

    #[test]
    fn whitespace_body_is_relayed_verbatim() {
        let payload = json!({"entry":[{"changes":[{"value":{"messages":[
            {"from":"1","type":"text","text":{"body":"   "}}
        ]}}]}]});
        assert_eq!(
            extract_first_message(&payload).unwrap().relayable_text(),
            Some("   ")
        );
    }

    #[test]
    fn missing_sender_is_no_message() {
        let payload = json!({"entry":[{"changes":[{"value":{"messages":[
            {"type":"text","text":{"body":"hi"}}
        ]}}]}]});
        assert_eq!(extract_first_message(&payload), None);
    }

    #[test]
    fn ill_typed_message_is_no_message() {
        let payload = json!({"entry":[{"changes":[{"value":{"messages":[
            {"from":33600000000u64,"type":"text","text":{"body":"hi"}}
        ]}}]}]});
        assert_eq!(extract_first_message(&payload), None);
    }
}
