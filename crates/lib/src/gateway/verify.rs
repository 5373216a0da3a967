//! Webhook subscription handshake (`hub.mode` / `hub.verify_token` / `hub.challenge`).

use axum::http::StatusCode;
use serde::Deserialize;

pub const FORBIDDEN_BODY: &str = "Forbidden";

const SUBSCRIBE_MODE: &str = "subscribe";

/// Query parameters sent by Meta when subscribing the callback URL.
#[derive(Debug, Default, Deserialize)]
pub struct VerificationRequest {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// 200 with the challenge echoed verbatim iff mode is "subscribe" and the token matches,
/// else 403 "Forbidden". An unset expected token matches nothing.
pub fn verify_subscription(
    request: &VerificationRequest,
    expected_token: Option<&str>,
) -> (StatusCode, String) {
    let Some(expected) = expected_token else {
        return (StatusCode::FORBIDDEN, FORBIDDEN_BODY.to_string());
    };
    let mode_ok = request.mode.as_deref() == Some(SUBSCRIBE_MODE);
    let token_ok = request
        .token
        .as_deref()
        .is_some_and(|t| constant_time_eq(t.as_bytes(), expected.as_bytes()));
    if mode_ok && token_ok {
        (StatusCode::OK, request.challenge.clone().unwrap_or_default())
    } else {
        (StatusCode::FORBIDDEN, FORBIDDEN_BODY.to_string())
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
