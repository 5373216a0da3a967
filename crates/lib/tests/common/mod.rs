//! Test helpers: serve the gateway on an ephemeral port with both upstream services
//! (completion API, WhatsApp Graph API) replaced by one recording mock server.
#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use lib::config::{Config, RelaySecrets};
use lib::gateway::{self, GatewayState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const VERIFY_TOKEN: &str = "verify-me";
pub const WHATSAPP_TOKEN: &str = "wa-token";
pub const PHONE_NUMBER_ID: &str = "1234567890";
pub const COMPLETION_KEY: &str = "sk-test";
pub const COMPLETION_REPLY: &str = "Le dos porte les charges que l'on s'impose.";

/// Which upstream endpoint a recorded call hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Completion,
    Send,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub upstream: Upstream,
    pub authorization: Option<String>,
    pub body: Value,
}

/// Upstream mock: records every call and answers with the configured statuses.
#[derive(Clone)]
pub struct MockUpstream {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    completion_status: StatusCode,
    send_status: StatusCode,
}

impl MockUpstream {
    pub fn new(completion_status: StatusCode, send_status: StatusCode) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            completion_status,
            send_status,
        }
    }

    pub fn healthy() -> Self {
        Self::new(StatusCode::OK, StatusCode::OK)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, upstream: Upstream, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.calls.lock().expect("calls lock").push(RecordedCall {
            upstream,
            authorization,
            body,
        });
    }

    fn router(self) -> Router {
        let send_path = format!("/v20.0/{}/messages", PHONE_NUMBER_ID);
        Router::new()
            .route("/v1/chat/completions", post(mock_completion))
            .route(&send_path, post(mock_send))
            .with_state(self)
    }
}

async fn mock_completion(
    State(mock): State<MockUpstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.record(Upstream::Completion, &headers, body);
    if mock.completion_status.is_success() {
        (
            mock.completion_status,
            Json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": COMPLETION_REPLY },
                    "finish_reason": "stop"
                }]
            })),
        )
    } else {
        (
            mock.completion_status,
            Json(json!({ "error": { "message": "upstream unavailable" } })),
        )
    }
}

async fn mock_send(
    State(mock): State<MockUpstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.record(Upstream::Send, &headers, body);
    if mock.send_status.is_success() {
        (
            mock.send_status,
            Json(json!({
                "messaging_product": "whatsapp",
                "messages": [{ "id": "wamid.TEST" }]
            })),
        )
    } else {
        (
            mock.send_status,
            Json(json!({ "error": { "message": "Invalid OAuth access token", "code": 190 } })),
        )
    }
}

/// Serve `app` on 127.0.0.1 with an OS-assigned port. The task is left running when the test ends.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

pub fn test_secrets() -> RelaySecrets {
    RelaySecrets {
        verify_token: VERIFY_TOKEN.to_string(),
        whatsapp_token: WHATSAPP_TOKEN.to_string(),
        phone_number_id: PHONE_NUMBER_ID.to_string(),
        completion_api_key: COMPLETION_KEY.to_string(),
    }
}

/// Start the mock upstream and a gateway pointed at it. Returns the gateway base URL.
pub async fn spawn_gateway(mock: &MockUpstream) -> String {
    let upstream = spawn_app(mock.clone().router()).await;

    let mut config = Config::default();
    config.completion.base_url = format!("http://{}/v1", upstream);
    config.whatsapp.api_base = format!("http://{}", upstream);
    config.completion.fallback_reply = "fallback apology".to_string();

    let state = GatewayState::from_config(&config, &test_secrets());
    let addr = spawn_app(gateway::router(state)).await;
    format!("http://{}", addr)
}
