//! Gateway HTTP server (single port): health, webhook verification, webhook notifications.

use crate::channels::WhatsAppClient;
use crate::config::{self, Config, RelaySecrets};
use crate::gateway::verify::{verify_subscription, VerificationRequest};
use crate::llm::OpenAiClient;
use crate::relay::{Relay, RelayOutcome};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

pub const OK_BODY: &str = "OK";
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";

/// Paths that serve the webhook. `/api/webhook` and `/api/whatsapp` keep callback URLs
/// registered against earlier deployments working.
pub const WEBHOOK_PATHS: [&str; 3] = ["/webhook", "/api/webhook", "/api/whatsapp"];

/// Shared, immutable state for the gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub port: u16,
    verify_token: Arc<str>,
    pub relay: Relay,
}

impl GatewayState {
    pub fn new(port: u16, verify_token: impl Into<String>, relay: Relay) -> Self {
        Self {
            port,
            verify_token: Arc::from(verify_token.into()),
            relay,
        }
    }

    /// Build the production clients (OpenAI-compatible completion, WhatsApp Graph API) from config.
    pub fn from_config(config: &Config, secrets: &RelaySecrets) -> Self {
        let completion = OpenAiClient::new(
            Some(config.completion.base_url.clone()),
            secrets.completion_api_key.clone(),
            Some(config.completion.model.clone()),
        );
        log::info!("completion model: {}", completion.model());
        let whatsapp = WhatsAppClient::new(
            Some(&config.whatsapp.api_base),
            Some(&config.whatsapp.api_version),
            &secrets.phone_number_id,
            secrets.whatsapp_token.clone(),
        );
        let relay = Relay::new(
            Arc::new(completion),
            Arc::new(whatsapp),
            config.completion.prompt_template(),
            config.completion.fallback_reply.clone(),
        );
        Self::new(config.gateway.port, secrets.verify_token.clone(), relay)
    }
}

/// Router with every gateway route; public so tests can serve it on an ephemeral port.
pub fn router(state: GatewayState) -> Router {
    let mut app = Router::new().route("/", get(health_http));
    for path in WEBHOOK_PATHS {
        app = app.route(path, get(verify_webhook).post(receive_webhook));
    }
    app.with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Secrets are resolved once here; startup fails if any is missing.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let secrets = config::resolve_secrets(&config)?;
    run_gateway_with_secrets(config, secrets).await
}

/// Run the gateway with already-resolved secrets.
pub async fn run_gateway_with_secrets(config: Config, secrets: RelaySecrets) -> Result<()> {
    let bind = config.gateway.bind.trim();
    if !config::is_loopback_bind(bind) {
        log::warn!(
            "gateway binding to non-loopback address {}; webhook notifications are not authenticated, so restrict access with a firewall or reverse proxy",
            bind
        );
    }

    let state = GatewayState::from_config(&config, &secrets);
    let app = router(state);

    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// In-flight webhook requests are allowed to finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining in-flight requests");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}

/// GET /webhook — subscription handshake; echoes hub.challenge when the token matches.
async fn verify_webhook(
    State(state): State<GatewayState>,
    query: Option<Query<VerificationRequest>>,
) -> (StatusCode, String) {
    let request = query.map(|Query(r)| r).unwrap_or_default();
    let (status, body) = verify_subscription(&request, Some(&*state.verify_token));
    if status == StatusCode::OK {
        log::info!("webhook subscription verified");
    } else {
        log::debug!("webhook verification rejected");
    }
    (status, body)
}

/// POST /webhook — relays the first text message; 200 unless the body is not JSON.
async fn receive_webhook(State(state): State<GatewayState>, body: Bytes) -> (StatusCode, &'static str) {
    let outcome = state.relay.handle_notification(&body).await;
    if let RelayOutcome::Relayed {
        used_fallback,
        delivered,
    } = outcome
    {
        log::debug!(
            "webhook handled (fallback: {}, delivered: {})",
            used_fallback,
            delivered
        );
    }
    if outcome.acknowledged() {
        (StatusCode::OK, OK_BODY)
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY)
    }
}
