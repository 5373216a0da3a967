//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.wa-relay/config.json`) and environment.
//! Secrets are resolved once at startup (env overrides config) and handed to the gateway
//! as a [`RelaySecrets`] value; request handlers never read the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::channels;
use crate::llm;
use crate::prompt::{PromptPreset, PromptTemplate};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// WhatsApp Cloud API settings (webhook secret, send credentials).
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Completion service settings (endpoint, model, prompt).
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook HTTP server (default 8080).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1"). Put a TLS-terminating proxy in front for Meta.
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// WhatsApp Cloud API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppConfig {
    /// Token echoed by Meta during the subscription handshake. Overridden by WHATSAPP_VERIFY_TOKEN.
    pub verify_token: Option<String>,
    /// Bearer token for the Graph API. Overridden by WHATSAPP_TOKEN.
    pub access_token: Option<String>,
    /// Sender phone-number id used in the send URL. Overridden by WHATSAPP_PHONE_ID.
    pub phone_number_id: Option<String>,
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base: String,
    #[serde(default = "default_whatsapp_api_version")]
    pub api_version: String,
}

fn default_whatsapp_api_base() -> String {
    channels::WHATSAPP_API_BASE.to_string()
}

fn default_whatsapp_api_version() -> String {
    channels::WHATSAPP_API_VERSION.to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: None,
            access_token: None,
            phone_number_id: None,
            api_base: default_whatsapp_api_base(),
            api_version: default_whatsapp_api_version(),
        }
    }
}

/// Completion service config (OpenAI-compatible chat/completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    /// Bearer key for the completion API. Overridden by OPENAI_API_KEY.
    pub api_key: Option<String>,
    /// Base URL up to and including the version segment (default "https://api.openai.com/v1").
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    /// Built-in prompt: "brief" or "structured" (default). Ignored when promptTemplate is set.
    #[serde(default)]
    pub prompt: PromptPreset,
    /// Custom prompt with a `{message}` placeholder; takes precedence over `prompt`.
    pub prompt_template: Option<String>,
    /// Text sent back to the user when the completion call fails.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_completion_base_url() -> String {
    llm::DEFAULT_BASE_URL.to_string()
}

fn default_completion_model() -> String {
    llm::DEFAULT_MODEL.to_string()
}

pub fn default_fallback_reply() -> String {
    "Je suis désolé, une erreur est survenue lors de la génération de la réponse.".to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            prompt: PromptPreset::default(),
            prompt_template: None,
            fallback_reply: default_fallback_reply(),
        }
    }
}

impl CompletionConfig {
    /// Prompt template in effect: the custom template when set and non-blank, else the preset.
    pub fn prompt_template(&self) -> PromptTemplate {
        match self.prompt_template.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => PromptTemplate::new(t),
            _ => self.prompt.template(),
        }
    }
}

/// Secrets resolved once at startup and injected into the gateway.
#[derive(Clone)]
pub struct RelaySecrets {
    pub verify_token: String,
    pub whatsapp_token: String,
    pub phone_number_id: String,
    pub completion_api_key: String,
}

impl std::fmt::Debug for RelaySecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySecrets")
            .field("phone_number_id", &self.phone_number_id)
            .finish_non_exhaustive()
    }
}

/// Non-empty trimmed env value, else non-empty trimmed config value.
fn env_or_config(env_value: Option<String>, configured: Option<&String>) -> Option<String> {
    env_value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            configured
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Resolve the completion API key: env OPENAI_API_KEY overrides config.
pub fn resolve_completion_api_key(config: &Config) -> Option<String> {
    env_or_config(process_env("OPENAI_API_KEY"), config.completion.api_key.as_ref())
}

/// Resolve every secret the gateway needs from the process environment and config.
pub fn resolve_secrets(config: &Config) -> Result<RelaySecrets> {
    resolve_secrets_with(config, process_env)
}

/// Resolve every secret with `lookup` standing in for the environment; the error names all
/// missing ones.
pub fn resolve_secrets_with(
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RelaySecrets> {
    let verify_token = env_or_config(
        lookup("WHATSAPP_VERIFY_TOKEN"),
        config.whatsapp.verify_token.as_ref(),
    );
    let whatsapp_token = env_or_config(lookup("WHATSAPP_TOKEN"), config.whatsapp.access_token.as_ref());
    let phone_number_id = env_or_config(
        lookup("WHATSAPP_PHONE_ID"),
        config.whatsapp.phone_number_id.as_ref(),
    );
    let completion_api_key = env_or_config(lookup("OPENAI_API_KEY"), config.completion.api_key.as_ref());

    let mut missing = Vec::new();
    if verify_token.is_none() {
        missing.push("whatsapp.verifyToken (WHATSAPP_VERIFY_TOKEN)");
    }
    if whatsapp_token.is_none() {
        missing.push("whatsapp.accessToken (WHATSAPP_TOKEN)");
    }
    if phone_number_id.is_none() {
        missing.push("whatsapp.phoneNumberId (WHATSAPP_PHONE_ID)");
    }
    if completion_api_key.is_none() {
        missing.push("completion.apiKey (OPENAI_API_KEY)");
    }

    match (verify_token, whatsapp_token, phone_number_id, completion_api_key) {
        (Some(verify_token), Some(whatsapp_token), Some(phone_number_id), Some(completion_api_key)) => {
            Ok(RelaySecrets {
                verify_token,
                whatsapp_token,
                phone_number_id,
                completion_api_key,
            })
        }
        _ => anyhow::bail!("missing required settings: {}", missing.join(", ")),
    }
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WA_RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".wa-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or WA_RELAY_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
