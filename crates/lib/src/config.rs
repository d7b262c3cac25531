//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.drpbot/config.json`) and environment.
//! Secrets (transport credentials, inference API key, storage keys) can be supplied
//! via environment variables, which override file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Messaging transport credentials (media fetch auth).
    #[serde(default)]
    pub transport: TransportConfig,

    /// Inference backend settings (model, sampling).
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Blob storage settings (bucket, region, credentials).
    #[serde(default)]
    pub storage: StorageConfig,

    /// Audit database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Knowledge document override.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Server bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the webhook HTTP server (default 8080).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    8080
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// Messaging transport settings: the credential pair doubles as HTTP Basic auth
/// when fetching attachment bytes from the transport's media URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    /// Account identifier. Overridden by TWILIO_ACCOUNT_SID env when set.
    pub account_sid: Option<String>,

    /// Account secret. Overridden by TWILIO_AUTH_TOKEN env when set.
    pub auth_token: Option<String>,

    /// Timeout for attachment downloads, in seconds (default 30).
    #[serde(default = "default_media_timeout_secs")]
    pub media_timeout_secs: u64,
}

fn default_media_timeout_secs() -> u64 {
    30
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            media_timeout_secs: default_media_timeout_secs(),
        }
    }
}

/// Inference backend settings. Output length and temperature are tunables,
/// not contracts; the defaults match the deployed service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    /// API key. Overridden by OPENAI_API_KEY env when set.
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_inference_base_url")]
    pub base_url: String,

    /// Model id passed through to the backend.
    #[serde(default = "default_inference_model")]
    pub model: String,

    /// Upper bound on generated tokens (default 500).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (default 0.7).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_inference_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_inference_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_inference_base_url(),
            model: default_inference_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Blob storage settings for archived attachments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Access key id. Overridden by AWS_ACCESS_KEY_ID env when set.
    pub access_key_id: Option<String>,

    /// Secret access key. Overridden by AWS_SECRET_ACCESS_KEY env when set.
    pub secret_access_key: Option<String>,

    /// Bucket region. Overridden by AWS_REGION env when set.
    pub region: Option<String>,

    /// Bucket name. Overridden by S3_BUCKET_NAME env when set.
    pub bucket: Option<String>,

    /// Optional endpoint override (path-style addressing, e.g. a local minio).
    /// When unset, virtual-hosted addressing against AWS is used.
    pub endpoint: Option<String>,
}

/// Audit database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// SQLite file path (default ~/.drpbot/messages.db).
    pub path: Option<PathBuf>,
}

/// Knowledge document settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeConfig {
    /// Path to a knowledge document; when unset the bundled document is used.
    pub document: Option<PathBuf>,
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn env_or(var: &str, file_value: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(non_empty)
        .or_else(|| file_value.cloned().and_then(non_empty))
}

/// Resolve the transport account SID: env TWILIO_ACCOUNT_SID overrides config.
pub fn resolve_account_sid(config: &Config) -> Option<String> {
    env_or("TWILIO_ACCOUNT_SID", config.transport.account_sid.as_ref())
}

/// Resolve the transport auth token: env TWILIO_AUTH_TOKEN overrides config.
pub fn resolve_auth_token(config: &Config) -> Option<String> {
    env_or("TWILIO_AUTH_TOKEN", config.transport.auth_token.as_ref())
}

/// Resolve the inference API key: env OPENAI_API_KEY overrides config.
pub fn resolve_inference_api_key(config: &Config) -> Option<String> {
    env_or("OPENAI_API_KEY", config.inference.api_key.as_ref())
}

/// Resolve the storage access key id: env AWS_ACCESS_KEY_ID overrides config.
pub fn resolve_access_key_id(config: &Config) -> Option<String> {
    env_or("AWS_ACCESS_KEY_ID", config.storage.access_key_id.as_ref())
}

/// Resolve the storage secret key: env AWS_SECRET_ACCESS_KEY overrides config.
pub fn resolve_secret_access_key(config: &Config) -> Option<String> {
    env_or(
        "AWS_SECRET_ACCESS_KEY",
        config.storage.secret_access_key.as_ref(),
    )
}

/// Resolve the storage region: env AWS_REGION overrides config.
pub fn resolve_region(config: &Config) -> Option<String> {
    env_or("AWS_REGION", config.storage.region.as_ref())
}

/// Resolve the storage bucket name: env S3_BUCKET_NAME overrides config.
pub fn resolve_bucket(config: &Config) -> Option<String> {
    env_or("S3_BUCKET_NAME", config.storage.bucket.as_ref())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("DRPBOT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".drpbot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Resolve the audit database path (default: messages.db next to the config).
pub fn resolve_database_path(config: &Config) -> PathBuf {
    config.database.path.clone().unwrap_or_else(|| {
        dirs::home_dir()
            .map(|h| h.join(".drpbot").join("messages.db"))
            .unwrap_or_else(|| PathBuf::from("messages.db"))
    })
}

/// Load config from the default path (or DRPBOT_CONFIG_PATH). Missing file => default config.
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
