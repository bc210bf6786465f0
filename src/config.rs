//! Configuration management for Promptrelay
//!
//! Configuration is loaded from environment variables. Provider credentials
//! are optional here; their absence is reported per request, not at startup.

use anyhow::{Context, Result};
use std::env;

use crate::provider::Provider;

/// Origins allowed by default (local development, plus `null` for pages
/// opened straight from disk)
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost", "http://127.0.0.1", "null"];

/// Default cap for the multipart request body
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// OpenAI API URL
    pub openai_api_url: String,
    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Google Generative Language API URL
    pub google_api_url: String,
    /// Google API key
    pub google_api_key: Option<String>,

    /// Path of the JSON file holding model names per provider
    pub model_config_path: String,

    /// Origins accepted by the CORS layer
    pub cors_allowed_origins: Vec<String>,

    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,

    /// Optional timeout for outbound provider calls (seconds)
    pub upstream_timeout_seconds: Option<u64>,

    /// Emit logs as JSON
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("RELAY_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid RELAY_PORT")?,

            openai_api_url: env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),

            google_api_url: env::var("GOOGLE_API_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            google_api_key: non_empty_var("GOOGLE_API_KEY"),

            model_config_path: env::var("MODEL_CONFIG_PATH")
                .unwrap_or_else(|_| "config.json".to_string()),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_else(|_| default_origins()),

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
                .parse()
                .context("Invalid MAX_UPLOAD_BYTES")?,

            upstream_timeout_seconds: match env::var("UPSTREAM_TIMEOUT_SECONDS") {
                Ok(v) => Some(v.parse().context("Invalid UPSTREAM_TIMEOUT_SECONDS")?),
                Err(_) => None,
            },

            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// API key configured for a provider, if any
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Google => self.google_api_key.as_deref(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            openai_api_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            google_api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            google_api_key: None,
            model_config_path: "config.json".to_string(),
            cors_allowed_origins: default_origins(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upstream_timeout_seconds: None,
            log_json: false,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_origins() -> Vec<String> {
    DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
