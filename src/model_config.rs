//! Model name configuration
//!
//! Model names per provider are read once at startup from a JSON file:
//!
//! ```json
//! {
//!   "openai": { "default_model": "gpt-4o-mini", "vision_model": "gpt-4o" },
//!   "google": { "default_model": "gemini-1.5-flash-latest", "vision_model": "gemini-1.5-pro-latest" }
//! }
//! ```
//!
//! Loading never fails. A missing or unparsable file, a missing provider
//! entry, or a missing field each fall back to the built-in defaults on their
//! own.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::provider::Provider;

/// Model names for a single provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderModels {
    /// Model used for text prompts
    pub default_model: String,
    /// Model used when an image is attached
    pub vision_model: String,
}

impl ProviderModels {
    fn new(default_model: &str, vision_model: &str) -> Self {
        Self {
            default_model: default_model.to_string(),
            vision_model: vision_model.to_string(),
        }
    }

    /// Built-in model names for a provider
    pub fn builtin(provider: Provider) -> Self {
        match provider {
            Provider::OpenAi => Self::new("gpt-3.5-turbo", "gpt-4-turbo"),
            Provider::Google => Self::new("gemini-1.5-flash-latest", "gemini-1.5-flash-latest"),
        }
    }
}

/// Model names for every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelConfig {
    pub openai: ProviderModels,
    pub google: ProviderModels,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            openai: ProviderModels::builtin(Provider::OpenAi),
            google: ProviderModels::builtin(Provider::Google),
        }
    }
}

impl ModelConfig {
    /// Load model names from `path`, falling back to defaults where needed
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Model config file not readable, using default model names");
                return Self::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                debug!(path = %path.display(), "Model config file loaded");
                Self::from_value(&value)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Model config file is not valid JSON, using default model names");
                Self::default()
            }
        }
    }

    /// Build from an already parsed JSON document
    pub fn from_value(value: &Value) -> Self {
        Self {
            openai: resolve(value, Provider::OpenAi),
            google: resolve(value, Provider::Google),
        }
    }

    /// Model names for a provider
    pub fn for_provider(&self, provider: Provider) -> &ProviderModels {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Google => &self.google,
        }
    }
}

fn resolve(root: &Value, provider: Provider) -> ProviderModels {
    let builtin = ProviderModels::builtin(provider);

    let Some(entry) = root.get(provider.as_str()).and_then(Value::as_object) else {
        warn!(
            provider = %provider,
            "Provider entry missing or malformed in model config, using default model names"
        );
        return builtin;
    };

    let field = |name: &str, fallback: String| {
        entry
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(fallback)
    };

    ProviderModels {
        default_model: field("default_model", builtin.default_model),
        vision_model: field("vision_model", builtin.vision_model),
    }
}
