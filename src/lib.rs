//! Promptrelay - AI text generation relay
//!
//! Forwards a prompt, optionally with one uploaded file, to OpenAI or Google
//! Gemini and returns the generated text.

pub mod config;
pub mod error;
pub mod model_config;
pub mod provider;
pub mod routes;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

pub use crate::config::Config;
pub use crate::model_config::ModelConfig;
pub use crate::provider::{GoogleClient, OpenAIClient, Provider, TextGenerator};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Model names, fixed for the life of the process
    pub models: ModelConfig,
    pub start_time: Instant,
    pub openai: Arc<dyn TextGenerator>,
    pub google: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, models: ModelConfig) -> Result<Self> {
        // Initialize HTTP client with connection pooling
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(32);
        if let Some(secs) = config.upstream_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;

        let openai: Arc<dyn TextGenerator> =
            Arc::new(OpenAIClient::new(http_client.clone(), &config, &models));
        let google: Arc<dyn TextGenerator> =
            Arc::new(GoogleClient::new(http_client, &config, &models));

        Ok(Self {
            config,
            models,
            start_time: Instant::now(),
            openai,
            google,
        })
    }

    /// Create application state with caller-supplied adapters
    ///
    /// Lets tests swap either provider for a deterministic stand-in while
    /// keeping the rest of the request path real.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        models: ModelConfig,
        openai: Arc<dyn TextGenerator>,
        google: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            config,
            models,
            start_time: Instant::now(),
            openai,
            google,
        }
    }

    /// Adapter for a provider
    pub fn generator(&self, provider: Provider) -> Arc<dyn TextGenerator> {
        match provider {
            Provider::OpenAi => self.openai.clone(),
            Provider::Google => self.google.clone(),
        }
    }
}
