//! Common test utilities for Promptrelay
//!
//! Shared configuration fixtures, stub adapters and server builders used by
//! the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use promptrelay::{
    provider::{GenerationRequest, ProviderError},
    routes::create_router,
    AppState, Config, ModelConfig, Provider, TextGenerator,
};

/// Test configuration constants
pub mod constants {
    /// Test API key for OpenAI
    pub const TEST_OPENAI_API_KEY: &str = "test-openai-api-key";
    /// Test API key for Google
    pub const TEST_GOOGLE_API_KEY: &str = "test-google-api-key";
    /// Default Gemini model in the test model config
    pub const GOOGLE_DEFAULT_MODEL: &str = "gemini-test-default";
    /// Vision Gemini model in the test model config
    pub const GOOGLE_VISION_MODEL: &str = "gemini-test-vision";
    /// Default OpenAI model in the test model config
    pub const OPENAI_DEFAULT_MODEL: &str = "gpt-test-default";
}

/// Config with both keys set and both providers pointed at the given URLs
pub fn test_config(openai_url: &str, google_url: &str) -> Config {
    Config {
        openai_api_url: openai_url.to_string(),
        openai_api_key: Some(constants::TEST_OPENAI_API_KEY.to_string()),
        google_api_url: google_url.to_string(),
        google_api_key: Some(constants::TEST_GOOGLE_API_KEY.to_string()),
        ..Config::default()
    }
}

/// Config with both keys set; provider URLs are never contacted
pub fn keyed_config() -> Config {
    test_config("http://127.0.0.1:9", "http://127.0.0.1:9")
}

/// Model names used across the tests
pub fn test_models() -> ModelConfig {
    ModelConfig::from_value(&json!({
        "openai": {
            "default_model": constants::OPENAI_DEFAULT_MODEL,
            "vision_model": "gpt-test-vision"
        },
        "google": {
            "default_model": constants::GOOGLE_DEFAULT_MODEL,
            "vision_model": constants::GOOGLE_VISION_MODEL
        }
    }))
}

/// Adapter stand-in that records requests and answers with a fixed result
pub struct StubGenerator {
    provider: Provider,
    reply: Result<String, ProviderError>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl StubGenerator {
    pub fn replying(provider: Provider, text: &str) -> Arc<Self> {
        Arc::new(Self {
            provider,
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(provider: Provider, err: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            provider,
            reply: Err(err),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        self.reply.clone()
    }
}

/// Router wired to stub adapters
pub fn stub_router(
    config: Config,
    openai: Arc<StubGenerator>,
    google: Arc<StubGenerator>,
) -> Router {
    let state = AppState::new_for_testing(config, test_models(), openai, google);
    create_router(Arc::new(state))
}

/// Test server wired to stub adapters
pub fn stub_server(
    config: Config,
    openai: Arc<StubGenerator>,
    google: Arc<StubGenerator>,
) -> TestServer {
    TestServer::new(stub_router(config, openai, google)).expect("Failed to create test server")
}

/// Router wired to the real adapters
pub fn live_router(config: Config) -> Router {
    let state = AppState::new(config, test_models()).expect("Failed to build app state");
    create_router(Arc::new(state))
}

/// Test server wired to the real adapters
pub fn live_server(config: Config) -> TestServer {
    TestServer::new(live_router(config)).expect("Failed to create test server")
}
