//! Health check endpoints
//!
//! - `/health` - Version, uptime and provider configuration
//! - `/health/live` - Liveness probe

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{model_config::ProviderModels, provider::Provider, AppState};

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Up, but at least one provider has no credential
    Degraded,
}

/// Configuration summary for one provider
#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub configured: bool,
    #[serde(flatten)]
    pub models: ProviderModels,
}

#[derive(Debug, Serialize)]
pub struct ProvidersHealth {
    pub openai: ProviderHealth,
    pub google: ProviderHealth,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub providers: ProvidersHealth,
}

/// Simple health response for liveness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

fn provider_health(state: &AppState, provider: Provider) -> ProviderHealth {
    ProviderHealth {
        configured: state
            .config
            .api_key(provider)
            .is_some_and(|k| !k.trim().is_empty()),
        models: state.models.for_provider(provider).clone(),
    }
}

/// Full health check endpoint
///
/// Always 200; `degraded` means a provider key is missing and requests for
/// it will be refused.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let providers = ProvidersHealth {
        openai: provider_health(&state, Provider::OpenAi),
        google: provider_health(&state, Provider::Google),
    };

    let status = if providers.openai.configured && providers.google.configured {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        providers,
    };

    (StatusCode::OK, Json(response))
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
