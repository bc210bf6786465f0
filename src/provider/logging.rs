//! Request logging utilities for provider calls
//!
//! Structured logging with a short correlation ID so one generation can be
//! followed from the endpoint through the outbound call.

use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::Provider;

/// Context for tracking one provider call
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this call (for log correlation)
    pub trace_id: String,
    /// When the call started
    pub start_time: Instant,
    /// Provider handling this call
    pub provider: Provider,
    /// Model being used
    pub model: Option<String>,
    /// Whether a file accompanies the prompt
    pub has_file: bool,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(provider: Provider) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            provider,
            model: None,
            has_file: false,
        }
    }

    /// Set the model for this call
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Record whether a file was attached
    pub fn with_file(mut self, has_file: bool) -> Self {
        self.has_file = has_file;
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log call initiation
    pub fn log_request_start(&self, prompt_len: usize) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            model = ?self.model,
            has_file = %self.has_file,
            prompt_len = %prompt_len,
            "Sending request to provider"
        );
    }

    /// Log request being sent to upstream
    pub fn log_upstream_request(&self, url: &str) {
        debug!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            url = %url,
            elapsed_ms = %self.elapsed_ms(),
            "Sending request to upstream"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, status: u16) {
        debug!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log successful completion
    pub fn log_request_complete(&self, response_len: usize) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            model = ?self.model,
            response_len = %response_len,
            elapsed_ms = %self.elapsed_ms(),
            "Provider request completed"
        );
    }

    /// Log a response that carried no usable text
    pub fn log_warning(&self, message: &str) {
        warn!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            model = ?self.model,
            elapsed_ms = %self.elapsed_ms(),
            message = %message,
            "Provider returned no usable content"
        );
    }

    /// Log call failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            model = ?self.model,
            has_file = %self.has_file,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Provider request failed"
        );
    }

    /// Log connection error
    pub fn log_connection_error(&self, error: &str, url: &str) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            url = %url,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Connection to upstream failed"
        );
    }
}
