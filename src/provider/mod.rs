//! Provider adapters
//!
//! Each adapter turns a [`GenerationRequest`] into one call against a remote
//! LLM API and hands back either the generated text or a normalized
//! [`ProviderError`].

pub mod error;
pub mod google;
pub mod logging;
pub mod openai;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppError;

pub use error::{ErrorKind, ProviderError, UpstreamFailure};
pub use google::GoogleClient;
pub use openai::OpenAIClient;

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Google,
}

impl Provider {
    /// Wire name, as accepted in the `provider` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Google => "google",
        }
    }

    /// Environment variable holding this provider's credential
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAi),
            "google" => Ok(Provider::Google),
            _ => Err(AppError::InvalidProvider),
        }
    }
}

/// A file uploaded alongside the prompt, held fully in memory
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub data: Bytes,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
}

impl UploadedFile {
    pub fn new(
        data: impl Into<Bytes>,
        filename: Option<String>,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            data: data.into(),
            filename: filename.filter(|s| !s.is_empty()),
            mime_type: mime_type.filter(|s| !s.is_empty()),
        }
    }

    /// Lossy UTF-8 decode of at most the first `limit` bytes
    pub fn excerpt(&self, limit: usize) -> String {
        let end = self.data.len().min(limit);
        String::from_utf8_lossy(&self.data[..end]).into_owned()
    }
}

/// One generation call, discarded once answered
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub provider: Provider,
    pub prompt: String,
    pub upload: Option<UploadedFile>,
}

impl GenerationRequest {
    /// The upload, if it carries any bytes. Empty uploads count as no file.
    pub fn file(&self) -> Option<&UploadedFile> {
        self.upload.as_ref().filter(|f| !f.data.is_empty())
    }
}

/// Trait implemented by every provider adapter
///
/// Implementations never retry; one call to `generate` is at most one
/// outbound request.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider this adapter talks to
    fn provider(&self) -> Provider;

    /// Generate text for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}
