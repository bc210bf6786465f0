//! OpenAI chat completions adapter
//!
//! Sends the prompt (and, when a file is attached, a system message carrying
//! a text excerpt of it) to `/chat/completions` on the configured default
//! model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{
    logging::RequestContext, ErrorKind, GenerationRequest, Provider, ProviderError,
    TextGenerator, UploadedFile, UpstreamFailure,
};
use crate::{config::Config, model_config::ModelConfig};

/// Cap on generated tokens per request
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Bytes of an uploaded file included in the system message
pub const FILE_EXCERPT_BYTES: usize = 2000;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChoice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Build the message list for a prompt and optional file
pub fn build_messages(prompt: &str, file: Option<&UploadedFile>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);

    if let Some(file) = file {
        let excerpt = file.excerpt(FILE_EXCERPT_BYTES);
        let content = match &file.filename {
            Some(name) => format!(
                "The user has uploaded a file named '{}'. Its content (first 2000 characters) is: {}",
                name, excerpt
            ),
            None => format!(
                "The user has uploaded a file (name not provided). Its content (first 2000 characters) is: {}",
                excerpt
            ),
        };
        messages.push(ChatMessage::new(Role::System, content));
    }

    messages.push(ChatMessage::new(Role::User, prompt));
    messages
}

/// Pull the generated text out of a completion response
pub fn extract_text(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    let Some(message) = response.choices.into_iter().next().and_then(|c| c.message) else {
        return Err(ProviderError::new(
            ErrorKind::InvalidResponse,
            "Received an invalid or incomplete response structure from OpenAI.",
        ));
    };

    match message.content {
        Some(content) if !content.is_empty() => Ok(content.trim().to_string()),
        _ => Err(ProviderError::new(
            ErrorKind::EmptyResponse,
            "OpenAI returned an empty response.",
        )),
    }
}

/// Render an upstream failure in OpenAI terms
pub fn describe_failure(failure: UpstreamFailure) -> ProviderError {
    match failure {
        UpstreamFailure::Connection(_) => ProviderError::new(
            ErrorKind::Connection,
            format!("OpenAI API Connection Error - {}", failure),
        ),
        UpstreamFailure::Status { status: 429, .. } => ProviderError::new(
            ErrorKind::RateLimited,
            format!("OpenAI API Rate Limit Exceeded - {}", failure),
        ),
        UpstreamFailure::Status { status: 401, .. } => ProviderError::new(
            ErrorKind::Authentication,
            format!(
                "OpenAI API Authentication Error - {}. Ensure your OPENAI_API_KEY is correct and active.",
                failure
            ),
        ),
        UpstreamFailure::Status {
            status,
            ref error_type,
            ref message,
        } => ProviderError::new(
            ErrorKind::Api,
            format!(
                "OpenAI API Error - {} (Status Code: {}, Type: {})",
                message,
                status,
                error_type.as_deref().unwrap_or("unknown")
            ),
        ),
        UpstreamFailure::Other(_) => ProviderError::new(
            ErrorKind::Unexpected,
            format!(
                "An unexpected error occurred while interacting with OpenAI - {}",
                failure
            ),
        ),
    }
}

/// OpenAI adapter
pub struct OpenAIClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(client: reqwest::Client, config: &Config, models: &ModelConfig) -> Self {
        Self {
            client,
            base_url: config.openai_api_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: models.openai.default_model.clone(),
        }
    }

    async fn send(
        &self,
        api_key: &str,
        body: &ChatCompletionRequest,
        ctx: &RequestContext,
    ) -> Result<ChatCompletionResponse, UpstreamFailure> {
        let url = format!("{}/chat/completions", self.base_url);
        ctx.log_upstream_request(&url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                ctx.log_connection_error(&e.to_string(), &url);
                UpstreamFailure::from_reqwest(e)
            })?;

        ctx.log_upstream_response(response.status().as_u16());

        if !response.status().is_success() {
            return Err(UpstreamFailure::from_response(response).await);
        }

        response.json().await.map_err(UpstreamFailure::from_reqwest)
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    #[instrument(skip(self, request), fields(provider = "openai"))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let ctx = RequestContext::new(Provider::OpenAi)
            .with_model(&self.model)
            .with_file(request.file().is_some());

        let Some(api_key) = self.api_key.as_deref() else {
            let err = ProviderError::missing_key(Provider::OpenAi.api_key_var());
            ctx.log_error(&err.message);
            return Err(err);
        };

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(&request.prompt, request.file()),
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        ctx.log_request_start(request.prompt.len());

        let result = match self.send(api_key, &body, &ctx).await {
            Ok(response) => extract_text(response),
            Err(failure) => Err(describe_failure(failure)),
        };

        match &result {
            Ok(text) => ctx.log_request_complete(text.len()),
            Err(err) if err.kind == ErrorKind::EmptyResponse => ctx.log_warning(&err.message),
            Err(err) => ctx.log_error(&err.message),
        }

        result
    }
}
