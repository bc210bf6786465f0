//! Google Gemini adapter
//!
//! Talks to the Generative Language `generateContent` endpoint. Images are
//! sent inline to the vision model; any other file is decoded as text and
//! spliced into the prompt for the default model.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{
    logging::RequestContext, ErrorKind, GenerationRequest, Provider, ProviderError,
    TextGenerator, UploadedFile, UpstreamFailure,
};
use crate::{
    config::Config,
    model_config::{ModelConfig, ProviderModels},
};

/// Bytes of a non-image file spliced into the prompt
pub const FILE_EXCERPT_BYTES: usize = 50_000;

/// A single piece of request content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Binary part built from raw bytes
    pub fn from_bytes(data: &[u8], mime_type: &str) -> Self {
        Part::InlineData {
            inline_data: Blob {
                mime_type: mime_type.to_string(),
                data: STANDARD.encode(data),
            },
        }
    }
}

/// Inline binary payload, base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
    #[serde(default)]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub probability: String,
}

fn summarize(ratings: &[SafetyRating]) -> String {
    ratings
        .iter()
        .map(|r| format!("{}: {}", r.category, r.probability))
        .collect::<Vec<_>>()
        .join(", ")
}

impl GenerateContentResponse {
    /// Text of the first candidate
    ///
    /// `None` when there is no candidate or it carries no parts, which is
    /// how a blocked generation comes back.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        if parts.is_empty() {
            return None;
        }
        Some(parts.iter().filter_map(|p| p.text.as_deref()).collect())
    }
}

/// Model choice and content list for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedContent {
    pub model: String,
    pub parts: Vec<Part>,
}

/// Choose the model and shape the content for a prompt and optional file
pub fn prepare_content(
    prompt: &str,
    file: Option<&UploadedFile>,
    models: &ProviderModels,
) -> Result<PreparedContent, ProviderError> {
    let Some(file) = file else {
        return Ok(PreparedContent {
            model: models.default_model.clone(),
            parts: vec![Part::text(prompt)],
        });
    };

    let (Some(filename), Some(mime_type)) = (file.filename.as_deref(), file.mime_type.as_deref())
    else {
        return Err(ProviderError::new(
            ErrorKind::InvalidInput,
            "File content provided without filename or MIME type. Both are required for Google Gemini.",
        ));
    };

    if mime_type.to_lowercase().contains("image") {
        return Ok(PreparedContent {
            model: models.vision_model.clone(),
            parts: vec![Part::text(prompt), Part::from_bytes(&file.data, mime_type)],
        });
    }

    let enhanced = format!(
        "{}\n\n--- User Uploaded File: {} (MIME type: {}) ---\n{}\n--- End of File Content ---",
        prompt,
        filename,
        mime_type,
        file.excerpt(FILE_EXCERPT_BYTES)
    );

    Ok(PreparedContent {
        model: models.default_model.clone(),
        parts: vec![Part::text(enhanced)],
    })
}

/// Turn a decoded response into text or an error, checking block state first
pub fn interpret_response(response: &GenerateContentResponse) -> Result<String, ProviderError> {
    if let Some(feedback) = &response.prompt_feedback {
        if let Some(reason) = &feedback.block_reason {
            return Err(ProviderError::new(
                ErrorKind::Blocked,
                format!(
                    "Prompt blocked by Google API. Reason: {}. Safety Ratings: [{}]",
                    reason,
                    summarize(&feedback.safety_ratings)
                ),
            ));
        }
    }

    let Some(text) = response.text() else {
        return Err(ProviderError::new(
            ErrorKind::Blocked,
            "Content generation failed. The prompt was likely blocked by Google API due to safety filters or other policy reasons. Please review prompt_feedback for details if available.",
        ));
    };

    if text.is_empty() {
        if let Some(candidate) = response.candidates.first() {
            let finish_reason = candidate
                .finish_reason
                .as_deref()
                .unwrap_or("FINISH_REASON_UNSPECIFIED");
            if finish_reason != "STOP" {
                return Err(ProviderError::new(
                    ErrorKind::EmptyResponse,
                    format!(
                        "Google Gemini returned no content. Finish Reason: {}. Safety: [{}]",
                        finish_reason,
                        summarize(&candidate.safety_ratings)
                    ),
                ));
            }
        }
        return Err(ProviderError::new(
            ErrorKind::EmptyResponse,
            "Received an empty response from Google Gemini. The prompt may have been too vague or resulted in no actionable output.",
        ));
    }

    Ok(text.trim().to_string())
}

/// Render an upstream failure in Google terms
pub fn describe_failure(failure: UpstreamFailure, model: &str) -> ProviderError {
    let (status, error_type, message) = match failure {
        UpstreamFailure::Status {
            status,
            error_type,
            message,
        } => (status, error_type, message),
        other => {
            return ProviderError::new(
                ErrorKind::Unexpected,
                format!(
                    "An unexpected error occurred while interacting with Google Generative AI - {}",
                    other
                ),
            )
        }
    };

    let error_type = error_type.unwrap_or_else(|| match status {
        400 => "INVALID_ARGUMENT".to_string(),
        403 => "PERMISSION_DENIED".to_string(),
        429 => "RESOURCE_EXHAUSTED".to_string(),
        other => format!("HTTP {}", other),
    });

    if error_type == "INVALID_ARGUMENT" {
        return ProviderError::new(
            ErrorKind::InvalidArgument,
            format!(
                "Google API Invalid Argument - {}. This often means an issue with the request structure (e.g. malformed `contents` or invalid `mime_type`).",
                message
            ),
        );
    }

    let mut detail = format!("Google API Error - {} (Type: {}).", message, error_type);
    let lowered = message.to_lowercase();
    let kind = match error_type.as_str() {
        "PERMISSION_DENIED" => {
            detail.push_str(" This indicates an issue with your GOOGLE_API_KEY (e.g., invalid, disabled, or missing necessary permissions for the Gemini API). Please verify your API key and ensure the 'Generative Language API' or 'Vertex AI API' (if using Vertex) is enabled in your Google Cloud Project.");
            ErrorKind::PermissionDenied
        }
        "RESOURCE_EXHAUSTED" => {
            detail.push_str(" You may have exceeded your API quota (Rate Limit). Please check your usage and limits in the Google Cloud Console.");
            ErrorKind::QuotaExceeded
        }
        _ if lowered.contains("model")
            && (lowered.contains("not found") || lowered.contains("could not find")) =>
        {
            detail.push_str(&format!(
                " The requested model ('{}') might not be found, not available for your project/region, or the name is misspelled.",
                model
            ));
            ErrorKind::Api
        }
        _ => ErrorKind::Api,
    };

    ProviderError::new(kind, detail)
}

/// Google Gemini adapter
pub struct GoogleClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    models: ProviderModels,
}

impl GoogleClient {
    /// Create a new Google client
    pub fn new(client: reqwest::Client, config: &Config, models: &ModelConfig) -> Self {
        Self {
            client,
            base_url: config.google_api_url.trim_end_matches('/').to_string(),
            api_key: config.google_api_key.clone(),
            models: models.google.clone(),
        }
    }

    async fn send(
        &self,
        api_key: &str,
        model: &str,
        body: &GenerateContentRequest,
        ctx: &RequestContext,
    ) -> Result<GenerateContentResponse, UpstreamFailure> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        ctx.log_upstream_request(&url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
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
impl TextGenerator for GoogleClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    #[instrument(skip(self, request), fields(provider = "google"))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let ctx = RequestContext::new(Provider::Google).with_file(request.file().is_some());

        let Some(api_key) = self.api_key.as_deref() else {
            let err = ProviderError::missing_key(Provider::Google.api_key_var());
            ctx.log_error(&err.message);
            return Err(err);
        };

        let prepared = prepare_content(&request.prompt, request.file(), &self.models)
            .map_err(|err| {
                ctx.log_error(&err.message);
                err
            })?;

        let ctx = ctx.with_model(&prepared.model);
        ctx.log_request_start(request.prompt.len());

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: prepared.parts,
            }],
        };

        let result = match self.send(api_key, &prepared.model, &body, &ctx).await {
            Ok(response) => interpret_response(&response),
            Err(failure) => Err(describe_failure(failure, &prepared.model)),
        };

        match &result {
            Ok(text) => ctx.log_request_complete(text.len()),
            Err(err) if matches!(err.kind, ErrorKind::Blocked | ErrorKind::EmptyResponse) => {
                ctx.log_warning(&err.message)
            }
            Err(err) => ctx.log_error(&err.message),
        }

        result
    }
}
