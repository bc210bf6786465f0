//! Text generation endpoint
//!
//! `POST /api/generate` takes a multipart form with `provider`, `text` and an
//! optional `file`, and relays it to the chosen provider.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    error::{AppError, AppResult, ERROR_MARKER},
    provider::{GenerationRequest, Provider, TextGenerator, UploadedFile},
    routes::metrics::{record_request, record_upload},
    AppState,
};

/// Successful generation response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateResponse {
    pub response: String,
}

/// Raw form contents, before validation
#[derive(Debug)]
struct GenerateForm {
    provider: Option<String>,
    text: Option<String>,
    /// A failed upload read is kept here and reported after provider checks
    file: Result<Option<UploadedFile>, String>,
}

impl Default for GenerateForm {
    fn default() -> Self {
        Self {
            provider: None,
            text: None,
            file: Ok(None),
        }
    }
}

async fn read_form(mut multipart: Multipart) -> AppResult<GenerateForm> {
    let mut form = GenerateForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(AppError::BadRequest(e.body_text())),
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("provider") => {
                form.provider = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?,
                );
            }
            Some("text") => {
                form.text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?,
                );
            }
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);

                match field.bytes().await {
                    // Browsers send an empty, unnamed part when no file was picked
                    Ok(data) if data.is_empty() && filename.as_deref().unwrap_or("").is_empty() => {}
                    Ok(data) => {
                        form.file = Ok(Some(UploadedFile::new(data, filename, mime_type)));
                    }
                    Err(e) => {
                        warn!(filename = ?filename, error = %e, "Error reading uploaded file");
                        form.file = Err(e.body_text());
                        // The stream is unusable past a failed field
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Fail with a 500 naming the variable when a provider has no credential
fn check_api_key(config: &Config, provider: Provider) -> AppResult<()> {
    match config.api_key(provider) {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => {
            let err = AppError::MissingCredential(provider.api_key_var());
            error!(provider = %provider, "API key error: {}", err);
            Err(err)
        }
    }
}

/// Run the adapter on its own task so a panic surfaces as an error
async fn dispatch(
    generator: Arc<dyn TextGenerator>,
    request: GenerationRequest,
) -> AppResult<String> {
    let outcome = tokio::spawn(async move { generator.generate(&request).await }).await;

    match outcome {
        Ok(Ok(text)) if text.starts_with(ERROR_MARKER) => Err(AppError::Provider(text)),
        Ok(Ok(text)) => Ok(text),
        Ok(Err(err)) => Err(err.into()),
        Err(join_error) => Err(AppError::Unexpected(join_error.to_string())),
    }
}

/// Handle text generation requests
pub async fn generate_text(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<GenerateResponse>> {
    let start_time = Instant::now();

    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let form = read_form(multipart).await?;

    let provider_name = form.provider.ok_or(AppError::MissingField("provider"))?;
    let prompt = form.text.ok_or(AppError::MissingField("text"))?;

    info!(
        provider = %provider_name,
        text_length = prompt.len(),
        file = ?form.file.as_ref().ok().and_then(|f| f.as_ref()).and_then(|f| f.filename.as_deref()),
        "Received generation request"
    );

    let provider: Provider = provider_name.parse().map_err(|e| {
        warn!(provider = %provider_name, "Invalid provider specified");
        e
    })?;

    check_api_key(&state.config, provider)?;

    let upload = form.file.map_err(AppError::FileRead)?;
    if let Some(file) = &upload {
        info!(
            filename = ?file.filename,
            mime_type = ?file.mime_type,
            size = file.data.len(),
            "File processed"
        );
        record_upload(provider, file.data.len());
    }

    let request = GenerationRequest {
        provider,
        prompt,
        upload,
    };

    let result = dispatch(state.generator(provider), request).await;
    let duration = start_time.elapsed().as_secs_f64();

    match result {
        Ok(text) => {
            record_request(provider, "success", duration);
            info!(
                provider = %provider,
                duration_ms = %format!("{:.2}", duration * 1000.0),
                "Successfully generated response"
            );
            Ok(Json(GenerateResponse { response: text }))
        }
        Err(err) => {
            let outcome = match &err {
                AppError::Provider(_) => "provider_error",
                _ => "unexpected_error",
            };
            record_request(provider, outcome, duration);
            error!(provider = %provider, error = %err, "Generation failed");
            Err(err)
        }
    }
}
