//! Error types for Promptrelay
//!
//! `AppError` is what handlers return. Every variant renders as
//! `{"detail": "<message>"}` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::ProviderError;

/// Marker every adapter-reported failure message starts with
pub const ERROR_MARKER: &str = "Error:";

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid AI provider specified. Choose 'openai' or 'google'.")]
    InvalidProvider,

    #[error("{0} not configured. Please set it in the .env file.")]
    MissingCredential(&'static str),

    #[error("Field required: {0}")]
    MissingField(&'static str),

    #[error("Error processing uploaded file: {0}")]
    FileRead(String),

    #[error("Invalid form data: {0}")]
    BadRequest(String),

    /// Failure reported by a provider adapter; the message is passed through untouched
    #[error("{0}")]
    Provider(String),

    #[error("An unexpected server error occurred while contacting the AI provider: {0}")]
    Unexpected(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err.to_string())
    }
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidProvider | AppError::FileRead(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::MissingCredential(_)
            | AppError::Provider(_)
            | AppError::Unexpected(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
