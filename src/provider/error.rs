//! Normalized provider errors
//!
//! Both adapters classify what went wrong on the wire into an
//! [`UpstreamFailure`] first, then render it into a [`ProviderError`] whose
//! message starts with [`ERROR_MARKER`] and is shown to the caller verbatim.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::error::ERROR_MARKER;

/// Category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingKey,
    InvalidInput,
    Connection,
    RateLimited,
    Authentication,
    InvalidArgument,
    PermissionDenied,
    QuotaExceeded,
    Api,
    Blocked,
    EmptyResponse,
    InvalidResponse,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingKey => "missing_key",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Connection => "connection",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Authentication => "authentication",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::Api => "api",
            ErrorKind::Blocked => "blocked",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Unexpected => "unexpected",
        }
    }
}

/// Failure reported by an adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    /// Build an error; the marker is prepended to `detail`
    pub fn new(kind: ErrorKind, detail: impl fmt::Display) -> Self {
        Self {
            kind,
            message: format!("{} {}", ERROR_MARKER, detail),
        }
    }

    /// Adapter invoked without its credential
    pub fn missing_key(var: &str) -> Self {
        Self::new(
            ErrorKind::MissingKey,
            format!(
                "{} not found in environment variables. Please set it in your .env file or system environment.",
                var
            ),
        )
    }
}

/// What went wrong talking to a provider, before provider-specific wording
#[derive(Debug, Error)]
pub enum UpstreamFailure {
    /// The provider could not be reached
    #[error("{0}")]
    Connection(String),

    /// The provider answered with a non-success status
    #[error("Error code: {status} - {message}")]
    Status {
        status: u16,
        /// OpenAI `error.type` or Google `error.status`
        error_type: Option<String>,
        message: String,
    },

    /// Anything else, e.g. a body that does not decode
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl UpstreamFailure {
    /// Classify a transport-level error from reqwest
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            UpstreamFailure::Other(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() {
            UpstreamFailure::Connection(err.to_string())
        } else {
            UpstreamFailure::Other(err.to_string())
        }
    }

    /// Classify a non-success HTTP response
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Self::from_status(status, &text)
    }

    /// Classify a status code and raw error body
    pub fn from_status(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => UpstreamFailure::Status {
                status,
                error_type: envelope.error.error_type.or(envelope.error.status),
                message: envelope.error.message.unwrap_or_else(|| body.to_string()),
            },
            Err(_) => UpstreamFailure::Status {
                status,
                error_type: None,
                message: body.to_string(),
            },
        }
    }

    /// Provider error type if the provider sent one
    pub fn error_type(&self) -> Option<&str> {
        match self {
            UpstreamFailure::Status { error_type, .. } => error_type.as_deref(),
            _ => None,
        }
    }
}
