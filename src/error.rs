//! Application error types

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request never produced a response (DNS, refused connection,
    /// timeout). Distinct from `Backend` so call sites can treat
    /// "unreachable" globally and backend rejections locally.
    #[error("Backend unreachable: {0}")]
    Transport(String),

    /// The backend answered with `success: false`. `detail` carries the
    /// nested `error.detail`/`error.message` so every call site reads the
    /// rejection reason the same way.
    #[error("Backend rejected request: {message}")]
    Backend {
        message: String,
        detail: Option<String>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Backend-provided detail message, falling back to the top-level message.
    pub fn detail(&self) -> Option<&str> {
        match self {
            AppError::Backend { message, detail } => {
                Some(detail.as_deref().unwrap_or(message.as_str()))
            }
            _ => None,
        }
    }

    /// True when no response reached the client at all.
    pub fn is_transport(&self) -> bool {
        match self {
            AppError::Transport(_) => true,
            AppError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// Serializable error response for UI consumers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        let code = match &err {
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Transport(_) => "TRANSPORT_ERROR",
            AppError::Backend { .. } => "BACKEND_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            detail: err.detail().map(|d| d.to_string()),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
