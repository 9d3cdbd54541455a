//! Error types for the analysis service

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication error: {0}")]
    AuthenticationFailure(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limited: retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure category surfaced to callers and HTTP clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    AuthenticationFailure,
    ServiceUnavailable,
    RateLimited,
    Timeout,
    Internal,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidInput(_) => ErrorKind::InvalidInput,
            AnalysisError::AuthenticationFailure(_) => ErrorKind::AuthenticationFailure,
            AnalysisError::ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
            AnalysisError::RateLimited { .. } => ErrorKind::RateLimited,
            AnalysisError::Timeout { .. } => ErrorKind::Timeout,
            AnalysisError::Network(e) if e.is_timeout() => ErrorKind::Timeout,
            AnalysisError::Network(_) => ErrorKind::ServiceUnavailable,
            AnalysisError::Api { .. }
            | AnalysisError::InvalidResponse(_)
            | AnalysisError::Json(_)
            | AnalysisError::Config(_)
            | AnalysisError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl ErrorKind {
    /// Message safe to show to end users
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "The submitted text could not be analyzed",
            ErrorKind::AuthenticationFailure => {
                "The language service rejected the configured credentials"
            }
            ErrorKind::ServiceUnavailable => "The language service is currently unavailable",
            ErrorKind::RateLimited => "Too many requests to the language service, try again later",
            ErrorKind::Timeout => "The language service did not respond in time",
            ErrorKind::Internal => "Internal server error",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
