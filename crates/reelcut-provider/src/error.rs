//! Provider client error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider returned {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn not_configured(what: impl Into<String>) -> Self {
        Self::NotConfigured(what.into())
    }

    /// Transport-level failures: connect errors, timeouts, dropped bodies.
    pub fn is_network(&self) -> bool {
        matches!(self, ProviderError::Network(_))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) => true,
            ProviderError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
