//! Render error types.

use thiserror::Error;

use reelcut_models::ModelError;

pub type RenderResult<T> = Result<T, RenderError>;

/// Job-level failures. Per-variant failures never surface here; they only
/// reduce the output count.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid edit request: {0}")]
    InvalidRequest(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Source video unavailable: {0}")]
    SourceUnavailable(String),

    #[error("No segments could be extracted from the source video")]
    NoSegmentsExtracted,

    #[error("Failed to concatenate segments: {0}")]
    ConcatenationFailed(String),

    #[error("No video variants were produced ({attempted} attempted)")]
    NoRenditionsProduced { attempted: usize },

    #[error("Media error: {0}")]
    Media(#[from] reelcut_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }
}

impl From<ModelError> for RenderError {
    fn from(e: ModelError) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}
