//! Validation errors for request models.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("At least one selection is required")]
    NoSelections,

    #[error("Selection {index} is invalid: startMs ({start_ms}) must be before endMs ({end_ms})")]
    InvalidSelection {
        index: usize,
        start_ms: u64,
        end_ms: u64,
    },

    #[error("At least one target duration is required")]
    NoDurations,

    #[error("Target durations must be positive whole seconds")]
    ZeroDuration,

    #[error("At least one aspect ratio is required")]
    NoAspectRatios,

    #[error("Unknown caption mode: {0}")]
    UnknownCaptionMode(String),

    #[error("Invalid video ID: {0}")]
    InvalidVideoId(String),
}
