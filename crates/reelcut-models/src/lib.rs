//! Shared data models for the Reelcut backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and their analysis lifecycle
//! - Edit requests (selections, durations, aspect ratios, captions)
//! - Rendition jobs
//! - Transcript entries used for caption burning
//! - Encoding configuration

pub mod aspect;
pub mod edit;
pub mod encoding;
pub mod error;
pub mod job;
pub mod transcript;
pub mod video;

// Re-export common types
pub use aspect::AspectRatio;
pub use edit::{CaptionMode, EditRequest, Selection};
pub use encoding::EncodingConfig;
pub use error::{ModelError, ModelResult};
pub use job::{JobId, RenditionJobResponse};
pub use transcript::{transcript_from_analysis, TranscriptEntry};
pub use video::{TaskHandle, VideoId, VideoRecord, VideoSource, VideoStatus};
