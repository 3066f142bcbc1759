//! FFmpeg CLI wrapper for the rendition pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building (argument vectors, never shell strings)
//! - A process executor abstraction with typed outcomes and a hard timeout
//! - Pipeline stages: segment extraction, concatenation, trimming, rendering
//! - SRT generation and subtitle burn-in filters

pub mod clip;
pub mod command;
pub mod concat;
pub mod error;
pub mod filters;
pub mod subtitles;
pub mod transform;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clip::{extract_segment, extract_segments, trim_to_duration};
pub use command::{
    check_ffmpeg, CommandExecutor, FfmpegCommand, FfmpegRunner, ProcessOutcome, TokioExecutor,
    DEFAULT_FFMPEG_TIMEOUT_SECS,
};
pub use concat::concat_segments;
pub use error::{MediaError, MediaResult};
pub use subtitles::{ms_to_subtitle_timestamp, retime_for_selections, transcript_to_srt, write_srt};
pub use transform::{render_variant, rendition_file_name, VariantSpec};
