//! Video encoding configuration for re-encoded renditions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "fast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 18;
/// Audio is passed through untouched
pub const AUDIO_PASSTHROUGH: &str = "copy";

/// Encoding settings applied when a rendition is scaled or captioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264", "h264_nvenc")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec; `copy` keeps the source stream
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Use hardware acceleration (NVENC)
    #[serde(default)]
    pub use_nvenc: bool,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    AUDIO_PASSTHROUGH.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: AUDIO_PASSTHROUGH.to_string(),
            use_nvenc: false,
        }
    }
}

impl EncodingConfig {
    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(51);
        self
    }

    /// Returns a new config with updated preset.
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    /// Enable NVENC hardware acceleration.
    pub fn with_nvenc(mut self) -> Self {
        self.use_nvenc = true;
        self.codec = "h264_nvenc".to_string();
        self
    }

    /// Video encoder arguments.
    pub fn video_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ];

        // CRF is not used with NVENC, use -cq instead
        if self.use_nvenc {
            args.extend(["-cq".to_string(), self.crf.to_string()]);
        } else {
            args.extend(["-crf".to_string(), self.crf.to_string()]);
        }

        args
    }

    /// Full output arguments: video encoder plus audio handling.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = self.video_args();
        args.extend(["-c:a".to_string(), self.audio_codec.clone()]);
        args
    }
}
