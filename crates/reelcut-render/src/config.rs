//! Render configuration.

use std::path::{Path, PathBuf};

use reelcut_media::DEFAULT_FFMPEG_TIMEOUT_SECS;
use reelcut_models::EncodingConfig;

use crate::matrix::VariantStrategy;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Root for uploaded sources and job directories
    pub data_dir: PathBuf,
    /// Hard timeout for each FFmpeg invocation
    pub ffmpeg_timeout_secs: u64,
    /// Variants rendered at once; 1 renders sequentially
    pub concurrency: usize,
    /// Encoder settings for scaled renditions
    pub encoding: EncodingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            ffmpeg_timeout_secs: DEFAULT_FFMPEG_TIMEOUT_SECS,
            concurrency: 1,
            encoding: EncodingConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Config rooted at `data_dir` with defaults for everything else.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let mut encoding = EncodingConfig::default();
        if let Some(crf) = std::env::var("RENDER_CRF").ok().and_then(|s| s.parse().ok()) {
            encoding = encoding.with_crf(crf);
        }
        if let Ok(preset) = std::env::var("RENDER_PRESET") {
            encoding = encoding.with_preset(preset);
        }
        if std::env::var("RENDER_USE_NVENC")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
        {
            encoding = encoding.with_nvenc();
        }

        Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_FFMPEG_TIMEOUT_SECS),
            concurrency: std::env::var("RENDER_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(1),
            encoding,
        }
    }

    /// Directory holding uploaded and downloaded sources.
    pub fn sources_dir(&self) -> PathBuf {
        self.data_dir.join("sources")
    }

    /// Parent of all per-job working directories.
    pub fn jobs_dir(&self) -> PathBuf {
        self.data_dir.join("jobs")
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.jobs_dir().join(job_id)
    }

    pub fn strategy(&self) -> VariantStrategy {
        VariantStrategy::from_concurrency(self.concurrency)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let config = RenderConfig::with_data_dir("/srv/reelcut");
        assert_eq!(config.sources_dir(), PathBuf::from("/srv/reelcut/sources"));
        assert_eq!(config.job_dir("j1"), PathBuf::from("/srv/reelcut/jobs/j1"));
        assert_eq!(config.ffmpeg_timeout_secs, 300);
        assert_eq!(config.strategy(), VariantStrategy::Sequential);
    }
}
