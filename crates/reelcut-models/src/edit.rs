//! Edit requests: time-range selections plus an output matrix.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::VideoId;

/// A half-open `[start_ms, end_ms)` range into the source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Selection {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn is_valid(&self) -> bool {
        self.start_ms < self.end_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Start offset in seconds, as passed to ffmpeg `-ss`.
    pub fn start_secs(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    /// Length in seconds, as passed to ffmpeg `-t`.
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }
}

/// How captions are applied to renditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    #[default]
    None,
    /// Burn the transcript into the video frames
    Burned,
}

impl CaptionMode {
    pub fn parse(value: &str) -> ModelResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(CaptionMode::None),
            "burned" => Ok(CaptionMode::Burned),
            other => Err(ModelError::UnknownCaptionMode(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptionMode::None => "none",
            CaptionMode::Burned => "burned",
        }
    }
}

impl fmt::Display for CaptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of `POST /api/edits`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub video_id: VideoId,
    pub selections: Vec<Selection>,
    /// Opaque template identifier, not interpreted
    #[serde(default)]
    pub template_id: Option<String>,
    pub aspect_ratios: Vec<String>,
    pub durations_sec: Vec<u32>,
    /// `none` or `burned`; kept as text so unknown values surface as validation errors
    #[serde(default)]
    pub captions: Option<String>,
}

impl EditRequest {
    /// Check the request shape. Does not resolve the video.
    pub fn validate(&self) -> ModelResult<()> {
        if !self.video_id.is_valid() {
            return Err(ModelError::InvalidVideoId(self.video_id.to_string()));
        }
        if self.selections.is_empty() {
            return Err(ModelError::NoSelections);
        }
        if let Some((index, sel)) = self
            .selections
            .iter()
            .enumerate()
            .find(|(_, s)| !s.is_valid())
        {
            return Err(ModelError::InvalidSelection {
                index,
                start_ms: sel.start_ms,
                end_ms: sel.end_ms,
            });
        }
        if self.durations_sec.is_empty() {
            return Err(ModelError::NoDurations);
        }
        if self.durations_sec.contains(&0) {
            return Err(ModelError::ZeroDuration);
        }
        if self.aspect_ratios.iter().all(|a| a.trim().is_empty()) {
            return Err(ModelError::NoAspectRatios);
        }
        self.caption_mode()?;
        Ok(())
    }

    pub fn caption_mode(&self) -> ModelResult<CaptionMode> {
        self.captions
            .as_deref()
            .map(CaptionMode::parse)
            .unwrap_or(Ok(CaptionMode::None))
    }

    /// Requested durations with duplicates removed, first occurrence wins.
    pub fn unique_durations(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        self.durations_sec
            .iter()
            .copied()
            .filter(|d| seen.insert(*d))
            .collect()
    }

    /// Requested aspect labels, trimmed, with duplicates removed.
    pub fn unique_aspect_labels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.aspect_ratios
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && seen.insert(a.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> EditRequest {
        serde_json::from_value(json!({
            "videoId": "vid_0a1b2c3d",
            "selections": [{"startMs": 0, "endMs": 1000}, {"startMs": 2000, "endMs": 3000}],
            "templateId": "promo",
            "aspectRatios": ["9:16", "16:9", "9:16"],
            "durationsSec": [15, 30, 15],
            "captions": "none"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_request() {
        let req = request();
        assert!(req.validate().is_ok());
        assert_eq!(req.unique_durations(), vec![15, 30]);
        assert_eq!(req.unique_aspect_labels(), vec!["9:16", "16:9"]);
        assert_eq!(req.caption_mode().unwrap(), CaptionMode::None);
    }

    #[test]
    fn test_rejects_inverted_selection() {
        let mut req = request();
        req.selections.push(Selection::new(5000, 5000));
        assert_eq!(
            req.validate(),
            Err(ModelError::InvalidSelection {
                index: 2,
                start_ms: 5000,
                end_ms: 5000
            })
        );
    }

    #[test]
    fn test_rejects_empty_matrix() {
        let mut req = request();
        req.selections.clear();
        assert_eq!(req.validate(), Err(ModelError::NoSelections));

        let mut req = request();
        req.durations_sec = vec![10, 0];
        assert_eq!(req.validate(), Err(ModelError::ZeroDuration));

        let mut req = request();
        req.aspect_ratios.clear();
        assert_eq!(req.validate(), Err(ModelError::NoAspectRatios));
    }

    #[test]
    fn test_caption_modes() {
        let mut req = request();
        req.captions = Some("Burned".to_string());
        assert_eq!(req.caption_mode().unwrap(), CaptionMode::Burned);

        req.captions = None;
        assert_eq!(req.caption_mode().unwrap(), CaptionMode::None);

        req.captions = Some("karaoke".to_string());
        assert!(matches!(
            req.validate(),
            Err(ModelError::UnknownCaptionMode(_))
        ));
    }

    #[test]
    fn test_selection_seconds() {
        let sel = Selection::new(1500, 4000);
        assert_eq!(sel.start_secs(), 1.5);
        assert_eq!(sel.duration_secs(), 2.5);
    }
}
