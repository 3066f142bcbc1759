//! Video records and their analysis lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Prefix for locally generated video identifiers.
pub const VIDEO_ID_PREFIX: &str = "vid_";

/// Progress reported right after a successful submission.
pub const SUBMITTED_PROGRESS: u8 = 10;

/// Unique identifier for a submitted video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID (`vid_` followed by 8 hex chars).
    pub fn new() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", VIDEO_ID_PREFIX, &hex[..8]))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the ID is safe to use in paths and logs.
    ///
    /// Valid format: ASCII alphanumerics, `_` and `-`, 1-64 chars.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= 64
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque reference to the provider's asynchronous indexing task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskHandle(pub String);

impl TaskHandle {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Analysis status as exposed by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Submitted or queued at the provider
    #[default]
    Processing,
    /// Provider is indexing the video
    Indexing,
    /// Analysis finished successfully
    Completed,
    /// Analysis failed
    Error,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Processing => "processing",
            VideoStatus::Indexing => "indexing",
            VideoStatus::Completed => "completed",
            VideoStatus::Error => "error",
        }
    }

    /// Terminal states receive no further provider updates.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Completed | VideoStatus::Error)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the source media for a video lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoSource {
    /// Bytes uploaded with the submission, persisted locally.
    Upload {
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
    /// Remote URL handed to the provider; fetched locally on first edit.
    Url { url: String },
}

/// One submitted video's lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: VideoId,
    pub status: VideoStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub message: String,
    pub task_handle: TaskHandle,
    /// Provider video id linked to the task, once known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_video_id: Option<String>,
    /// Cached analysis document; set once, never cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
    /// Failure reason, set iff status is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub source: VideoSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create the record for a freshly submitted video.
    pub fn submitted(id: VideoId, task_handle: TaskHandle, source: VideoSource) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: VideoStatus::Processing,
            progress: SUBMITTED_PROGRESS,
            message: "Video submitted for analysis".to_string(),
            task_handle,
            provider_video_id: None,
            analysis: None,
            error_detail: None,
            source,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the status triple and keep `error_detail` consistent with it.
    pub fn set_status(
        &mut self,
        status: VideoStatus,
        progress: u8,
        message: impl Into<String>,
        error_detail: Option<String>,
    ) {
        self.status = status;
        self.progress = progress.min(100);
        self.message = message.into();
        self.error_detail = if status == VideoStatus::Error {
            error_detail.or_else(|| Some("Unknown error".to_string()))
        } else {
            None
        };
        self.updated_at = Utc::now();
    }

    /// Cache the analysis document. A document already present is kept.
    ///
    /// Returns `true` when the document was stored.
    pub fn attach_analysis(&mut self, analysis: serde_json::Value) -> bool {
        if self.analysis.is_some() {
            return false;
        }
        self.analysis = Some(analysis);
        self.updated_at = Utc::now();
        true
    }

    pub fn is_completed(&self) -> bool {
        self.status == VideoStatus::Completed
    }
}
