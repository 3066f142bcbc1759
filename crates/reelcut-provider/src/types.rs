//! Provider request and response types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to submit for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitSource {
    /// A local file, streamed as a multipart part
    File { path: PathBuf, file_name: String },
    /// A remote URL the provider downloads itself
    Url(String),
}

/// Task status as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderTaskStatus {
    Pending,
    Validating,
    Indexing,
    Ready,
    Failed,
    Other(String),
}

impl ProviderTaskStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "validating" => Self::Validating,
            "indexing" => Self::Indexing,
            "ready" => Self::Ready,
            "failed" => Self::Failed,
            _ => Self::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::Indexing => "indexing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub status: ProviderTaskStatus,
    /// Provider video id linked to the task
    pub video_id: Option<String>,
    pub error_message: Option<String>,
}

/// Response from `POST /tasks`. Either field may carry the id.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreateTaskResponse {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub task_id: Option<String>,
}

impl CreateTaskResponse {
    pub fn into_id(self) -> Option<String> {
        self.id.or(self.task_id).filter(|id| !id.is_empty())
    }
}

/// Response from `GET /tasks/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TaskResponse {
    #[serde(default)]
    pub status: String,
    pub video_id: Option<String>,
    pub error_message: Option<String>,
}

impl From<TaskResponse> for TaskSnapshot {
    fn from(r: TaskResponse) -> Self {
        Self {
            status: ProviderTaskStatus::parse(&r.status),
            video_id: r.video_id.filter(|v| !v.is_empty()),
            error_message: r.error_message,
        }
    }
}

/// One index as listed by `GET /indexes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub index_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IndexListResponse {
    #[serde(default)]
    pub data: Vec<IndexSummary>,
}

/// Engine settings for a new index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexEngine {
    pub engine_name: String,
    pub engine_options: Vec<String>,
}

/// Body of `POST /indexes`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIndexRequest {
    pub index_name: String,
    pub engines: Vec<IndexEngine>,
    pub addons: Vec<String>,
}

impl CreateIndexRequest {
    /// Index with visual, conversation, on-screen text and logo search
    /// plus a generative engine and thumbnails.
    pub fn advertising(name: impl Into<String>) -> Self {
        let opts = |o: &[&str]| o.iter().map(|s| s.to_string()).collect();
        Self {
            index_name: name.into(),
            engines: vec![
                IndexEngine {
                    engine_name: "marengo2.6".to_string(),
                    engine_options: opts(&["visual", "conversation", "text_in_video", "logo"]),
                },
                IndexEngine {
                    engine_name: "pegasus1.1".to_string(),
                    engine_options: opts(&["conversation", "text_in_video"]),
                },
            ],
            addons: vec!["thumbnail".to_string()],
        }
    }
}
