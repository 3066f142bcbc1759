//! Video submission and status handlers.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::Json;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use reelcut_models::{TaskHandle, VideoId, VideoRecord, VideoSource, VideoStatus};
use reelcut_provider::{ProviderError, SubmitSource};
use reelcut_render::source_file_path;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

const DEFAULT_UPLOAD_NAME: &str = "upload.mp4";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoResponse {
    pub video_id: VideoId,
}

/// Submit a video by upload (`file` field) or by URL (`url` field).
pub async fn create_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<CreateVideoResponse>> {
    let mut multipart =
        multipart.map_err(|e| ApiError::bad_request(format!("Expected a multipart form: {}", e)))?;

    let video_id = VideoId::new();
    let mut upload: Option<(PathBuf, String)> = None;
    let mut url: Option<String> = None;

    let read = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") if upload.is_none() => {
                    let file_name = field
                        .file_name()
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or(DEFAULT_UPLOAD_NAME)
                        .to_string();
                    let path = source_file_path(&state.sources_dir, &video_id, Some(&file_name));
                    // Browsers send an empty part when no file was chosen
                    if save_field(field, &path).await? > 0 {
                        upload = Some((path, file_name));
                    } else {
                        remove_upload(&path).await;
                    }
                }
                Some("url") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid url field: {}", e)))?;
                    let text = text.trim();
                    if !text.is_empty() {
                        url = Some(text.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok::<_, ApiError>(())
    };
    if let Err(e) = read.await {
        if let Some((path, _)) = &upload {
            remove_upload(path).await;
        }
        return Err(e);
    }

    let (source, submit) = match (upload, url) {
        (None, None) => {
            return Err(ApiError::bad_request(
                "Either a video file or a url must be provided",
            ))
        }
        (Some((path, _)), Some(_)) => {
            remove_upload(&path).await;
            return Err(ApiError::bad_request(
                "Provide either a video file or a url, not both",
            ));
        }
        (Some((path, file_name)), None) => (
            VideoSource::Upload {
                path: path.clone(),
                file_name: Some(file_name.clone()),
            },
            SubmitSource::File { path, file_name },
        ),
        (None, Some(url)) => {
            let parsed = url::Url::parse(&url)
                .map_err(|e| ApiError::bad_request(format!("Invalid url: {}", e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ApiError::bad_request("Only http and https urls are supported"));
            }
            (VideoSource::Url { url: url.clone() }, SubmitSource::Url(url))
        }
    };
    let source_kind = match &source {
        VideoSource::Upload { .. } => "upload",
        VideoSource::Url { .. } => "url",
    };

    match submit_to_provider(&state, submit).await {
        Ok(handle) => {
            info!(video_id = %video_id, task = %handle, "Video submitted for analysis");
            metrics::record_video_submitted(source_kind, "accepted");
            state
                .store
                .put(VideoRecord::submitted(video_id.clone(), handle, source))
                .await;
            Ok(Json(CreateVideoResponse { video_id }))
        }
        Err(e) => {
            warn!(video_id = %video_id, "Submission failed: {}", e);
            metrics::record_video_submitted(source_kind, "failed");
            if let VideoSource::Upload { path, .. } = &source {
                remove_upload(path).await;
            }
            Err(e.into())
        }
    }
}

async fn submit_to_provider(
    state: &AppState,
    submit: SubmitSource,
) -> Result<TaskHandle, ProviderError> {
    if !state.provider.is_configured() {
        return Err(ProviderError::not_configured(
            "provider index not configured; set PROVIDER_INDEX_ID",
        ));
    }
    state.provider.submit(submit).await
}

/// Stream a multipart field to `path`, returning the bytes written.
async fn save_field(mut field: Field<'_>, path: &Path) -> ApiResult<u64> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to prepare upload dir: {}", e)))?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create upload file: {}", e)))?;

    let mut written = 0u64;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                drop(file);
                remove_upload(path).await;
                return Err(ApiError::bad_request(format!("Upload interrupted: {}", e)));
            }
        };
        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            remove_upload(path).await;
            return Err(ApiError::internal(format!("Failed to write upload: {}", e)));
        }
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
    Ok(written)
}

async fn remove_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove upload {}: {}", path.display(), e);
        }
    }
}

fn parse_video_id(raw: String) -> ApiResult<VideoId> {
    let id = VideoId::from(raw);
    if !id.is_valid() {
        return Err(ApiError::bad_request("Invalid video id"));
    }
    Ok(id)
}

/// Video status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatusResponse {
    pub id: VideoId,
    pub status: VideoStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub task_handle: TaskHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
}

impl From<VideoRecord> for VideoStatusResponse {
    fn from(record: VideoRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            progress: record.progress,
            message: record.message,
            error: record.error_detail,
            task_handle: record.task_handle,
            analysis: record.analysis,
        }
    }
}

/// Poll the provider and return the refreshed status.
pub async fn get_video_status(
    State(state): State<AppState>,
    UrlPath(video_id): UrlPath<String>,
) -> ApiResult<Json<VideoStatusResponse>> {
    let video_id = parse_video_id(video_id)?;
    let record = state
        .bridge
        .refresh(&video_id)
        .await
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    Ok(Json(record.into()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetailResponse {
    pub video_id: VideoId,
    pub status: VideoStatus,
    pub analysis: Option<serde_json::Value>,
    pub task_handle: TaskHandle,
}

/// Stored detail of a completed video.
pub async fn get_video(
    State(state): State<AppState>,
    UrlPath(video_id): UrlPath<String>,
) -> ApiResult<Json<VideoDetailResponse>> {
    let record = completed_record(&state, video_id).await?;
    Ok(Json(VideoDetailResponse {
        video_id: record.id,
        status: record.status,
        analysis: record.analysis,
        task_handle: record.task_handle,
    }))
}

/// Analysis document of a completed video.
pub async fn get_video_analysis(
    State(state): State<AppState>,
    UrlPath(video_id): UrlPath<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let record = completed_record(&state, video_id).await?;
    record
        .analysis
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Analysis not available"))
}

async fn completed_record(state: &AppState, video_id: String) -> ApiResult<VideoRecord> {
    let video_id = parse_video_id(video_id)?;
    let record = state
        .store
        .get(&video_id)
        .await
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    if !record.is_completed() {
        return Err(ApiError::bad_request("Video analysis not yet complete"));
    }
    Ok(record)
}
