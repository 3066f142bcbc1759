//! Locating the local source file for an edit job.
//!
//! Uploaded videos are written under `sources/` at submission time. URL
//! submissions are downloaded there on the first edit and reused after.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use reelcut_models::{VideoId, VideoRecord, VideoSource};

use crate::error::{RenderError, RenderResult};

const DEFAULT_EXTENSION: &str = "mp4";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on a whole source download, body included.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Resolves a video record to a readable local file.
#[async_trait]
pub trait SourceLocator: Send + Sync {
    async fn locate(&self, record: &VideoRecord) -> RenderResult<PathBuf>;
}

/// Locator backed by a local directory.
pub struct LocalSourceLocator {
    sources_dir: PathBuf,
    http: reqwest::Client,
    /// One lock per video so a URL is fetched once without blocking other videos
    download_locks: Mutex<HashMap<VideoId, Arc<Mutex<()>>>>,
}

impl LocalSourceLocator {
    pub fn new(sources_dir: impl Into<PathBuf>) -> RenderResult<Self> {
        Self::with_download_timeout(sources_dir, DEFAULT_DOWNLOAD_TIMEOUT)
    }

    pub fn with_download_timeout(
        sources_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> RenderResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| RenderError::source_unavailable(e.to_string()))?;
        Ok(Self {
            sources_dir: sources_dir.into(),
            http,
            download_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn sources_dir(&self) -> &Path {
        &self.sources_dir
    }

    pub fn source_path(&self, video_id: &VideoId, file_name: Option<&str>) -> PathBuf {
        source_file_path(&self.sources_dir, video_id, file_name)
    }

    async fn lock_for(&self, video_id: &VideoId) -> Arc<Mutex<()>> {
        let mut locks = self.download_locks.lock().await;
        locks.entry(video_id.clone()).or_default().clone()
    }

    async fn download(&self, video_id: &VideoId, url: &str) -> RenderResult<PathBuf> {
        let file_name = url::Url::parse(url)
            .ok()
            .and_then(|u| u.path_segments().and_then(|s| s.last().map(str::to_string)));
        let target = self.source_path(video_id, file_name.as_deref());

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(target);
        }

        let lock = self.lock_for(video_id).await;
        let _guard = lock.lock().await;
        // Another job may have finished the download while we waited.
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(target);
        }

        info!(video_id = %video_id, "Downloading source from {}", url);
        tokio::fs::create_dir_all(&self.sources_dir).await?;

        let partial = target.with_extension("part");
        if let Err(e) = self.fetch_to(url, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }

        info!(video_id = %video_id, "Source saved to {}", target.display());
        Ok(target)
    }

    /// Stream `url` into `partial`. The caller removes `partial` on error.
    async fn fetch_to(&self, url: &str, partial: &Path) -> RenderResult<()> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RenderError::source_unavailable(format!("download failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(RenderError::source_unavailable(format!(
                "download returned {}",
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(partial).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                RenderError::source_unavailable(format!("download interrupted: {}", e))
            })?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl SourceLocator for LocalSourceLocator {
    async fn locate(&self, record: &VideoRecord) -> RenderResult<PathBuf> {
        match &record.source {
            VideoSource::Upload { path, .. } => {
                if tokio::fs::try_exists(path).await.unwrap_or(false) {
                    Ok(path.clone())
                } else {
                    warn!(video_id = %record.id, "Uploaded source missing at {}", path.display());
                    Err(RenderError::source_unavailable(format!(
                        "uploaded file missing: {}",
                        path.display()
                    )))
                }
            }
            VideoSource::Url { url } => self.download(&record.id, url).await,
        }
    }
}

/// Where the source for `video_id` is stored under `sources_dir`, keeping
/// the extension of `file_name` when it has a sane one.
pub fn source_file_path(sources_dir: &Path, video_id: &VideoId, file_name: Option<&str>) -> PathBuf {
    let ext = file_name
        .and_then(extension_of)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    sources_dir.join(format!("{}.{}", video_id, ext))
}

fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    let sane = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    sane.then_some(ext)
}
