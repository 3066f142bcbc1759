//! Provider HTTP client.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, info, warn};

use reelcut_models::TaskHandle;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::types::{
    CreateIndexRequest, CreateTaskResponse, IndexListResponse, IndexSummary, SubmitSource,
    TaskResponse, TaskSnapshot,
};

const API_KEY_HEADER: &str = "x-api-key";
const RETRY_BASE_DELAY_MS: u64 = 500;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// The operations the rest of the system needs from the analysis provider.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Whether submissions can be accepted (key and index present).
    fn is_configured(&self) -> bool;

    /// Submit a video for indexing and return the task handle.
    async fn submit(&self, source: SubmitSource) -> ProviderResult<TaskHandle>;

    /// Current state of an indexing task.
    async fn poll(&self, task: &TaskHandle) -> ProviderResult<TaskSnapshot>;

    /// Analysis document for an indexed video.
    async fn fetch_analysis(&self, video_id: &str) -> ProviderResult<serde_json::Value>;
}

/// Client for the provider's REST API.
pub struct ProviderClient {
    http: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create a new provider client.
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ProviderConfig::from_env()?)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str, timeout: Duration) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .header(API_KEY_HEADER, &self.config.api_key)
            .timeout(timeout)
    }

    fn post(&self, path: &str, timeout: Duration) -> RequestBuilder {
        self.http
            .post(self.url(path))
            .header(API_KEY_HEADER, &self.config.api_key)
            .timeout(timeout)
    }

    /// List the indexes visible to this key.
    pub async fn list_indexes(&self) -> ProviderResult<Vec<IndexSummary>> {
        let response = self
            .with_retry(|| async move {
                let response = self.get("indexes", self.config.fetch_timeout).send().await?;
                check_status(response).await
            })
            .await?;
        let list: IndexListResponse = response.json().await?;
        Ok(list.data)
    }

    /// Create an index and return its id.
    pub async fn create_index(&self, request: &CreateIndexRequest) -> ProviderResult<String> {
        info!("Creating provider index {}", request.index_name);
        let response = self
            .post("indexes", self.config.submit_timeout)
            .json(request)
            .send()
            .await?;
        let body: serde_json::Value = check_status(response).await?.json().await?;
        body.get("_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::InvalidResponse("index response has no _id".into()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> ProviderResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ProviderResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "Provider request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Exponential backoff from 500ms, capped at 30s.
fn backoff_delay(attempt: u32) -> Duration {
    let millis = RETRY_BASE_DELAY_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(millis).min(RETRY_MAX_DELAY)
}

/// Turn a non-2xx response into [`ProviderError::RequestFailed`].
async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl AnalysisProvider for ProviderClient {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn submit(&self, source: SubmitSource) -> ProviderResult<TaskHandle> {
        let index_id = self
            .config
            .index_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ProviderError::not_configured(
                    "index not configured; run reelcut-index and set PROVIDER_INDEX_ID",
                )
            })?;

        let form = Form::new().text("index_id", index_id);
        let form = match &source {
            SubmitSource::Url(url) => form.text("video_url", url.clone()),
            SubmitSource::File { path, file_name } => {
                let file = tokio::fs::File::open(path).await?;
                let len = file.metadata().await?.len();
                let part = Part::stream_with_length(Body::from(file), len)
                    .file_name(file_name.clone());
                form.part("file", part)
            }
        };

        debug!("Submitting video to {}", self.url("tasks"));
        let response = self
            .post("tasks", self.config.submit_timeout)
            .multipart(form)
            .send()
            .await?;
        let created: CreateTaskResponse = check_status(response).await?.json().await?;

        let task_id = created
            .into_id()
            .ok_or_else(|| ProviderError::InvalidResponse("task response has no id".into()))?;
        info!("Provider task created: {}", task_id);
        Ok(TaskHandle::new(task_id))
    }

    async fn poll(&self, task: &TaskHandle) -> ProviderResult<TaskSnapshot> {
        let response = self
            .get(&format!("tasks/{}", task), self.config.poll_timeout)
            .send()
            .await?;
        let task: TaskResponse = check_status(response).await?.json().await?;
        Ok(task.into())
    }

    async fn fetch_analysis(&self, video_id: &str) -> ProviderResult<serde_json::Value> {
        let path = format!("videos/{}", video_id);
        let path = path.as_str();
        let response = self
            .with_retry(|| async move {
                let response = self.get(path, self.config.fetch_timeout).send().await?;
                check_status(response).await
            })
            .await?;
        Ok(response.json().await?)
    }
}
