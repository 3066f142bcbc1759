//! Status/Task Bridge.
//!
//! Translates the provider's task lifecycle into our status vocabulary and
//! materialises the analysis document once the task is ready.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use reelcut_models::{VideoId, VideoRecord, VideoStatus};
use reelcut_provider::{AnalysisProvider, ProviderTaskStatus, TaskSnapshot};

use crate::metrics;
use crate::store::VideoStore;

/// Status triple derived from one provider snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: VideoStatus,
    pub progress: u8,
    pub message: String,
    pub error_detail: Option<String>,
}

/// Map a provider task snapshot onto our status vocabulary.
pub fn map_task_status(snapshot: &TaskSnapshot) -> StatusUpdate {
    let (status, progress, message) = match &snapshot.status {
        ProviderTaskStatus::Pending => (VideoStatus::Processing, 25, "Video queued for processing".to_string()),
        ProviderTaskStatus::Indexing | ProviderTaskStatus::Validating => {
            (VideoStatus::Indexing, 50, "Analyzing video content".to_string())
        }
        ProviderTaskStatus::Ready => (VideoStatus::Completed, 100, "Analysis complete".to_string()),
        ProviderTaskStatus::Failed => (VideoStatus::Error, 0, "Analysis failed".to_string()),
        ProviderTaskStatus::Other(raw) => (
            VideoStatus::Processing,
            35,
            format!("Processing (provider status: {})", raw),
        ),
    };

    let error_detail = (status == VideoStatus::Error).then(|| {
        snapshot
            .error_message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string())
    });

    StatusUpdate {
        status,
        progress,
        message,
        error_detail,
    }
}

/// Bridges stored records with the provider's task state.
pub struct StatusBridge {
    store: Arc<dyn VideoStore>,
    provider: Arc<dyn AnalysisProvider>,
    /// Per-video fetch locks so each document is fetched once
    fetch_locks: Mutex<HashMap<VideoId, Arc<Mutex<()>>>>,
}

impl StatusBridge {
    pub fn new(store: Arc<dyn VideoStore>, provider: Arc<dyn AnalysisProvider>) -> Self {
        Self {
            store,
            provider,
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Refresh the record for `id` from the provider and return it.
    ///
    /// Returns `None` for unknown ids. A failed poll never fails the call:
    /// the cached record comes back with a "Status check failed" message.
    pub async fn refresh(&self, id: &VideoId) -> Option<VideoRecord> {
        let record = self.store.get(id).await?;

        if is_settled(&record) {
            debug!(video_id = %id, "Record settled, skipping provider poll");
            return Some(record);
        }

        let snapshot = match self.provider.poll(&record.task_handle).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(video_id = %id, "Status check failed: {}", e);
                metrics::record_provider_poll_failure(e.is_network());
                let mut cached = record;
                cached.message = format!("Status check failed: {}", e);
                return Some(cached);
            }
        };

        let update = map_task_status(&snapshot);
        let linked = snapshot.video_id.clone();
        let status = update.status;
        let record = self
            .store
            .update(
                id,
                Box::new(move |r: &mut VideoRecord| {
                    r.set_status(update.status, update.progress, update.message, update.error_detail);
                    if let Some(linked) = linked {
                        r.provider_video_id = Some(linked);
                    }
                }),
            )
            .await?;

        if status == VideoStatus::Completed && record.analysis.is_none() {
            return self.ensure_analysis(id).await.or(Some(record));
        }
        Some(record)
    }

    async fn fetch_lock_for(&self, id: &VideoId) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().await;
        locks.entry(id.clone()).or_default().clone()
    }

    /// Fetch and cache the analysis document if it is still missing.
    ///
    /// A failed fetch keeps whatever is cached and is retried on a later poll.
    async fn ensure_analysis(&self, id: &VideoId) -> Option<VideoRecord> {
        let lock = self.fetch_lock_for(id).await;
        let _guard = lock.lock().await;

        // Another request may have fetched it while we waited
        let record = self.store.get(id).await?;
        if record.analysis.is_some() {
            return Some(record);
        }

        let Some(provider_video_id) = record.provider_video_id.clone() else {
            warn!(video_id = %id, "Task ready but no linked provider video id");
            return Some(record);
        };

        match self.provider.fetch_analysis(&provider_video_id).await {
            Ok(analysis) => {
                info!(video_id = %id, "Analysis document cached");
                self.store
                    .update(
                        id,
                        Box::new(move |r: &mut VideoRecord| {
                            r.attach_analysis(analysis);
                        }),
                    )
                    .await
            }
            Err(e) => {
                warn!(video_id = %id, "Analysis fetch failed, keeping cached state: {}", e);
                metrics::record_analysis_fetch_failure();
                Some(record)
            }
        }
    }
}

/// Terminal records need no further polling.
fn is_settled(record: &VideoRecord) -> bool {
    match record.status {
        VideoStatus::Completed => record.analysis.is_some(),
        VideoStatus::Error => true,
        VideoStatus::Processing | VideoStatus::Indexing => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryVideoStore;
    use async_trait::async_trait;
    use reelcut_models::{TaskHandle, VideoSource};
    use reelcut_provider::{MockAnalysisProvider, ProviderError, ProviderResult, SubmitSource};
    use serde_json::json;
    use std::time::{Duration, Instant};

    /// Provider whose analysis fetch for `pv-slow` takes a while.
    struct SlowFetchProvider;

    #[async_trait]
    impl AnalysisProvider for SlowFetchProvider {
        fn is_configured(&self) -> bool {
            true
        }

        async fn submit(&self, _source: SubmitSource) -> ProviderResult<TaskHandle> {
            Ok(TaskHandle::new("unused"))
        }

        async fn poll(&self, task: &TaskHandle) -> ProviderResult<TaskSnapshot> {
            let linked = if task.as_str() == "task-slow" { "pv-slow" } else { "pv-fast" };
            Ok(TaskSnapshot {
                status: ProviderTaskStatus::Ready,
                video_id: Some(linked.into()),
                error_message: None,
            })
        }

        async fn fetch_analysis(&self, video_id: &str) -> ProviderResult<serde_json::Value> {
            if video_id == "pv-slow" {
                tokio::time::sleep(Duration::from_secs(3)).await;
            }
            Ok(json!({ "videoId": video_id }))
        }
    }

    fn snapshot(status: ProviderTaskStatus) -> TaskSnapshot {
        TaskSnapshot {
            status,
            video_id: Some("pv-1".into()),
            error_message: None,
        }
    }

    async fn seeded_store() -> (Arc<InMemoryVideoStore>, VideoId) {
        let store = Arc::new(InMemoryVideoStore::new());
        let id = VideoId::from("vid_0000beef");
        store
            .put(VideoRecord::submitted(
                id.clone(),
                TaskHandle::new("task-1"),
                VideoSource::Url {
                    url: "https://cdn.example.com/a.mp4".into(),
                },
            ))
            .await;
        (store, id)
    }

    #[test]
    fn test_status_mapping() {
        let pending = map_task_status(&snapshot(ProviderTaskStatus::Pending));
        assert_eq!(
            (pending.status, pending.progress, pending.message.as_str()),
            (VideoStatus::Processing, 25, "Video queued for processing")
        );

        for status in [ProviderTaskStatus::Indexing, ProviderTaskStatus::Validating] {
            let update = map_task_status(&snapshot(status));
            assert_eq!(update.status, VideoStatus::Indexing);
            assert_eq!(update.progress, 50);
        }

        let ready = map_task_status(&snapshot(ProviderTaskStatus::Ready));
        assert_eq!(ready.status, VideoStatus::Completed);
        assert_eq!(ready.progress, 100);
        assert!(ready.error_detail.is_none());

        let other = map_task_status(&snapshot(ProviderTaskStatus::Other("queued".into())));
        assert_eq!(other.progress, 35);
        assert_eq!(other.message, "Processing (provider status: queued)");
    }

    #[test]
    fn test_failed_mapping_carries_reason() {
        let mut snap = snapshot(ProviderTaskStatus::Failed);
        let update = map_task_status(&snap);
        assert_eq!(update.status, VideoStatus::Error);
        assert_eq!(update.error_detail.as_deref(), Some("Unknown error"));

        snap.error_message = Some("unsupported codec".into());
        assert_eq!(
            map_task_status(&snap).error_detail.as_deref(),
            Some("unsupported codec")
        );
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let (store, _) = seeded_store().await;
        let bridge = StatusBridge::new(store, Arc::new(MockAnalysisProvider::new()));
        assert!(bridge.refresh(&VideoId::from("vid_nothere0")).await.is_none());
    }

    #[tokio::test]
    async fn test_ready_fetches_analysis_once() {
        let (store, id) = seeded_store().await;
        let mut provider = MockAnalysisProvider::new();
        provider
            .expect_poll()
            .times(1)
            .returning(|_| Ok(snapshot(ProviderTaskStatus::Ready)));
        provider
            .expect_fetch_analysis()
            .withf(|video_id| video_id == "pv-1")
            .times(1)
            .returning(|_| Ok(json!({"transcript": []})));

        let bridge = StatusBridge::new(store, Arc::new(provider));
        let first = bridge.refresh(&id).await.unwrap();
        let second = bridge.refresh(&id).await.unwrap();

        assert_eq!(first.status, VideoStatus::Completed);
        assert_eq!(first.analysis, Some(json!({"transcript": []})));
        assert_eq!(
            (first.status, first.progress, &first.message),
            (second.status, second.progress, &second.message)
        );
    }

    #[tokio::test]
    async fn test_slow_fetch_does_not_delay_other_videos() {
        let store = Arc::new(InMemoryVideoStore::new());
        let slow = VideoId::from("vid_00000010");
        let fast = VideoId::from("vid_00000020");
        for (id, task) in [(&slow, "task-slow"), (&fast, "task-fast")] {
            store
                .put(VideoRecord::submitted(
                    id.clone(),
                    TaskHandle::new(task),
                    VideoSource::Url {
                        url: "https://cdn.example.com/a.mp4".into(),
                    },
                ))
                .await;
        }

        let bridge = Arc::new(StatusBridge::new(store, Arc::new(SlowFetchProvider)));
        let slow_bridge = bridge.clone();
        let slow_id = slow.clone();
        let slow_task = tokio::spawn(async move { slow_bridge.refresh(&slow_id).await });
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let record = bridge.refresh(&fast).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(record.analysis, Some(json!({ "videoId": "pv-fast" })));

        let record = slow_task.await.unwrap().unwrap();
        assert_eq!(record.analysis, Some(json!({ "videoId": "pv-slow" })));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_completed_status() {
        let (store, id) = seeded_store().await;
        let mut provider = MockAnalysisProvider::new();
        provider
            .expect_poll()
            .returning(|_| Ok(snapshot(ProviderTaskStatus::Ready)));
        provider
            .expect_fetch_analysis()
            .returning(|_| Err(ProviderError::InvalidResponse("truncated".into())));

        let bridge = StatusBridge::new(store.clone(), Arc::new(provider));
        let record = bridge.refresh(&id).await.unwrap();
        assert_eq!(record.status, VideoStatus::Completed);
        assert!(record.analysis.is_none());
        assert_eq!(record.provider_video_id.as_deref(), Some("pv-1"));
    }

    #[tokio::test]
    async fn test_poll_failure_returns_cached_state() {
        let (store, id) = seeded_store().await;
        let mut provider = MockAnalysisProvider::new();
        provider.expect_poll().returning(|_| {
            Err(ProviderError::RequestFailed {
                status: 502,
                body: "bad gateway".into(),
            })
        });

        let bridge = StatusBridge::new(store.clone(), Arc::new(provider));
        let record = bridge.refresh(&id).await.unwrap();
        assert_eq!(record.status, VideoStatus::Processing);
        assert_eq!(record.progress, 10);
        assert!(record.message.starts_with("Status check failed:"));

        // The stored record is untouched
        assert_eq!(
            store.get(&id).await.unwrap().message,
            "Video submitted for analysis"
        );
    }

    #[tokio::test]
    async fn test_error_records_are_not_polled() {
        let (store, id) = seeded_store().await;
        let mut provider = MockAnalysisProvider::new();
        provider.expect_poll().times(1).returning(|_| {
            Ok(TaskSnapshot {
                status: ProviderTaskStatus::Failed,
                video_id: None,
                error_message: Some("corrupt upload".into()),
            })
        });

        let bridge = StatusBridge::new(store, Arc::new(provider));
        let first = bridge.refresh(&id).await.unwrap();
        let second = bridge.refresh(&id).await.unwrap();
        assert_eq!(first.status, VideoStatus::Error);
        assert_eq!(second.error_detail.as_deref(), Some("corrupt upload"));
    }
}
