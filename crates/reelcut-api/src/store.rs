//! Video record store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reelcut_models::{VideoId, VideoRecord};

/// Mutation applied to a stored record under the store's write lock.
pub type RecordUpdate = Box<dyn FnOnce(&mut VideoRecord) + Send>;

/// Keyed storage for video records.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get(&self, id: &VideoId) -> Option<VideoRecord>;

    async fn put(&self, record: VideoRecord);

    /// Apply `update` to the record for `id` and return the new snapshot.
    ///
    /// Returns `None` when no record exists.
    async fn update(&self, id: &VideoId, update: RecordUpdate) -> Option<VideoRecord>;

    async fn list_ids(&self) -> Vec<VideoId>;
}

/// Process-lifetime store backed by a map.
#[derive(Default)]
pub struct InMemoryVideoStore {
    records: RwLock<HashMap<VideoId, VideoRecord>>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn get(&self, id: &VideoId) -> Option<VideoRecord> {
        self.records.read().await.get(id).cloned()
    }

    async fn put(&self, record: VideoRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    async fn update(&self, id: &VideoId, update: RecordUpdate) -> Option<VideoRecord> {
        let mut records = self.records.write().await;
        let current = records.get(id)?;
        let mut next = current.clone();
        update(&mut next);
        records.insert(id.clone(), next.clone());
        Some(next)
    }

    async fn list_ids(&self) -> Vec<VideoId> {
        self.records.read().await.keys().cloned().collect()
    }
}
