use std::time::Duration;

use async_trait::async_trait;
use dedupe_types::{Content, ContentStore, Item, StoreError};
use dedupe_writer::MemoryContentStore;

/// Memory store that sleeps before every operation.
///
/// Stands in for a remote backend so that `--latency-ms` makes the
/// difference between serialized and parallel saves visible in wall time.
pub struct SlowStore {
    inner: MemoryContentStore,
    latency: Duration,
}

impl SlowStore {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            inner: MemoryContentStore::new(),
            latency: Duration::from_millis(latency_ms),
        }
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ContentStore for SlowStore {
    async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError> {
        self.pause().await;
        self.inner.find_by_content(content).await
    }

    async fn persist(&self, content: &Content) -> Result<Item, StoreError> {
        self.pause().await;
        self.inner.persist(content).await
    }

    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        self.inner.list_all().await
    }
}
