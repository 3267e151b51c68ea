use dedupe_lock::KeyedLock;
use dedupe_types::{Content, ContentStore, Item, SaveResult};
use tracing::{Instrument, debug, debug_span, warn};

use crate::config::WriterConfig;
use crate::error::WriteError;
use crate::stats::{Counters, WriterStats};

/// Persists each distinct content value at most once, under any number
/// of concurrent callers.
///
/// Every `save` runs its duplicate check and write inside a critical
/// section scoped to that exact content. Saves of identical content are
/// serialized; saves of different content run fully in parallel.
///
/// ```text
/// caller ──▶ save(c)
///              │
///              ├─ lock_table.lock(c)            (waits only on other saves of c)
///              ├─ store.find_by_content(c)
///              │     ├─ non-empty ──▶ SaveResult::duplicate
///              │     └─ empty ──────▶ store.persist(c) ──▶ SaveResult::saved
///              └─ guard dropped                 (entry removed if nobody else queued)
/// ```
///
/// The store is injected. Anything implementing [`ContentStore`] works,
/// including `Arc<S>` and `Arc<dyn ContentStore>`.
///
/// # Example
///
/// ```rust
/// use dedupe_writer::{DedupWriter, MemoryContentStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let writer = DedupWriter::new(MemoryContentStore::new());
///
/// let first = writer.save("apple").await.unwrap();
/// assert!(first.success);
///
/// let second = writer.save("apple").await.unwrap();
/// assert!(!second.success);
/// assert_eq!(second.message, "Duplicate item received with content apple.");
/// # }
/// ```
pub struct DedupWriter<S> {
    store: S,
    locks: KeyedLock<Content>,
    counters: Counters,
    config: WriterConfig,
}

impl<S> DedupWriter<S>
where
    S: ContentStore,
{
    /// Create a writer in front of `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, WriterConfig::default())
    }

    pub fn with_config(store: S, config: WriterConfig) -> Self {
        Self {
            store,
            locks: KeyedLock::with_capacity(config.lock_table_capacity),
            counters: Counters::default(),
            config,
        }
    }

    /// Save `content` unless the store already holds an equal value.
    ///
    /// Returns a success-flagged [`SaveResult`] when this call wrote the
    /// record, and a failure-flagged one when the content was already
    /// stored at check time. Among concurrent calls with equal content,
    /// exactly one observes an empty store and writes.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Lookup`] or [`WriteError::Persist`] when the
    /// store fails. The content's lock is released before the error is
    /// returned, so a later retry is not blocked.
    pub async fn save(&self, content: impl Into<Content>) -> Result<SaveResult, WriteError> {
        let content = content.into();
        let span = debug_span!(
            "save",
            digest = %content.short_digest(),
            len = content.len()
        );
        self.save_locked(content).instrument(span).await
    }

    async fn save_locked(&self, content: Content) -> Result<SaveResult, WriteError> {
        let _guard = self.locks.lock(content.clone()).await;

        let outcome = self.check_and_persist(&content).await;
        match &outcome {
            Ok(result) if result.success => self.counters.record_saved(),
            Ok(_) => self.counters.record_duplicate(),
            Err(err) => {
                self.counters.record_failed();
                warn!(
                    preview = %content.preview(self.config.log_preview_len),
                    error = %err.store_error(),
                    "{err}"
                );
            }
        }
        outcome
    }

    async fn check_and_persist(&self, content: &Content) -> Result<SaveResult, WriteError> {
        let existing = self
            .store
            .find_by_content(content)
            .await
            .map_err(|source| WriteError::Lookup {
                content: content.clone(),
                source,
            })?;

        if !existing.is_empty() {
            debug!(
                preview = %content.preview(self.config.log_preview_len),
                existing = existing.len(),
                "duplicate content received"
            );
            return Ok(SaveResult::duplicate(content));
        }

        let item = self
            .store
            .persist(content)
            .await
            .map_err(|source| WriteError::Persist {
                content: content.clone(),
                source,
            })?;

        debug!(
            preview = %content.preview(self.config.log_preview_len),
            id = %item.id,
            "content saved"
        );
        Ok(SaveResult::saved(&item))
    }

    /// Every record in the store, in store order.
    ///
    /// A plain pass-through: no lock is taken.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::List`] when the store fails.
    pub async fn list_all(&self) -> Result<Vec<Item>, WriteError> {
        self.store
            .list_all()
            .await
            .map_err(|source| WriteError::List { source })
    }
}

impl<S> DedupWriter<S> {
    /// Counters for completed saves and the current lock-table size.
    #[must_use]
    pub fn stats(&self) -> WriterStats {
        self.counters.snapshot(self.locks.len())
    }

    /// The injected store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The per-content lock table. For inspection only.
    #[must_use]
    pub fn lock_table(&self) -> &KeyedLock<Content> {
        &self.locks
    }

    #[must_use]
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}
