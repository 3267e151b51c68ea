//! Instrumented content stores shared by the integration tests and benches.
//!
//! Every store here wraps a [`MemoryContentStore`], which appends on every
//! `persist` without deduplicating. Any duplicate record found after a test
//! is therefore a failure of the writer, never hidden by the backend.
//!
//! ```text
//! ┌─────────────┬─────────────────────────────────────────────────────────┐
//! │ Store       │ Use                                                     │
//! ├─────────────┼─────────────────────────────────────────────────────────┤
//! │ FaultyStore │ fail or panic on demand, optional per-call latency      │
//! │ GatedStore  │ park `persist` for chosen contents until a test opens it│
//! └─────────────┴─────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use dedupe_types::{Content, ContentStore, Item, StoreError};
use dedupe_writer::MemoryContentStore;
use tokio::sync::Semaphore;

// ── FaultyStore ───────────────────────────────────────────────────────────────

/// Memory store with switchable failures.
///
/// - `set_fail_persist(true)` makes every `persist` return
///   [`StoreError::Unavailable`] until switched off.
/// - `panic_on_persist(c)` makes `persist(c)` panic, once.
/// - `with_latency(d)` sleeps `d` before each lookup and persist, which
///   widens the window between the duplicate check and the write.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryContentStore,
    latency: Duration,
    fail_persist: AtomicBool,
    panic_on: Mutex<HashSet<Content>>,
    lookups: AtomicUsize,
    persists: AtomicUsize,
}

impl FaultyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn panic_on_persist(&self, content: impl Into<Content>) {
        self.panic_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(content.into());
    }

    /// Number of `find_by_content` calls served so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of `persist` calls that reached the backing store.
    #[must_use]
    pub fn persists(&self) -> usize {
        self.persists.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn inner(&self) -> &MemoryContentStore {
        &self.inner
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ContentStore for FaultyStore {
    async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.inner.find_by_content(content).await
    }

    async fn persist(&self, content: &Content) -> Result<Item, StoreError> {
        self.pause().await;
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "injected persist failure".to_string(),
            });
        }
        let should_panic = self
            .panic_on
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(content);
        assert!(!should_panic, "injected panic while persisting {content}");

        self.persists.fetch_add(1, Ordering::SeqCst);
        self.inner.persist(content).await
    }

    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        self.inner.list_all().await
    }
}

// ── GatedStore ────────────────────────────────────────────────────────────────

/// A door in front of `persist` for one content value.
///
/// `persist` signals [`entered`](Gate::entered) and then parks until the
/// test calls [`open`](Gate::open). Opening is permanent.
pub struct Gate {
    entered: Semaphore,
    release: Semaphore,
}

impl Gate {
    fn new() -> Self {
        Self {
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }

    /// Wait until a `persist` call has reached this gate.
    pub async fn entered(&self) {
        if let Ok(permit) = self.entered.acquire().await {
            permit.forget();
        }
    }

    /// Let every parked and future `persist` through.
    pub fn open(&self) {
        self.release.close();
    }

    async fn pass(&self) {
        self.entered.add_permits(1);
        // Closing the semaphore is the open signal, so the error is expected.
        let _ = self.release.acquire().await;
    }
}

/// Memory store whose `persist` parks on a [`Gate`] for selected contents.
///
/// Contents without a gate pass straight through.
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryContentStore,
    gates: Mutex<HashMap<Content, Arc<Gate>>>,
}

impl GatedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or fetch) the gate for `content`.
    pub fn gate(&self, content: impl Into<Content>) -> Arc<Gate> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            gates
                .entry(content.into())
                .or_insert_with(|| Arc::new(Gate::new())),
        )
    }

    #[must_use]
    pub fn inner(&self) -> &MemoryContentStore {
        &self.inner
    }

    fn gate_for(&self, content: &Content) -> Option<Arc<Gate>> {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(content)
            .cloned()
    }
}

#[async_trait]
impl ContentStore for GatedStore {
    async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError> {
        self.inner.find_by_content(content).await
    }

    async fn persist(&self, content: &Content) -> Result<Item, StoreError> {
        if let Some(gate) = self.gate_for(content) {
            gate.pass().await;
        }
        self.inner.persist(content).await
    }

    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        self.inner.list_all().await
    }
}
