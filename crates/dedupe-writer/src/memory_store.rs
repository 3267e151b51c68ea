use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use dedupe_types::{Content, ContentStore, DIGEST_SIZE, Item, ItemId, StoreError};

/// In-memory content store backed by a `Vec` of records and a digest index.
///
/// Suitable for the CLI and for tests. Not persisted across runs. Uses
/// [`RwLock`] for interior mutability so the [`ContentStore`] methods
/// (which take `&self`) can mutate the records safely across tasks. The
/// lock is never held across an `.await`.
///
/// # Deduplication
///
/// `persist` always appends. Keeping duplicates out is the job of the
/// [`DedupWriter`](crate::DedupWriter) in front of the store, and an
/// appending store makes a broken writer visible as extra records.
///
/// # Lookup
///
/// ```text
/// find_by_content(c):
///   index[blake3(c)] ──▶ candidate positions ──▶ keep records whose bytes == c
/// ```
///
/// # Example
///
/// ```rust
/// use dedupe_types::{Content, ContentStore};
/// use dedupe_writer::MemoryContentStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryContentStore::new();
/// let item = store.persist(&Content::from("apple")).await.unwrap();
/// assert_eq!(item.id.get(), 1);
/// assert_eq!(store.find_by_content(&Content::from("apple")).await.unwrap(), vec![item]);
/// assert_eq!(store.len(), 1);
/// # }
/// ```
pub struct MemoryContentStore {
    records: RwLock<Records>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct Records {
    items: Vec<Item>,
    by_digest: HashMap<[u8; DIGEST_SIZE], Vec<usize>>,
}

impl MemoryContentStore {
    /// Create an empty in-memory content store. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Records::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Return the number of stored records, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    /// Return `true` if the store contains no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the total content bytes stored across all records.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .iter()
            .map(|item| item.content.len())
            .sum()
    }

    /// Number of records whose content equals `content`.
    #[must_use]
    pub fn count_of(&self, content: &Content) -> usize {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.matching(content).count()
    }
}

impl Records {
    fn matching<'a>(&'a self, content: &'a Content) -> impl Iterator<Item = &'a Item> + 'a {
        self.by_digest
            .get(&content.digest())
            .into_iter()
            .flatten()
            .map(|&pos| &self.items[pos])
            .filter(move |item| item.content == *content)
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Other("memory store lock poisoned".to_string())
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.matching(content).cloned().collect())
    }

    async fn persist(&self, content: &Content) -> Result<Item, StoreError> {
        let digest = content.digest();
        let mut records = self.records.write().map_err(poisoned)?;
        let item = Item::new(
            ItemId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            content.clone(),
        );
        let pos = records.items.len();
        records.items.push(item.clone());
        records.by_digest.entry(digest).or_default().push(pos);
        Ok(item)
    }

    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.items.clone())
    }
}
