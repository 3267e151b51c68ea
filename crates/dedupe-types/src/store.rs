use std::sync::Arc;

use async_trait::async_trait;

use crate::content::Content;
use crate::error::StoreError;
use crate::item::Item;

/// Persistence backend consumed by the deduplicating writer.
///
/// The store is the single source of truth for which contents exist. The
/// writer is injected with one and calls it only from inside the
/// per-content critical section:
///
/// ```text
/// save(content):
///   lock(content) ──▶ find_by_content ──┬── non-empty ──▶ duplicate
///                                       └── empty ──────▶ persist ──▶ saved
///   unlock(content)
/// ```
///
/// Implementations are not expected to deduplicate on their own, and the
/// writer does not rely on it. `persist` may be called concurrently for
/// *different* contents, so implementations must tolerate parallel writes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: one store instance is shared by
/// every caller of the writer.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Return every record whose content equals `content` exactly.
    ///
    /// An empty vector means "no duplicate".
    async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError>;

    /// Store a new record and return it with a freshly assigned id.
    async fn persist(&self, content: &Content) -> Result<Item, StoreError>;

    /// Return every record, in whatever order the store keeps them.
    async fn list_all(&self) -> Result<Vec<Item>, StoreError>;
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError> {
        (**self).find_by_content(content).await
    }

    async fn persist(&self, content: &Content) -> Result<Item, StoreError> {
        (**self).persist(content).await
    }

    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_all().await
    }
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Box<S> {
    async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError> {
        (**self).find_by_content(content).await
    }

    async fn persist(&self, content: &Content) -> Result<Item, StoreError> {
        (**self).persist(content).await
    }

    async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
        (**self).list_all().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::item::ItemId;

    #[derive(Default)]
    struct VecStore {
        items: Mutex<Vec<Item>>,
    }

    #[async_trait]
    impl ContentStore for VecStore {
        async fn find_by_content(&self, content: &Content) -> Result<Vec<Item>, StoreError> {
            let items = self.items.lock().unwrap();
            Ok(items.iter().filter(|i| &i.content == content).cloned().collect())
        }

        async fn persist(&self, content: &Content) -> Result<Item, StoreError> {
            let mut items = self.items.lock().unwrap();
            let item = Item::new(ItemId(items.len() as u64 + 1), content);
            items.push(item.clone());
            Ok(item)
        }

        async fn list_all(&self) -> Result<Vec<Item>, StoreError> {
            Ok(self.items.lock().unwrap().clone())
        }
    }

    #[tokio::test]
    async fn arc_forwards_to_inner_store() {
        let store: Arc<dyn ContentStore> = Arc::new(VecStore::default());
        let shared = Arc::new(Arc::clone(&store));

        let item = shared.persist(&Content::from("apple")).await.unwrap();
        assert_eq!(item.id, ItemId(1));

        let found = store.find_by_content(&Content::from("apple")).await.unwrap();
        assert_eq!(found, vec![item]);
        assert_eq!(shared.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn box_forwards_to_inner_store() {
        let store: Box<dyn ContentStore> = Box::new(VecStore::default());

        let item = store.persist(&Content::from("pear")).await.unwrap();
        assert_eq!(item.id, ItemId(1));

        let found = store.find_by_content(&Content::from("pear")).await.unwrap();
        assert_eq!(found, vec![item]);
        assert!(store.find_by_content(&Content::from("apple")).await.unwrap().is_empty());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }
}
