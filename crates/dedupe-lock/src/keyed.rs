use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

type Token = Arc<Mutex<()>>;

/// One lock-table entry: the exclusive-access token for a key and the
/// number of callers that currently own or are queued on it.
struct Slot {
    token: Token,
    holders: usize,
}

/// Named critical sections keyed by value equality.
///
/// `KeyedLock` hands out at most one [`KeyGuard`] per distinct key at a
/// time. Callers that ask for the same key queue on a shared token;
/// callers with different keys never wait on each other.
///
/// ```text
///                 ┌──────────── DashMap<K, Slot> ─────────────┐
///  lock("a") ───▶ │ "a" → { token: Arc<Mutex<()>>, holders: 2 } │ ◀─── lock("a")
///  lock("b") ───▶ │ "b" → { token: Arc<Mutex<()>>, holders: 1 } │
///                 └───────────────────────────────────────────┘
/// ```
///
/// # Entry lifecycle
///
/// ```text
///   absent ──reserve──▶ held (holders ≥ 1) ──last release──▶ absent
/// ```
///
/// - **reserve**: under the map's shard lock, either join the existing
///   slot (`holders += 1`) or insert a fresh one with `holders = 1`. This
///   is a single entry-API operation, so two first-time callers can never
///   both insert.
/// - **release**: under the shard lock, decrement `holders` and remove the
///   slot when it reaches zero. The release runs while the token is still
///   held, and waiters are counted in `holders`, so a slot is only removed
///   when nobody is inside *or queued on* its critical section. A new
///   caller therefore either joins the live token or creates a new one
///   strictly after the previous section has finished its work.
///
/// Waiting callers are counted from the moment they reserve. A `lock`
/// future dropped while still waiting gives its reservation back, so
/// cancellation leaves no residual entry.
///
/// Shard locks are only held for O(1) map operations and never across an
/// `.await`.
///
/// # Example
///
/// ```rust
/// use dedupe_lock::KeyedLock;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let locks = KeyedLock::new();
/// {
///     let _guard = locks.lock("apple".to_string()).await;
///     assert!(locks.try_lock("apple".to_string()).is_none());
///     assert!(locks.try_lock("pear".to_string()).is_some());
/// }
/// assert!(locks.is_empty());
/// # }
/// ```
pub struct KeyedLock<K>
where
    K: Eq + Hash,
{
    slots: DashMap<K, Slot>,
}

impl<K> KeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Create a lock table pre-sized for `capacity` concurrently held keys.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: DashMap::with_capacity(capacity),
        }
    }

    /// Enter the critical section for `key`, waiting while another caller
    /// holds it.
    ///
    /// The returned guard releases the section when dropped, on every exit
    /// path including unwinding.
    pub async fn lock(&self, key: K) -> KeyGuard<'_, K> {
        let reservation = self.reserve(key);
        let held = Arc::clone(&reservation.token).lock_owned().await;
        KeyGuard { reservation, held }
    }

    /// Enter the critical section for `key` only if nobody holds it.
    ///
    /// Returns `None` when the key is busy. A failed attempt leaves the
    /// table exactly as it found it.
    pub fn try_lock(&self, key: K) -> Option<KeyGuard<'_, K>> {
        let reservation = self.reserve(key);
        let held = Arc::clone(&reservation.token).try_lock_owned().ok()?;
        Some(KeyGuard { reservation, held })
    }

    fn reserve(&self, key: K) -> Reservation<'_, K> {
        let token = match self.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                slot.holders += 1;
                Arc::clone(&slot.token)
            }
            Entry::Vacant(vacant) => {
                let token: Token = Arc::new(Mutex::new(()));
                vacant.insert(Slot {
                    token: Arc::clone(&token),
                    holders: 1,
                });
                trace!("lock slot created");
                token
            }
        };
        Reservation {
            table: self,
            key,
            token,
        }
    }
}

impl<K> KeyedLock<K>
where
    K: Eq + Hash,
{
    /// Number of keys that currently have an owner or a waiter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the table holds an entry for `key`.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.contains_key(key)
    }

    /// Number of callers owning or queued on `key`; zero when absent.
    #[must_use]
    pub fn holders<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.slots.get(key).map_or(0, |slot| slot.holders)
    }
}

impl<K> Default for KeyedLock<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for KeyedLock<K>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLock")
            .field("keys", &self.slots.len())
            .finish()
    }
}

/// A caller's claim on a slot, counted in `holders`.
///
/// Created before waiting on the token, so that waiters keep the slot
/// alive. Dropping it gives the claim back and removes the slot when it
/// was the last one.
struct Reservation<'a, K>
where
    K: Eq + Hash,
{
    table: &'a KeyedLock<K>,
    key: K,
    token: Token,
}

impl<K> Drop for Reservation<'_, K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        let token = &self.token;
        let removed = self.table.slots.remove_if_mut(&self.key, |_, slot| {
            // Only the generation this reservation joined may be decremented.
            if !Arc::ptr_eq(&slot.token, token) {
                return false;
            }
            slot.holders -= 1;
            slot.holders == 0
        });
        if removed.is_some() {
            trace!("lock slot removed");
        }
    }
}

/// Scoped ownership of one key's critical section.
///
/// While a `KeyGuard` is alive no other guard for an equal key exists.
/// Dropping it releases the section.
pub struct KeyGuard<'a, K>
where
    K: Eq + Hash,
{
    // Field order matters: the reservation is given back (and the slot
    // possibly removed) before the token itself is unlocked.
    reservation: Reservation<'a, K>,
    held: OwnedMutexGuard<()>,
}

impl<K> KeyGuard<'_, K>
where
    K: Eq + Hash,
{
    /// The key this guard holds.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.reservation.key
    }
}

impl<K> fmt::Debug for KeyGuard<'_, K>
where
    K: Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGuard")
            .field("key", &self.reservation.key)
            .field("held", &self.held)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    const SHORT: Duration = Duration::from_millis(50);
    const LONG: Duration = Duration::from_secs(5);

    async fn wait_for_holders(locks: &KeyedLock<String>, key: &str, expected: usize) {
        timeout(LONG, async {
            while locks.holders(key) != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("holder count never reached the expected value");
    }

    #[tokio::test]
    async fn release_removes_entry() {
        let locks = KeyedLock::new();
        let guard = locks.lock("apple".to_string()).await;
        assert_eq!(guard.key(), "apple");
        assert_eq!(locks.len(), 1);
        assert_eq!(locks.holders("apple"), 1);
        drop(guard);
        assert!(locks.is_empty());
        assert!(!locks.contains("apple"));
    }

    #[tokio::test]
    async fn try_lock_on_busy_key_returns_none_without_leaking() {
        let locks = KeyedLock::new();
        let guard = locks.lock("apple".to_string()).await;

        assert!(locks.try_lock("apple".to_string()).is_none());
        assert_eq!(locks.holders("apple"), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn distinct_keys_do_not_contend() {
        let locks = KeyedLock::new();
        let _apple = locks.lock("apple".to_string()).await;

        let pear = timeout(LONG, locks.lock("pear".to_string()))
            .await
            .expect("a different key must not wait");
        assert_eq!(locks.len(), 2);
        drop(pear);
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn same_key_waits_for_release() {
        let locks = KeyedLock::new();
        let guard = locks.lock("apple".to_string()).await;

        let blocked = timeout(SHORT, locks.lock("apple".to_string())).await;
        assert!(blocked.is_err(), "second caller must wait for the first");

        drop(guard);
        let second = timeout(LONG, locks.lock("apple".to_string()))
            .await
            .expect("second caller proceeds after release");
        drop(second);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn cancelled_waiter_gives_back_its_reservation() {
        let locks = KeyedLock::new();
        let guard = locks.lock("apple".to_string()).await;

        let _ = timeout(SHORT, locks.lock("apple".to_string())).await;
        assert_eq!(locks.holders("apple"), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waiter_keeps_slot_alive_across_release() {
        let locks = Arc::new(KeyedLock::<String>::new());
        let first = locks.lock("apple".to_string()).await;
        let token = Arc::clone(&first.reservation.token);

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let guard = locks.lock("apple".to_string()).await;
                let live = Arc::clone(&locks.slots.get("apple").unwrap().token);
                Arc::ptr_eq(&guard.reservation.token, &live)
            })
        };

        wait_for_holders(&locks, "apple", 2).await;
        drop(first);

        // The waiter joined the first slot, so it is still the live one.
        let same_slot = waiter.await.unwrap();
        assert!(same_slot);
        assert_eq!(Arc::strong_count(&token), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn same_key_is_mutually_exclusive() {
        let locks = Arc::new(KeyedLock::<String>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                tokio::spawn(async move {
                    let _guard = locks.lock("hot".to_string()).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    fn explode() {
        panic!("store exploded");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panic_inside_section_releases_the_key() {
        let locks = Arc::new(KeyedLock::<String>::new());

        let task = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("boom".to_string()).await;
                explode();
            })
        };
        assert!(task.await.unwrap_err().is_panic());
        assert!(locks.is_empty());

        let guard = timeout(LONG, locks.lock("boom".to_string()))
            .await
            .expect("key must not stay locked after a panic");
        drop(guard);
    }

    #[tokio::test]
    async fn empty_key_is_an_ordinary_key() {
        let locks = KeyedLock::new();
        let guard = locks.lock(String::new()).await;
        assert!(locks.try_lock(String::new()).is_none());
        assert!(locks.try_lock("x".to_string()).is_some());
        drop(guard);
        assert!(locks.is_empty());
    }

    #[test]
    fn debug_reports_key_count() {
        let locks: KeyedLock<String> = KeyedLock::with_capacity(8);
        assert_eq!(format!("{locks:?}"), "KeyedLock { keys: 0 }");
    }
}
