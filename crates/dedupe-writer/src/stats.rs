use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters for a [`DedupWriter`](crate::DedupWriter).
///
/// `saved + duplicates + failed` equals the number of `save` calls that
/// have returned. `in_flight` is the number of distinct contents that
/// currently have a caller inside or queued on their critical section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub saved: u64,
    pub duplicates: u64,
    pub failed: u64,
    pub in_flight: usize,
}

impl WriterStats {
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.saved + self.duplicates + self.failed
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    saved: AtomicU64,
    duplicates: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    pub(crate) fn record_saved(&self) {
        self.saved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, in_flight: usize) -> WriterStats {
        WriterStats {
            saved: self.saved.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_outcomes() {
        let counters = Counters::default();
        counters.record_saved();
        counters.record_duplicate();
        counters.record_duplicate();
        counters.record_failed();

        let stats = counters.snapshot(3);
        assert_eq!(
            stats,
            WriterStats {
                saved: 1,
                duplicates: 2,
                failed: 1,
                in_flight: 3,
            }
        );
        assert_eq!(stats.completed(), 4);
    }
}
