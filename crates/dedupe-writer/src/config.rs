/// Configuration for the deduplicating writer.
///
/// Neither setting affects correctness. They tune memory and log output
/// only.
///
/// ```text
/// ┌─────────────────────┬───────────────────────────────────────────────┐
/// │ Field               │ Purpose                                       │
/// ├─────────────────────┼───────────────────────────────────────────────┤
/// │ lock_table_capacity │ Initial capacity of the per-content lock map  │
/// │ log_preview_len     │ Max content bytes echoed into log events      │
/// └─────────────────────┴───────────────────────────────────────────────┘
/// ```
///
/// The lock table only holds entries for contents that are being saved
/// right now, so `lock_table_capacity` should approximate the expected
/// number of concurrent callers, not the number of stored items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    /// Initial capacity of the lock table.
    pub lock_table_capacity: usize,

    /// Content longer than this many bytes is truncated in log events.
    /// Result messages always carry the full content.
    pub log_preview_len: usize,
}

impl Default for WriterConfig {
    /// 64 lock-table slots, 32-byte log previews.
    fn default() -> Self {
        Self {
            lock_table_capacity: 64,
            log_preview_len: 32,
        }
    }
}
