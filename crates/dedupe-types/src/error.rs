/// Errors raised by a [`ContentStore`](crate::ContentStore) backend.
///
/// The deduplicating writer never recovers from these. It releases its
/// per-content lock and hands the error to the caller, wrapped with the
/// operation that failed.
///
/// ```text
/// ┌─────────────┬──────────────────────────────────────────────────┐
/// │ Variant     │ Cause                                            │
/// ├─────────────┼──────────────────────────────────────────────────┤
/// │ Unavailable │ backend cannot serve requests right now          │
/// │ Rejected    │ backend refused this particular record           │
/// │ Io          │ underlying I/O failure                           │
/// │ Other       │ anything else, including poisoned internal locks │
/// └─────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("content store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("content store rejected the record: {reason}")]
    Rejected { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("content store error: {0}")]
    Other(String),
}
