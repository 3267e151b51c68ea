use dedupe_types::{Content, StoreError};

/// Errors returned by [`DedupWriter`](crate::DedupWriter).
///
/// A duplicate is not an error; it is a `SaveResult` with
/// `success = false`. These variants only cover backend failures, tagged
/// with the store operation that raised them.
///
/// ```text
///   WriteError
///   ├── Lookup  ← find_by_content failed inside the critical section
///   ├── Persist ← persist failed after a clean duplicate check
///   └── List    ← list_all pass-through failed
/// ```
///
/// In every case the per-content lock has already been released by the
/// time the caller sees the error, so retrying the same content is safe.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("duplicate lookup failed for content {content}")]
    Lookup {
        content: Content,
        #[source]
        source: StoreError,
    },

    #[error("failed to persist content {content}")]
    Persist {
        content: Content,
        #[source]
        source: StoreError,
    },

    #[error("failed to list stored items")]
    List {
        #[source]
        source: StoreError,
    },
}

impl WriteError {
    /// The content whose save failed, when the error came from `save`.
    #[must_use]
    pub fn content(&self) -> Option<&Content> {
        match self {
            Self::Lookup { content, .. } | Self::Persist { content, .. } => Some(content),
            Self::List { .. } => None,
        }
    }

    /// The backend error that caused this failure.
    #[must_use]
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::Lookup { source, .. } | Self::Persist { source, .. } | Self::List { source } => {
                source
            }
        }
    }
}
