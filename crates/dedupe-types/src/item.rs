use std::fmt;

use crate::content::Content;

/// Store-assigned identifier of a persisted record.
///
/// Only the store mints ids. The writer echoes them back to callers in
/// success messages and never interprets them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl ItemId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A record owned by a [`ContentStore`](crate::ContentStore).
///
/// The writer treats records as opaque apart from these two fields:
/// `content` for matching and `id` for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Item {
    pub id: ItemId,
    pub content: Content,
}

impl Item {
    #[must_use]
    pub fn new(id: impl Into<ItemId>, content: impl Into<Content>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}
