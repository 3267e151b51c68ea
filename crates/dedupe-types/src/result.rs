use std::fmt;

use crate::content::Content;
use crate::item::Item;

/// Outcome of one save attempt, handed back to the caller.
///
/// A duplicate is an expected business outcome, not a fault, so it is
/// reported here with `success = false` rather than as an error. Store
/// failures never produce a `SaveResult`; they travel on the error path.
///
/// ```text
/// ┌───────────┬─────────┬─────────────────────────────────────────────────┐
/// │ Outcome   │ success │ message                                         │
/// ├───────────┼─────────┼─────────────────────────────────────────────────┤
/// │ Saved     │ true    │ Item with content {content} saved with id {id}  │
/// │ Duplicate │ false   │ Duplicate item received with content {content}. │
/// └───────────┴─────────┴─────────────────────────────────────────────────┘
/// ```
///
/// The message embeds the literal content (lossy UTF-8) so callers can log
/// it as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveResult {
    pub success: bool,
    pub message: String,
}

impl SaveResult {
    /// Result for content that was not yet stored and has now been persisted.
    #[must_use]
    pub fn saved(item: &Item) -> Self {
        Self {
            success: true,
            message: format!(
                "Item with content {} saved with id {}",
                item.content, item.id
            ),
        }
    }

    /// Result for content that the store already held at check time.
    #[must_use]
    pub fn duplicate(content: &Content) -> Self {
        Self {
            success: false,
            message: format!("Duplicate item received with content {content}."),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl fmt::Display for SaveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_message_carries_content_and_id() {
        let item = Item::new(7, "apple");
        let result = SaveResult::saved(&item);
        assert!(result.success);
        assert_eq!(result.message, "Item with content apple saved with id 7");
    }

    #[test]
    fn duplicate_message_matches_wording() {
        let result = SaveResult::duplicate(&Content::from("apple"));
        assert!(!result.is_success());
        assert_eq!(result.message, "Duplicate item received with content apple.");
    }

    #[test]
    fn empty_content_message() {
        let result = SaveResult::duplicate(&Content::default());
        assert_eq!(result.to_string(), "Duplicate item received with content .");
    }
}
