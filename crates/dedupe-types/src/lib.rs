#![warn(clippy::pedantic)]

pub mod content;
pub mod error;
pub mod item;
pub mod result;
pub mod store;

pub use content::{Content, DIGEST_SIZE};
pub use error::StoreError;
pub use item::{Item, ItemId};
pub use result::SaveResult;
pub use store::ContentStore;
