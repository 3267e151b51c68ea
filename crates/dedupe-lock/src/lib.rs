#![warn(clippy::pedantic)]

pub mod keyed;

pub use keyed::{KeyGuard, KeyedLock};
