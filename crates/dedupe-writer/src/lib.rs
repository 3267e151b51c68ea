#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod stats;
pub mod writer;

mod memory_store;

pub use config::WriterConfig;
pub use error::WriteError;
pub use memory_store::MemoryContentStore;
pub use stats::WriterStats;
pub use writer::DedupWriter;
