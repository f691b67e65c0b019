//! Reference management for gitdb.
//!
//! A store has exactly one named reference, `HEAD`, naming the most recent
//! revision. History is a single linear chain, so there are no branches or
//! tags; moving `HEAD` is the one mutable operation in the whole store.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`memory`] -- In-memory [`InMemoryRefStore`] for tests
//! - [`file`] -- [`FileRefStore`], a lock-file protected `HEAD` on disk

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{RefError, Result};
pub use file::FileRefStore;
pub use memory::InMemoryRefStore;
pub use traits::RefStore;
