//! Revision history for gitdb.
//!
//! A [`RevisionStore`] turns the object and ref layers into an append-only
//! chain of snapshots. Writes are staged on a [`PendingChange`] and committed
//! in one step: blobs, then trees, then the commit object, and finally a
//! compare-and-swap of `HEAD`. A commit that fails at any step leaves `HEAD`
//! untouched.
//!
//! [`Repository`] is the standard implementation over any
//! [`ObjectStore`](gitdb_store::ObjectStore) and
//! [`RefStore`](gitdb_refs::RefStore) pair; [`DiskRepository`] is its durable
//! form.

pub mod config;
pub mod error;
pub mod layout;
pub mod pending;
pub mod repository;
pub mod revision;
pub mod snapshot;
pub mod traits;
pub mod validation;

pub use config::{StoreConfig, FORMAT_VERSION};
pub use error::{HistoryError, HistoryResult};
pub use layout::StoreLayout;
pub use pending::PendingChange;
pub use repository::{DiskRepository, MemoryRepository, Repository};
pub use revision::Revision;
pub use snapshot::FileMap;
pub use traits::RevisionStore;
pub use validation::{HistoryValidator, ValidationReport, Violation, ViolationKind};
