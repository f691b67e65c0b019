//! The [`RefStore`] trait defining the reference storage interface.

use gitdb_types::RevisionId;

use crate::error::Result;

/// Storage backend for the `HEAD` reference of a single-timeline store.
///
/// Implementations must be thread-safe (`Send + Sync`). `HEAD` is the only
/// mutable state in a store; every other object is immutable, so the
/// compare-and-swap in [`RefStore::update_head`] is the commit point of a
/// revision.
pub trait RefStore: Send + Sync {
    /// Read the current HEAD.
    ///
    /// Returns `Ok(None)` while the history is empty.
    fn head(&self) -> Result<Option<RevisionId>>;

    /// Atomically move HEAD from `expected` to `new`.
    ///
    /// Fails with [`RefError::HeadMoved`](crate::RefError::HeadMoved) and
    /// leaves HEAD untouched if it does not currently equal `expected`.
    fn update_head(&self, expected: Option<RevisionId>, new: RevisionId) -> Result<()>;
}
