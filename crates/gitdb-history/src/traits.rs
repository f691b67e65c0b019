use gitdb_types::{RevisionId, Signature};

use crate::error::HistoryResult;
use crate::pending::PendingChange;
use crate::revision::Revision;
use crate::snapshot::FileMap;
use crate::validation::ValidationReport;

/// Durable, append-only history of snapshots.
///
/// Implementations must make [`commit`](RevisionStore::commit)
/// all-or-nothing: [`head`](RevisionStore::head) reports a new revision only
/// after every object the revision references is durable, and a failed
/// commit leaves the head exactly where it was.
pub trait RevisionStore: Send + Sync {
    /// The most recent revision, or `None` while the history is empty.
    fn head(&self) -> HistoryResult<Option<RevisionId>>;

    /// Start a change on top of the current head.
    fn begin(&self) -> HistoryResult<PendingChange>;

    /// Durably record `change` as a new revision chained to its base.
    fn commit(
        &self,
        change: PendingChange,
        message: &str,
        author: Signature,
    ) -> HistoryResult<RevisionId>;

    fn revision(&self, id: &RevisionId) -> HistoryResult<Revision>;

    /// Every file path in `id` with its blob id.
    fn files(&self, id: &RevisionId) -> HistoryResult<FileMap>;

    /// Content of `path` as of revision `id`.
    fn resolve(&self, id: &RevisionId, path: &str) -> HistoryResult<Vec<u8>>;

    /// Walk the history from the head, newest first.
    fn log(&self, limit: Option<usize>) -> HistoryResult<Vec<Revision>> {
        let mut revisions = Vec::new();
        let mut next = self.head()?;
        while let Some(id) = next {
            if limit.is_some_and(|max| revisions.len() >= max) {
                break;
            }
            let revision = self.revision(&id)?;
            next = revision.parent;
            revisions.push(revision);
        }
        Ok(revisions)
    }

    /// Check every reachable object and parent link.
    fn verify(&self) -> HistoryResult<ValidationReport>;
}
