use std::collections::BTreeMap;

use gitdb_store::RepoPath;
use gitdb_types::RevisionId;

use crate::error::{HistoryError, HistoryResult};
use crate::snapshot::{find_conflict, FileMap};

/// Staged-but-uncommitted writes layered on top of one base revision.
///
/// Obtained from [`RevisionStore::begin`](crate::RevisionStore::begin) and
/// consumed by [`RevisionStore::commit`](crate::RevisionStore::commit).
/// Dropping it discards the staged content; nothing is persisted until
/// commit.
#[derive(Debug)]
pub struct PendingChange {
    base: Option<RevisionId>,
    base_files: FileMap,
    staged: BTreeMap<RepoPath, Vec<u8>>,
}

impl PendingChange {
    pub(crate) fn new(base: Option<RevisionId>, base_files: FileMap) -> Self {
        Self {
            base,
            base_files,
            staged: BTreeMap::new(),
        }
    }

    /// The revision this change will be chained to.
    pub fn base(&self) -> Option<RevisionId> {
        self.base
    }

    /// Record `data` as the new content of `path`. Staging the same path
    /// twice keeps the later content.
    pub fn stage_file(&mut self, path: &str, data: impl Into<Vec<u8>>) -> HistoryResult<()> {
        let path = RepoPath::new(path)?;

        let staged_names: Vec<String> = self
            .staged
            .keys()
            .map(|p| p.as_str().to_string())
            .collect();
        let conflict = find_conflict(self.base_files.keys(), path.as_str())
            .or_else(|| find_conflict(&staged_names, path.as_str()));
        if let Some(existing) = conflict {
            return Err(HistoryError::PathConflict {
                path: path.to_string(),
                existing,
            });
        }

        self.staged.insert(path, data.into());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn staged_paths(&self) -> impl Iterator<Item = &RepoPath> {
        self.staged.keys()
    }

    pub(crate) fn into_parts(self) -> (Option<RevisionId>, FileMap, BTreeMap<RepoPath, Vec<u8>>) {
        (self.base, self.base_files, self.staged)
    }
}
