use chrono::{DateTime, Utc};
use gitdb_store::Commit;
use gitdb_types::{ObjectId, RevisionId, Signature};

/// Metadata of one committed revision.
///
/// The file content is reached through the revision store
/// ([`RevisionStore::files`](crate::RevisionStore::files),
/// [`RevisionStore::resolve`](crate::RevisionStore::resolve)).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Revision {
    pub id: RevisionId,
    pub parent: Option<RevisionId>,
    pub author: Signature,
    pub message: String,
    /// Root tree of the snapshot.
    pub tree: ObjectId,
}

impl Revision {
    pub(crate) fn from_commit(id: RevisionId, commit: Commit) -> Self {
        Self {
            id,
            parent: commit.parent,
            author: commit.author,
            message: commit.message,
            tree: commit.tree,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.author.when
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
