use std::path::PathBuf;

use gitdb_refs::RefError;
use gitdb_store::StoreError;
use gitdb_types::RevisionId;

/// Errors produced by revision store operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("store already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("no store found at {0}")]
    StoreNotFound(PathBuf),

    #[error("revision not found: {0}")]
    RevisionNotFound(RevisionId),

    #[error("{path} not found in revision {revision}")]
    FileNotFound { revision: RevisionId, path: String },

    /// A file would shadow a directory or the other way round.
    #[error("{path} conflicts with existing path {existing}")]
    PathConflict { path: String, existing: String },

    #[error("nothing staged to commit")]
    EmptyChange,

    #[error("invalid config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ref(#[from] RefError),
}

impl HistoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::StoreNotFound(_) | Self::RevisionNotFound(_) | Self::FileNotFound { .. }
        )
    }
}

/// Result alias for revision store operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
