//! Error types for reference operations.

use std::path::PathBuf;

use gitdb_types::RevisionId;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// HEAD no longer points where the caller expected.
    #[error("HEAD moved: expected {}, found {}", display_head(.expected), display_head(.actual))]
    HeadMoved {
        expected: Option<RevisionId>,
        actual: Option<RevisionId>,
    },

    /// Another writer holds the ref lock file.
    #[error("ref is locked: {0}")]
    Locked(PathBuf),

    /// The ref file exists but does not hold a revision id.
    #[error("corrupt ref {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// An in-process lock was poisoned by a panicking writer.
    #[error("ref store lock poisoned")]
    Poisoned,

    /// I/O error during file-based ref operations.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_head(head: &Option<RevisionId>) -> String {
    head.map(|id| id.short_hex())
        .unwrap_or_else(|| "<unborn>".to_string())
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
