use std::path::PathBuf;

use gitdb_history::HistoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no store is open")]
    NotOpen,

    #[error("a store is already open at {current}; cannot open {requested}")]
    AlreadyOpen { current: PathBuf, requested: PathBuf },

    #[error("the store has no revisions yet")]
    NoRevisions,

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("invalid engine config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine lock poisoned")]
    Poisoned,

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl EngineError {
    /// Whether the error means "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NoRevisions => true,
            Self::History(e) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
