//! Versioned key-value storage backed by a git-like revision history.
//!
//! Every [`Engine::save`] stores one file and appends one immutable revision
//! chained to the previous head; [`Engine::read`] and [`Engine::read_at`]
//! retrieve file content from the head or any earlier revision.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! let engine = Arc::new(gitdb::Engine::new());
//! engine.open("/var/lib/app/state")?;
//! let revision = engine.save("settings.json", br#"{"theme":"dark"}"#)?;
//! assert_eq!(engine.version(), Some(revision));
//! # Ok::<(), gitdb::EngineError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;

pub use config::{EngineConfig, DEFAULT_MESSAGE};
pub use engine::{Engine, VERSION_ERROR};
pub use error::{EngineError, EngineResult};

pub use gitdb_history::{Revision, ValidationReport, Violation, ViolationKind};
pub use gitdb_types::{ObjectId, RevisionId, Signature};
