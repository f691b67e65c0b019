//! Content-addressed object storage for gitdb.
//!
//! Every revision is a graph of immutable objects identified by their
//! BLAKE3 hash (domain-separated by object kind), analogous to git's
//! `.git/objects/` directory.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- directory listing mapping names to blobs and subtrees
//! - [`Commit`] -- root tree plus parent link, signature, and message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- loose object files with atomic rename writes
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: objects are durable before anything references them.
//! 3. Concurrent reads are always safe.
//! 4. The store never interprets object contents.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod disk;
pub mod error;
pub mod memory;
pub mod object;
pub mod path;
pub mod traits;

pub use disk::{write_atomic, FsObjectStore, SyncMode};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use path::RepoPath;
pub use traits::ObjectStore;
