//! Validated file paths inside a store.
//!
//! A [`RepoPath`] is a `/`-separated path relative to the store root:
//! - Must be non-empty
//! - Must not start with `/` or contain `\` or NUL
//! - Components between slashes must be non-empty and not `.` or `..`
//! - Must not point into the `.gitdb` metadata directory

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Name of the metadata directory at the store root.
pub const METADATA_DIR: &str = ".gitdb";

/// A validated store-relative file path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoPath(String);

impl RepoPath {
    pub fn new(path: &str) -> StoreResult<Self> {
        let invalid = |reason: &str| StoreError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(invalid("path must not be empty"));
        }
        if path.starts_with('/') {
            return Err(invalid("path must be relative to the store root"));
        }
        if path.contains('\\') || path.contains('\0') {
            return Err(invalid("contains a forbidden character"));
        }
        for component in path.split('/') {
            match component {
                "" => return Err(invalid("path components must not be empty")),
                "." | ".." => return Err(invalid("path must not contain '.' or '..'")),
                _ => {}
            }
        }
        if path.split('/').next() == Some(METADATA_DIR) {
            return Err(invalid("path points into the store metadata directory"));
        }

        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Final component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
