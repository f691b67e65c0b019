//! Where a store keeps its files.
//!
//! ```text
//! <root>/
//!   .gitdb/
//!     config.toml
//!     HEAD
//!     objects/ab/cdef...
//! ```

use std::path::{Path, PathBuf};

use gitdb_store::path::METADATA_DIR;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.metadata_dir().join("config.toml")
    }

    pub fn head_path(&self) -> PathBuf {
        self.metadata_dir().join("HEAD")
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.metadata_dir().join("objects")
    }

    /// A store exists once its config file has been written.
    pub fn is_initialized(&self) -> bool {
        self.config_path().is_file()
    }

    /// Worktree location of a store-relative file.
    pub fn worktree_path(&self, path: &str) -> PathBuf {
        path.split('/')
            .fold(self.root.clone(), |acc, component| acc.join(component))
    }
}
