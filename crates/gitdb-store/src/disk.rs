//! Loose-object filesystem backend.
//!
//! Each object lives in its own file under `objects/<2 hex>/<62 hex>`,
//! encoded as `"<kind> <len>\0<data>"`. Files are written to a temporary
//! sibling and renamed into place, so a reader never sees a partially
//! written object.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gitdb_types::ObjectId;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Flush strategy for filesystem writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` the file and its directory before the rename is reported.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

/// Object store backed by loose files in a directory.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    sync: SyncMode,
}

impl FsObjectStore {
    /// Open (or create) an object directory.
    pub fn open(root: impl Into<PathBuf>, sync: SyncMode) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root, sync })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (dir, file) = id.fanout();
        self.root.join(dir).join(file)
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let path = self.object_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let object = StoredObject::decode(*id, &bytes)?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }

        let path = self.object_path(&id);
        if path.exists() {
            match self.read(&id) {
                Ok(Some(_)) => return Ok(id),
                Ok(None) => {}
                Err(e) => warn!(%id, error = %e, "replacing damaged object"),
            }
        }
        let dir = path.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        write_atomic(&path, &object.encode(), self.sync)?;
        debug!(%id, kind = %object.kind, size = object.size(), "object written");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}

/// Write `contents` to `path` through a temp file in the same directory and
/// an atomic rename.
pub fn write_atomic(path: &Path, contents: &[u8], sync: SyncMode) -> StoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(contents)
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    if sync == SyncMode::EveryWrite {
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| StoreError::io(path, e.error))?;
    if sync == SyncMode::EveryWrite {
        sync_dir(dir)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> StoreResult<()> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| StoreError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> StoreResult<()> {
    Ok(())
}
