//! File-backed `HEAD`.
//!
//! `HEAD` holds the hex revision id followed by a newline. Updates follow
//! git's lock-file protocol: create `HEAD.lock` exclusively, re-check the
//! current value, write the new value into the lock file, then rename it over
//! `HEAD`. A crashed writer leaves at most a stale `HEAD.lock`, never a torn
//! `HEAD`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gitdb_store::SyncMode;
use gitdb_types::RevisionId;
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::RefStore;

/// `HEAD` stored as a file.
#[derive(Debug)]
pub struct FileRefStore {
    path: PathBuf,
    sync: SyncMode,
    writer: Mutex<()>,
}

impl FileRefStore {
    /// Use the `HEAD` file at `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>, sync: SyncMode) -> Self {
        Self {
            path: path.into(),
            sync,
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }
}

impl RefStore for FileRefStore {
    fn head(&self) -> Result<Option<RevisionId>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(RefError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        contents
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: gitdb_types::TypeError| RefError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    fn update_head(&self, expected: Option<RevisionId>, new: RevisionId) -> Result<()> {
        let _writer = self.writer.lock().map_err(|_| RefError::Poisoned)?;
        let mut lock = LockFile::acquire(self.lock_path())?;

        let actual = self.head()?;
        if actual != expected {
            return Err(RefError::HeadMoved { expected, actual });
        }

        lock.write(format!("{new}\n").as_bytes(), self.sync)?;
        lock.commit(&self.path, self.sync)?;
        debug!(head = %new.short_hex(), "HEAD updated");
        Ok(())
    }
}

/// Exclusive `<ref>.lock` file, removed on drop unless committed.
struct LockFile {
    path: PathBuf,
    file: Option<File>,
}

impl LockFile {
    fn acquire(path: PathBuf) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(RefError::Locked(path)),
            Err(e) => Err(RefError::Io { path, source: e }),
        }
    }

    fn write(&mut self, contents: &[u8], sync: SyncMode) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let res = file.write_all(contents).and_then(|()| {
            if sync == SyncMode::EveryWrite {
                file.sync_all()
            } else {
                Ok(())
            }
        });
        res.map_err(|e| RefError::Io {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Rename the lock file over `target`.
    fn commit(mut self, target: &Path, sync: SyncMode) -> Result<()> {
        drop(self.file.take());
        fs::rename(&self.path, target).map_err(|e| RefError::Io {
            path: target.to_path_buf(),
            source: e,
        })?;
        // Renamed away: nothing left for Drop to clean up.
        self.path = PathBuf::new();

        if sync == SyncMode::EveryWrite {
            if let Some(dir) = target.parent() {
                sync_dir(dir)?;
            }
        }
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if !self.path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| RefError::Io {
            path: dir.to_path_buf(),
            source: e,
        })
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
