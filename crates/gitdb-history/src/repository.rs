use std::fs;
use std::path::Path;

use gitdb_refs::{FileRefStore, InMemoryRefStore, RefStore};
use gitdb_store::{
    Blob, Commit, FsObjectStore, InMemoryObjectStore, ObjectKind, ObjectStore, RepoPath,
};
use gitdb_types::{RevisionId, Signature};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{HistoryError, HistoryResult};
use crate::layout::StoreLayout;
use crate::pending::PendingChange;
use crate::revision::Revision;
use crate::snapshot::{self, FileMap};
use crate::traits::RevisionStore;
use crate::validation::{HistoryValidator, ValidationReport};

/// A revision store assembled from an object store and a `HEAD` ref.
///
/// Commits write blobs, then trees bottom-up, then the commit object, and
/// only then compare-and-swap `HEAD`. Objects left behind by a failed commit
/// are unreachable from `HEAD` and never observed.
pub struct Repository<O, R> {
    objects: O,
    refs: R,
    layout: Option<StoreLayout>,
}

/// The durable on-disk repository.
pub type DiskRepository = Repository<FsObjectStore, FileRefStore>;

/// A repository that lives only as long as the process.
pub type MemoryRepository = Repository<InMemoryObjectStore, InMemoryRefStore>;

impl<O: ObjectStore, R: RefStore> Repository<O, R> {
    /// Assemble a repository from arbitrary backends.
    pub fn new(objects: O, refs: R) -> Self {
        Self {
            objects,
            refs,
            layout: None,
        }
    }

    pub fn objects(&self) -> &O {
        &self.objects
    }

    pub fn refs(&self) -> &R {
        &self.refs
    }

    /// On-disk layout, for repositories that have one.
    pub fn layout(&self) -> Option<&StoreLayout> {
        self.layout.as_ref()
    }

    fn read_commit(&self, id: &RevisionId) -> HistoryResult<Commit> {
        match self.objects.read(&id.object_id())? {
            Some(obj) if obj.kind == ObjectKind::Commit => Ok(Commit::from_stored_object(obj)?),
            _ => Err(HistoryError::RevisionNotFound(*id)),
        }
    }
}

impl MemoryRepository {
    pub fn in_memory() -> Self {
        Self::new(InMemoryObjectStore::new(), InMemoryRefStore::new())
    }
}

impl DiskRepository {
    /// Create a new empty store at `root`, creating the directory if needed.
    ///
    /// Fails with [`HistoryError::AlreadyExists`] if a store is already there.
    pub fn init(root: &Path) -> HistoryResult<Self> {
        Self::init_with_config(root, StoreConfig::default())
    }

    pub fn init_with_config(root: &Path, config: StoreConfig) -> HistoryResult<Self> {
        let layout = StoreLayout::new(root);
        if layout.is_initialized() {
            return Err(HistoryError::AlreadyExists(root.to_path_buf()));
        }

        let objects_dir = layout.objects_dir();
        fs::create_dir_all(&objects_dir).map_err(|e| HistoryError::io(&objects_dir, e))?;
        config.save(&layout.config_path())?;

        info!(root = %root.display(), sync = ?config.sync, "store initialized");
        Self::assemble(layout, &config)
    }

    /// Attach to an existing store at `root`.
    ///
    /// Fails with [`HistoryError::StoreNotFound`] if there is none.
    pub fn open(root: &Path) -> HistoryResult<Self> {
        let layout = StoreLayout::new(root);
        if !layout.is_initialized() {
            return Err(HistoryError::StoreNotFound(root.to_path_buf()));
        }
        let config = StoreConfig::load(&layout.config_path())?;

        let repo = Self::assemble(layout, &config)?;
        info!(
            root = %root.display(),
            head = ?repo.head()?.map(|id| id.short_hex()),
            "store opened"
        );
        Ok(repo)
    }

    /// Attach to the store at `root`, creating an empty one if there is none.
    pub fn open_or_init(root: &Path) -> HistoryResult<Self> {
        if StoreLayout::new(root).is_initialized() {
            Self::open(root)
        } else {
            Self::init(root)
        }
    }

    pub fn root(&self) -> &Path {
        // Disk repositories are always built with a layout.
        self.layout.as_ref().map_or(Path::new("."), StoreLayout::root)
    }

    fn assemble(layout: StoreLayout, config: &StoreConfig) -> HistoryResult<Self> {
        let objects = FsObjectStore::open(layout.objects_dir(), config.sync)?;
        let refs = FileRefStore::new(layout.head_path(), config.sync);
        Ok(Self {
            objects,
            refs,
            layout: Some(layout),
        })
    }
}

impl<O: ObjectStore, R: RefStore> RevisionStore for Repository<O, R> {
    fn head(&self) -> HistoryResult<Option<RevisionId>> {
        Ok(self.refs.head()?)
    }

    fn begin(&self) -> HistoryResult<PendingChange> {
        let base = self.head()?;
        let files = match &base {
            Some(id) => self.files(id)?,
            None => FileMap::new(),
        };
        Ok(PendingChange::new(base, files))
    }

    fn commit(
        &self,
        change: PendingChange,
        message: &str,
        author: Signature,
    ) -> HistoryResult<RevisionId> {
        if change.is_empty() {
            return Err(HistoryError::EmptyChange);
        }
        let (base, mut files, staged) = change.into_parts();

        for (path, data) in staged {
            let blob = self.objects.write(&Blob::new(data).to_stored_object())?;
            debug!(path = %path, blob = %blob.short_hex(), "staged file stored");
            files.insert(path.as_str().to_string(), blob);
        }
        let tree = snapshot::write_tree(&self.objects, &files)?;

        let commit = Commit {
            tree,
            parent: base,
            author,
            message: message.to_string(),
        };
        let id = RevisionId::new(self.objects.write(&commit.to_stored_object()?)?);

        self.refs.update_head(base, id)?;
        info!(
            revision = %id.short_hex(),
            parent = ?base.map(|p| p.short_hex()),
            files = files.len(),
            "revision committed"
        );
        Ok(id)
    }

    fn revision(&self, id: &RevisionId) -> HistoryResult<Revision> {
        Ok(Revision::from_commit(*id, self.read_commit(id)?))
    }

    fn files(&self, id: &RevisionId) -> HistoryResult<FileMap> {
        let commit = self.read_commit(id)?;
        snapshot::load_files(&self.objects, commit.tree)
    }

    fn resolve(&self, id: &RevisionId, path: &str) -> HistoryResult<Vec<u8>> {
        let repo_path = RepoPath::new(path)?;
        let commit = self.read_commit(id)?;
        let not_found = || HistoryError::FileNotFound {
            revision: *id,
            path: path.to_string(),
        };

        let blob = snapshot::lookup(&self.objects, commit.tree, &repo_path)?.ok_or_else(not_found)?;
        Ok(Blob::from_stored_object(self.objects.read_required(&blob)?)?.data)
    }

    fn verify(&self) -> HistoryResult<ValidationReport> {
        HistoryValidator::validate(&self.objects, self.head()?)
    }
}

impl<O: ObjectStore, R: RefStore> std::fmt::Debug for Repository<O, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.layout.as_ref().map(StoreLayout::root))
            .finish_non_exhaustive()
    }
}
