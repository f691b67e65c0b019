use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use gitdb_history::{
    DiskRepository, HistoryError, Revision, RevisionStore, StoreLayout, ValidationReport,
};
use gitdb_store::{write_atomic, RepoPath, StoreError, SyncMode};
use gitdb_types::{RevisionId, Signature};
use tracing::{debug, info, warn};

use crate::config::{message_or_default, EngineConfig};
use crate::error::{EngineError, EngineResult};

/// Sentinel returned by [`Engine::version_string`] when there is no head.
pub const VERSION_ERROR: &str = "error";

struct Attached<S> {
    root: PathBuf,
    store: S,
}

/// A versioned file store: every save appends one revision to a linear
/// history, and every read sees a fully committed revision.
///
/// One engine is meant to be built by the process entry point and shared
/// (`Arc<Engine>`) with everything that needs storage. Saves are serialized
/// by an exclusive lock held across stage and commit; reads share the lock.
pub struct Engine<S = DiskRepository> {
    config: EngineConfig,
    state: RwLock<Option<Attached<S>>>,
}

impl Engine<DiskRepository> {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Initialize or attach to the on-disk store at `path`.
    ///
    /// The directory is created if missing. Opening the path that is already
    /// open is a no-op; any other path fails with
    /// [`EngineError::AlreadyOpen`].
    pub fn open(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let requested = normalize(path);
        self.attach_with(requested, || {
            let io = |source| EngineError::Io {
                path: path.to_path_buf(),
                source,
            };
            fs::create_dir_all(path).map_err(io)?;
            let root = fs::canonicalize(path).map_err(io)?;
            let store = DiskRepository::open_or_init(&root)?;
            Ok((root, store))
        })
    }
}

impl<S: RevisionStore> Engine<S> {
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attach an already constructed revision store rooted at `path`.
    ///
    /// Follows the same rules as [`Engine::open`]: attaching the current
    /// root again is a no-op and drops `store`.
    pub fn attach(&self, path: impl AsRef<Path>, store: S) -> EngineResult<()> {
        let root = normalize(path.as_ref());
        self.attach_with(root.clone(), || Ok((root, store)))
    }

    /// Checks the attached state before `make` runs, so nothing is created
    /// on disk for a request that is going to be refused.
    fn attach_with(
        &self,
        requested: PathBuf,
        make: impl FnOnce() -> EngineResult<(PathBuf, S)>,
    ) -> EngineResult<()> {
        let mut state = self.state.write().map_err(|_| EngineError::Poisoned)?;
        if let Some(current) = state.as_ref() {
            if current.root == requested {
                debug!(root = %requested.display(), "store already open");
                return Ok(());
            }
            return Err(EngineError::AlreadyOpen {
                current: current.root.clone(),
                requested,
            });
        }

        let (root, store) = make()?;
        info!(
            root = %root.display(),
            head = ?store.head()?.map(|id| id.short_hex()),
            "engine attached"
        );
        *state = Some(Attached { root, store });
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.state.read().is_ok_and(|s| s.is_some())
    }

    /// Root directory of the attached store.
    pub fn root(&self) -> Option<PathBuf> {
        let state = self.state.read().ok()?;
        state.as_ref().map(|a| a.root.clone())
    }

    /// Save `data` as `filename` with the default message.
    pub fn save(&self, filename: &str, data: impl AsRef<[u8]>) -> EngineResult<RevisionId> {
        self.save_with_message(filename, data, "")
    }

    /// Record a new revision in which `filename` holds `data` and every other
    /// file is carried over from the head.
    ///
    /// On any error the head and history are unchanged.
    pub fn save_with_message(
        &self,
        filename: &str,
        data: impl AsRef<[u8]>,
        message: &str,
    ) -> EngineResult<RevisionId> {
        let data = data.as_ref();
        let state = self.state.write().map_err(|_| EngineError::Poisoned)?;
        let attached = state.as_ref().ok_or(EngineError::NotOpen)?;
        let path = validate_path(filename)?;

        let mut change = attached.store.begin()?;
        change.stage_file(path.as_str(), data)?;
        let id = attached
            .store
            .commit(change, message_or_default(message), Signature::system_now())?;
        debug!(path = %path, bytes = data.len(), revision = %id.short_hex(), "saved");

        if self.config.materialize_worktree {
            materialize(&attached.root, &path, data);
        }
        Ok(id)
    }

    /// Content of `filename` in the head revision.
    pub fn read(&self, filename: &str) -> EngineResult<Vec<u8>> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        let attached = state.as_ref().ok_or(EngineError::NotOpen)?;
        let path = validate_path(filename)?;
        let head = attached.store.head()?.ok_or(EngineError::NoRevisions)?;
        Ok(attached.store.resolve(&head, path.as_str())?)
    }

    /// Content of `filename` as of `revision`.
    pub fn read_at(&self, revision: &RevisionId, filename: &str) -> EngineResult<Vec<u8>> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        let attached = state.as_ref().ok_or(EngineError::NotOpen)?;
        let path = validate_path(filename)?;
        Ok(attached.store.resolve(revision, path.as_str())?)
    }

    /// The head revision; `Ok(None)` while the history is empty.
    pub fn head(&self) -> EngineResult<Option<RevisionId>> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        let attached = state.as_ref().ok_or(EngineError::NotOpen)?;
        Ok(attached.store.head()?)
    }

    /// The head revision, or `None` when unopened, empty, or unreadable.
    pub fn version(&self) -> Option<RevisionId> {
        match self.head() {
            Ok(head) => head,
            Err(EngineError::NotOpen) => None,
            Err(e) => {
                warn!(error = %e, "could not read head");
                None
            }
        }
    }

    /// Hex id of the head revision, or [`VERSION_ERROR`].
    pub fn version_string(&self) -> String {
        self.version()
            .map_or_else(|| VERSION_ERROR.to_string(), |id| id.to_hex())
    }

    /// Revisions newest first, at most `limit` of them.
    pub fn log(&self, limit: Option<usize>) -> EngineResult<Vec<Revision>> {
        self.with_store(|store| Ok(store.log(limit)?))
    }

    pub fn revision(&self, id: &RevisionId) -> EngineResult<Revision> {
        self.with_store(|store| Ok(store.revision(id)?))
    }

    /// Paths present in the head revision.
    pub fn files(&self) -> EngineResult<Vec<String>> {
        self.with_store(|store| match store.head()? {
            Some(head) => Ok(store.files(&head)?.into_keys().collect()),
            None => Ok(Vec::new()),
        })
    }

    /// Check every object and parent link reachable from the head.
    pub fn verify(&self) -> EngineResult<ValidationReport> {
        self.with_store(|store| Ok(store.verify()?))
    }

    fn with_store<T>(&self, f: impl FnOnce(&S) -> EngineResult<T>) -> EngineResult<T> {
        let state = self.state.read().map_err(|_| EngineError::Poisoned)?;
        let attached = state.as_ref().ok_or(EngineError::NotOpen)?;
        f(&attached.store)
    }
}

impl<S: RevisionStore> Default for Engine<S> {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl<S> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let root = self
            .state
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|a| a.root.clone()));
        f.debug_struct("Engine")
            .field("root", &root)
            .field("config", &self.config)
            .finish()
    }
}

/// Canonical form of `path` if it exists, otherwise `path` as given.
fn normalize(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn validate_path(filename: &str) -> EngineResult<RepoPath> {
    RepoPath::new(filename).map_err(|e| match e {
        StoreError::InvalidPath { path, reason } => EngineError::InvalidPath { path, reason },
        other => EngineError::History(HistoryError::Store(other)),
    })
}

/// Best effort: the revision is already committed.
fn materialize(root: &Path, path: &RepoPath, data: &[u8]) {
    let target = StoreLayout::new(root).worktree_path(path.as_str());
    if let Some(parent) = target.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!(path = %target.display(), error = %e, "worktree directory not created");
            return;
        }
    }
    if let Err(e) = write_atomic(&target, data, SyncMode::OsDefault) {
        warn!(path = %target.display(), error = %e, "worktree file not written");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use gitdb_history::{MemoryRepository, Repository};
    use gitdb_refs::InMemoryRefStore;
    use gitdb_store::{InMemoryObjectStore, ObjectStore, StoreResult, StoredObject};
    use gitdb_types::ObjectId;
    use proptest::prelude::*;

    use super::*;

    fn memory_engine() -> Engine<MemoryRepository> {
        let engine: Engine<MemoryRepository> = Engine::default();
        engine.attach("/memory", Repository::in_memory()).unwrap();
        engine
    }

    /// Object store that fails every write once its budget is spent.
    struct FaultyObjectStore {
        inner: InMemoryObjectStore,
        budget: Arc<AtomicUsize>,
    }

    impl ObjectStore for FaultyObjectStore {
        fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
            self.inner.read(id)
        }

        fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
            let spent = self
                .budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if spent.is_err() {
                return Err(StoreError::Io {
                    path: PathBuf::from("/faulty"),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.write(object)
        }

        fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
            self.inner.exists(id)
        }
    }

    type FaultyRepository = Repository<FaultyObjectStore, InMemoryRefStore>;

    fn faulty_engine() -> (Engine<FaultyRepository>, Arc<AtomicUsize>) {
        let budget = Arc::new(AtomicUsize::new(usize::MAX));
        let objects = FaultyObjectStore {
            inner: InMemoryObjectStore::new(),
            budget: Arc::clone(&budget),
        };
        let engine: Engine<FaultyRepository> = Engine::default();
        engine
            .attach("/faulty", Repository::new(objects, InMemoryRefStore::new()))
            .unwrap();
        (engine, budget)
    }

    #[test]
    fn unopened_engine() {
        let engine: Engine<MemoryRepository> = Engine::default();
        assert!(!engine.is_open());
        assert!(matches!(engine.save("a", "x"), Err(EngineError::NotOpen)));
        assert!(matches!(engine.read("a"), Err(EngineError::NotOpen)));
        assert!(matches!(engine.log(None), Err(EngineError::NotOpen)));
        assert_eq!(engine.version(), None);
        assert_eq!(engine.version_string(), "error");
    }

    #[test]
    fn empty_store_has_no_version() {
        let engine = memory_engine();
        assert_eq!(engine.version(), None);
        assert_eq!(engine.version_string(), VERSION_ERROR);
        let err = engine.read("a.txt").unwrap_err();
        assert!(matches!(err, EngineError::NoRevisions));
        assert!(err.is_not_found());
        assert!(engine.files().unwrap().is_empty());
    }

    #[test]
    fn shared_handle_sees_the_same_store() {
        let a = Arc::new(memory_engine());
        let b = Arc::clone(&a);
        assert!(Arc::ptr_eq(&a, &b));

        let id = b.save("k", "v").unwrap();
        assert_eq!(a.version(), Some(id));
        assert_eq!(a.read("k").unwrap(), b"v");
    }

    #[test]
    fn saves_form_a_chain() {
        let engine = memory_engine();
        let first = engine.save("a.txt", "1").unwrap();
        let second = engine.save("a.txt", "2").unwrap();
        let third = engine.save("b.txt", "3").unwrap();

        assert_eq!(engine.version(), Some(third));
        assert_eq!(engine.version_string(), third.to_hex());
        let log = engine.log(None).unwrap();
        assert_eq!(
            log.iter().map(|r| (r.id, r.parent)).collect::<Vec<_>>(),
            vec![(third, Some(second)), (second, Some(first)), (first, None)]
        );
        assert!(engine.verify().unwrap().is_valid());
    }

    #[test]
    fn identical_content_still_advances_head() {
        let engine = memory_engine();
        let first = engine.save("a.txt", "same").unwrap();
        let second = engine.save("a.txt", "same").unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.log(None).unwrap().len(), 2);
    }

    #[test]
    fn read_after_write_and_history() {
        let engine = memory_engine();
        let old = engine.save("notes/today.md", "draft").unwrap();
        engine.save("notes/today.md", "final").unwrap();

        assert_eq!(engine.read("notes/today.md").unwrap(), b"final");
        assert_eq!(engine.read_at(&old, "notes/today.md").unwrap(), b"draft");
        assert!(engine.read("notes/other.md").unwrap_err().is_not_found());
    }

    #[test]
    fn unknown_revision_is_not_found() {
        let engine = memory_engine();
        engine.save("a", "x").unwrap();
        let unknown = RevisionId::new(ObjectId::from_bytes(b"unknown"));
        assert!(engine.read_at(&unknown, "a").unwrap_err().is_not_found());
        assert!(engine.revision(&unknown).unwrap_err().is_not_found());
    }

    #[test]
    fn overwrite_keeps_siblings() {
        let engine = memory_engine();
        engine.save("a", "X").unwrap();
        engine.save("b", "Y").unwrap();
        engine.save("a", "Z").unwrap();
        assert_eq!(engine.read("a").unwrap(), b"Z");
        assert_eq!(engine.read("b").unwrap(), b"Y");
        assert_eq!(engine.files().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn messages_and_author() {
        let engine = memory_engine();
        let default = engine.save("a", "1").unwrap();
        let custom = engine.save_with_message("a", "2", "rotate keys").unwrap();

        let revision = engine.revision(&default).unwrap();
        assert_eq!(revision.message, "some message");
        assert_eq!(revision.author.name, "gitdb");
        assert_eq!(revision.author.email, "gitdb@github.com");
        assert_eq!(engine.revision(&custom).unwrap().message, "rotate keys");
        assert!(engine.revision(&custom).unwrap().timestamp() >= revision.timestamp());
    }

    #[test]
    fn invalid_paths_are_rejected_without_a_revision() {
        let engine = memory_engine();
        let head = engine.save("ok", "1").unwrap();
        for bad in ["", "/abs", "../escape", "a/./b", ".gitdb/HEAD", "dir//file"] {
            assert!(
                matches!(engine.save(bad, "x"), Err(EngineError::InvalidPath { .. })),
                "{bad:?}"
            );
        }
        assert_eq!(engine.version(), Some(head));
    }

    #[test]
    fn path_conflict_is_rejected() {
        let engine = memory_engine();
        let head = engine.save("dir", "file").unwrap();
        assert!(matches!(
            engine.save("dir/child", "x"),
            Err(EngineError::History(HistoryError::PathConflict { .. }))
        ));
        assert_eq!(engine.version(), Some(head));
    }

    #[test]
    fn failed_commit_changes_nothing() {
        let (engine, budget) = faulty_engine();
        let head = engine.save("a", "before").unwrap();

        // Blob write succeeds, tree write fails.
        budget.store(1, Ordering::SeqCst);
        assert!(engine.save("a", "after").is_err());
        assert_eq!(engine.version(), Some(head));
        assert_eq!(engine.read("a").unwrap(), b"before");
        assert_eq!(engine.log(None).unwrap().len(), 1);

        budget.store(0, Ordering::SeqCst);
        assert!(engine.save("b", "new").is_err());
        assert_eq!(engine.files().unwrap(), vec!["a"]);
        assert!(engine.verify().unwrap().is_valid());

        budget.store(usize::MAX, Ordering::SeqCst);
        let next = engine.save("a", "after").unwrap();
        assert_eq!(engine.revision(&next).unwrap().parent, Some(head));
    }

    #[test]
    fn concurrent_saves_are_serialized() {
        const THREADS: usize = 8;
        let engine = Arc::new(memory_engine());

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || engine.save(&format!("file-{i}"), i.to_string()).unwrap())
            })
            .collect();
        let mut ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let log = engine.log(None).unwrap();
        assert_eq!(log.len(), THREADS);
        let parents: HashSet<_> = log.iter().map(|r| r.parent).collect();
        assert_eq!(parents.len(), THREADS);
        for pair in log.windows(2) {
            assert_eq!(pair[0].parent, Some(pair[1].id));
        }
        assert_eq!(log.last().unwrap().parent, None);

        let mut logged: Vec<_> = log.iter().map(|r| r.id).collect();
        ids.sort_by_key(|id| id.to_hex());
        logged.sort_by_key(|id| id.to_hex());
        assert_eq!(ids, logged);
        assert_eq!(engine.files().unwrap().len(), THREADS);
        assert!(engine.verify().unwrap().is_valid());
    }

    #[test]
    fn readers_only_see_committed_revisions() {
        const WRITERS: usize = 4;
        const SAVES: usize = 25;
        let engine = Arc::new(memory_engine());
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut versions = Vec::new();
                    let mut values = Vec::new();
                    while !done.load(Ordering::SeqCst) {
                        versions.push(engine.version());
                        match engine.read("k") {
                            Ok(data) => values.push(String::from_utf8(data).unwrap()),
                            Err(e) => assert!(matches!(e, EngineError::NoRevisions), "{e}"),
                        }
                    }
                    (versions, values)
                })
            })
            .collect();

        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..SAVES {
                        engine.save("k", format!("{}", w * SAVES + i)).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);

        let committed: HashSet<_> = engine.log(None).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(committed.len(), WRITERS * SAVES);
        for reader in readers {
            let (versions, values) = reader.join().unwrap();
            for version in versions.into_iter().flatten() {
                assert!(committed.contains(&version));
            }
            for value in values {
                let n: usize = value.parse().unwrap();
                assert!(n < WRITERS * SAVES);
            }
        }
        assert!(engine.verify().unwrap().is_valid());
    }

    #[test]
    fn read_checks_path_before_history() {
        let engine = memory_engine();
        assert!(matches!(
            engine.read("../x"),
            Err(EngineError::InvalidPath { .. })
        ));
        engine.save("a", "1").unwrap();
        assert!(matches!(
            engine.read("../x"),
            Err(EngineError::InvalidPath { .. })
        ));
    }

    #[test]
    fn open_persists_across_engines() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let engine = Engine::new();
            engine.open(dir.path()).unwrap();
            engine.save("config/app.toml", "port = 80").unwrap()
        };

        let engine = Engine::new();
        engine.open(dir.path()).unwrap();
        assert_eq!(engine.version(), Some(id));
        assert_eq!(engine.read("config/app.toml").unwrap(), b"port = 80");
        assert!(engine.verify().unwrap().is_valid());
    }

    #[test]
    fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a/b");
        let engine = Engine::new();
        engine.open(&root).unwrap();
        assert!(root.join(".gitdb").is_dir());
        assert_eq!(engine.root(), Some(fs::canonicalize(&root).unwrap()));
        assert_eq!(engine.version(), None);
    }

    #[test]
    fn reopening_same_path_is_noop_other_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let engine = Engine::new();
        engine.open(&first).unwrap();
        let id = engine.save("a", "x").unwrap();

        engine.open(&first).unwrap();
        engine.open(first.join("../first")).unwrap();
        assert_eq!(engine.version(), Some(id));

        assert!(matches!(
            engine.open(dir.path().join("second")),
            Err(EngineError::AlreadyOpen { .. })
        ));
        assert_eq!(engine.read("a").unwrap(), b"x");
    }

    #[test]
    fn refused_open_touches_nothing_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new();
        engine.open(dir.path().join("first")).unwrap();

        let second = dir.path().join("second");
        assert!(matches!(
            engine.open(&second),
            Err(EngineError::AlreadyOpen { .. })
        ));
        assert!(!second.exists());

        // Not creatable at all: still refused because a store is open.
        fs::write(dir.path().join("plainfile"), "x").unwrap();
        assert!(matches!(
            engine.open(dir.path().join("plainfile/sub")),
            Err(EngineError::AlreadyOpen { .. })
        ));
    }

    #[test]
    fn open_of_uncreatable_path_is_io_when_nothing_attached() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plainfile"), "x").unwrap();
        let engine = Engine::new();
        assert!(matches!(
            engine.open(dir.path().join("plainfile/sub")),
            Err(EngineError::Io { .. })
        ));
        assert!(!engine.is_open());
    }

    #[test]
    fn materialized_worktree_mirrors_saves() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            materialize_worktree: true,
            ..EngineConfig::default()
        };
        let engine: Engine = Engine::with_config(config);
        engine.open(dir.path()).unwrap();
        engine.save("docs/readme.md", "hello").unwrap();

        assert_eq!(
            fs::read(dir.path().join("docs/readme.md")).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn worktree_is_not_the_source_of_truth() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new();
        engine.open(dir.path()).unwrap();
        engine.save("a.txt", "committed").unwrap();

        fs::write(dir.path().join("a.txt"), "edited out of band").unwrap();
        assert_eq!(engine.read("a.txt").unwrap(), b"committed");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn reads_match_last_write_per_path(
            writes in proptest::collection::vec((0usize..4, proptest::collection::vec(any::<u8>(), 0..8)), 1..12)
        ) {
            let engine = memory_engine();
            let mut model = BTreeMap::new();
            for (slot, data) in &writes {
                let path = format!("dir/file-{slot}");
                engine.save(&path, data).unwrap();
                model.insert(path, data.clone());
            }

            prop_assert_eq!(engine.log(None).unwrap().len(), writes.len());
            prop_assert_eq!(engine.files().unwrap(), model.keys().cloned().collect::<Vec<_>>());
            for (path, data) in &model {
                prop_assert_eq!(&engine.read(path).unwrap(), data);
            }
        }
    }
}
