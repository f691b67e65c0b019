use gitdb_crypto::ContentHasher;
use gitdb_types::{ObjectId, RevisionId, Signature};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw file content.
    Blob,
    /// Directory listing: sorted entries mapping names to object references.
    Tree,
    /// Snapshot metadata: root tree, parent revision, signature, message.
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }

    fn hasher(&self) -> ContentHasher {
        match self {
            Self::Blob => ContentHasher::BLOB,
            Self::Tree => ContentHasher::TREE,
            Self::Commit => ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag + serialized data.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// data; it only hashes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Content-addressed ID, using the hasher for this object's kind.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Loose-object encoding: `"<kind> <len>\0"` followed by the data.
    pub fn encode(&self) -> Vec<u8> {
        let header = format!("{} {}\0", self.kind, self.data.len());
        let mut out = Vec::with_capacity(header.len() + self.data.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Decode the loose-object encoding. `id` is only used for error context.
    pub fn decode(id: ObjectId, bytes: &[u8]) -> StoreResult<Self> {
        let corrupt = |reason: &str| StoreError::CorruptObject {
            id,
            reason: reason.to_string(),
        };

        let nul = bytes
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| corrupt("missing header terminator"))?;
        let header =
            std::str::from_utf8(&bytes[..nul]).map_err(|_| corrupt("header is not utf-8"))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| corrupt("malformed header"))?;
        let kind = ObjectKind::parse(kind).ok_or_else(|| corrupt("unknown object kind"))?;
        let len: usize = len.parse().map_err(|_| corrupt("malformed length"))?;

        let data = &bytes[nul + 1..];
        if data.len() != len {
            return Err(corrupt("length does not match header"));
        }
        Ok(Self::new(kind, data.to_vec()))
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object (analogous to git blob).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self { data: obj.data })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Subtree / directory (0o040000).
    Directory,
}

impl EntryMode {
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Directory => 0o040000,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: EntryMode,
    /// A single path component.
    pub name: String,
    pub object_id: ObjectId,
}

impl TreeEntry {
    pub fn new(mode: EntryMode, name: impl Into<String>, object_id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            object_id,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode == EntryMode::Directory
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Directory listing object (analogous to git tree).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries sorted by name for deterministic hashing.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    pub fn from_stored_object(obj: StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// One revision's metadata. Its object id is the revision id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree of the snapshot.
    pub tree: ObjectId,
    /// Previous revision; `None` only for the first revision of a store.
    pub parent: Option<RevisionId>,
    pub author: Signature,
    pub message: String,
}

impl Commit {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Commit, data))
    }

    pub fn from_stored_object(obj: StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// The revision id this commit will be stored under.
    pub fn revision_id(&self) -> StoreResult<RevisionId> {
        Ok(RevisionId::new(self.to_stored_object()?.compute_id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_commit(parent: Option<RevisionId>, message: &str) -> Commit {
        Commit {
            tree: ObjectId::from_bytes(b"tree"),
            parent,
            author: Signature::new(
                "gitdb",
                "gitdb@github.com",
                Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            ),
            message: message.into(),
        }
    }

    #[test]
    fn blob_kind_mismatch() {
        let stored = StoredObject::new(ObjectKind::Tree, b"not a blob".to_vec());
        let err = Blob::from_stored_object(stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn tree_entries_sorted_and_searchable() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "zebra.txt", ObjectId::null()),
            TreeEntry::new(EntryMode::Regular, "alpha.txt", ObjectId::null()),
            TreeEntry::new(EntryMode::Directory, "middle", ObjectId::null()),
        ]);
        assert_eq!(tree.entries[0].name, "alpha.txt");
        assert_eq!(tree.entries[2].name, "zebra.txt");
        assert!(tree.get("middle").unwrap().is_dir());
        assert!(tree.get("missing").is_none());
    }

    #[test]
    fn tree_id_independent_of_insertion_order() {
        let a = TreeEntry::new(EntryMode::Regular, "a", ObjectId::from_bytes(b"a"));
        let b = TreeEntry::new(EntryMode::Regular, "b", ObjectId::from_bytes(b"b"));
        let t1 = Tree::new(vec![a.clone(), b.clone()]).to_stored_object().unwrap();
        let t2 = Tree::new(vec![b, a]).to_stored_object().unwrap();
        assert_eq!(t1.compute_id(), t2.compute_id());
    }

    #[test]
    fn commit_id_depends_on_parent_and_message() {
        let first = sample_commit(None, "some message");
        let id = first.revision_id().unwrap();
        assert_ne!(
            sample_commit(Some(id), "some message").revision_id().unwrap(),
            id
        );
        assert_ne!(sample_commit(None, "other").revision_id().unwrap(), id);
        assert_eq!(first.revision_id().unwrap(), id);
    }

    #[test]
    fn commit_decodes_from_stored_form() {
        let commit = sample_commit(None, "hello");
        let stored = commit.to_stored_object().unwrap();
        assert_eq!(Commit::from_stored_object(stored).unwrap(), commit);
    }

    #[test]
    fn loose_encoding_has_git_style_header() {
        let obj = Blob::new(b"hello".to_vec()).to_stored_object();
        let encoded = obj.encode();
        assert!(encoded.starts_with(b"blob 5\0"));
        assert_eq!(StoredObject::decode(obj.compute_id(), &encoded).unwrap(), obj);
    }

    #[test]
    fn decode_rejects_damaged_objects() {
        let id = ObjectId::from_bytes(b"x");
        for bytes in [
            &b"blob 5hello"[..],
            &b"blob x\0hello"[..],
            &b"blob 9\0hello"[..],
            &b"shoe 5\0hello"[..],
        ] {
            assert!(matches!(
                StoredObject::decode(id, bytes),
                Err(StoreError::CorruptObject { .. })
            ));
        }
    }

    #[test]
    fn kinds_hash_into_separate_domains() {
        let data = b"same data".to_vec();
        let blob = StoredObject::new(ObjectKind::Blob, data.clone());
        let tree = StoredObject::new(ObjectKind::Tree, data.clone());
        let commit = StoredObject::new(ObjectKind::Commit, data);
        assert_ne!(blob.compute_id(), tree.compute_id());
        assert_ne!(blob.compute_id(), commit.compute_id());
    }
}
