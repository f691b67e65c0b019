//! Conversion between nested tree objects and flat file maps.
//!
//! A revision's content is a root [`Tree`] whose `/`-separated paths are
//! spread over nested subtrees. The engine reasons about a flat
//! `path -> blob id` map instead; these helpers translate both ways.

use std::collections::BTreeMap;

use gitdb_store::{EntryMode, ObjectStore, RepoPath, Tree, TreeEntry};
use gitdb_types::ObjectId;

use crate::error::HistoryResult;

/// Flat view of a snapshot: store-relative path to blob id.
pub type FileMap = BTreeMap<String, ObjectId>;

/// Read a tree and all of its subtrees into a flat map.
pub fn load_files<O: ObjectStore + ?Sized>(objects: &O, tree: ObjectId) -> HistoryResult<FileMap> {
    let mut files = FileMap::new();
    collect(objects, tree, "", &mut files)?;
    Ok(files)
}

fn collect<O: ObjectStore + ?Sized>(
    objects: &O,
    tree: ObjectId,
    prefix: &str,
    files: &mut FileMap,
) -> HistoryResult<()> {
    let tree = Tree::from_stored_object(objects.read_required(&tree)?)?;
    for entry in tree.entries {
        let path = if prefix.is_empty() {
            entry.name
        } else {
            format!("{prefix}/{}", entry.name)
        };
        match entry.mode {
            EntryMode::Regular => {
                files.insert(path, entry.object_id);
            }
            EntryMode::Directory => collect(objects, entry.object_id, &path, files)?,
        }
    }
    Ok(())
}

/// Write the tree objects for `files`, subtrees before their parents, and
/// return the root tree id. Blobs must already be stored.
pub fn write_tree<O: ObjectStore + ?Sized>(objects: &O, files: &FileMap) -> HistoryResult<ObjectId> {
    let entries: Vec<(&str, ObjectId)> = files.iter().map(|(p, id)| (p.as_str(), *id)).collect();
    build(objects, &entries)
}

fn build<O: ObjectStore + ?Sized>(objects: &O, files: &[(&str, ObjectId)]) -> HistoryResult<ObjectId> {
    let mut blobs = Vec::new();
    let mut dirs: BTreeMap<&str, Vec<(&str, ObjectId)>> = BTreeMap::new();

    for (path, id) in files {
        match path.split_once('/') {
            Some((dir, rest)) => dirs.entry(dir).or_default().push((rest, *id)),
            None => blobs.push(TreeEntry::new(EntryMode::Regular, *path, *id)),
        }
    }

    let mut entries = blobs;
    for (name, children) in dirs {
        let subtree = build(objects, &children)?;
        entries.push(TreeEntry::new(EntryMode::Directory, name, subtree));
    }

    let tree = Tree::new(entries);
    Ok(objects.write(&tree.to_stored_object()?)?)
}

/// Find the blob id at `path` by descending only the subtrees on the way.
///
/// Returns `Ok(None)` when the path is absent or names a directory.
pub fn lookup<O: ObjectStore + ?Sized>(
    objects: &O,
    root: ObjectId,
    path: &RepoPath,
) -> HistoryResult<Option<ObjectId>> {
    let mut current = root;
    let mut components = path.components().peekable();

    while let Some(name) = components.next() {
        let tree = Tree::from_stored_object(objects.read_required(&current)?)?;
        let Some(entry) = tree.get(name) else {
            return Ok(None);
        };
        let last = components.peek().is_none();
        match (entry.mode, last) {
            (EntryMode::Regular, true) => return Ok(Some(entry.object_id)),
            (EntryMode::Directory, false) => current = entry.object_id,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

/// The existing path that `path` would collide with, if any: a file at one
/// of its ancestor directories, or files underneath `path` itself.
pub fn find_conflict<'a>(files: impl IntoIterator<Item = &'a String>, path: &str) -> Option<String> {
    let dir_prefix = format!("{path}/");
    files.into_iter().find_map(|existing| {
        let shadows_dir = existing.starts_with(&dir_prefix);
        let is_ancestor = path
            .strip_prefix(existing.as_str())
            .is_some_and(|rest| rest.starts_with('/'));
        (shadows_dir || is_ancestor).then(|| existing.clone())
    })
}
