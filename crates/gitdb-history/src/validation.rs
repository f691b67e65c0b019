use std::collections::HashSet;

use gitdb_crypto::{ChainError, ChainLink, RevisionChainVerifier};
use gitdb_store::{Commit, EntryMode, ObjectKind, ObjectStore, StoreError, StoredObject, Tree};
use gitdb_types::{ObjectId, RevisionId};
use tracing::{debug, warn};

use crate::error::HistoryResult;

/// Result of a full history check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub head: Option<RevisionId>,
    /// Revisions reached by walking parent links from the head.
    pub revision_count: u64,
    /// Distinct objects read, commits included.
    pub objects_checked: u64,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Revision being checked when the violation was found.
    pub revision: Option<RevisionId>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    MissingObject,
    CorruptObject,
    ChainBreak,
    HashMismatch,
}

struct CommitLink {
    id: RevisionId,
    parent: Option<RevisionId>,
    payload: Vec<u8>,
}

impl ChainLink for CommitLink {
    fn link_id(&self) -> ObjectId {
        self.id.object_id()
    }

    fn parent_id(&self) -> Option<ObjectId> {
        self.parent.map(|p| p.object_id())
    }

    fn payload_bytes(&self) -> Vec<u8> {
        self.payload.clone()
    }
}

/// Walks a history and checks every reachable object.
pub struct HistoryValidator;

impl HistoryValidator {
    /// Validate the history ending at `head`.
    ///
    /// Store errors on individual objects become violations; only failures
    /// that prevent the walk itself are returned as `Err`.
    pub fn validate<O: ObjectStore + ?Sized>(
        objects: &O,
        head: Option<RevisionId>,
    ) -> HistoryResult<ValidationReport> {
        let mut walk = Walk {
            objects,
            seen: HashSet::new(),
            violations: Vec::new(),
        };

        let mut links = Vec::new();
        let mut next = head;
        while let Some(id) = next {
            if !walk.seen.insert(id.object_id()) {
                walk.report(Some(id), ViolationKind::ChainBreak, "parent links form a cycle");
                break;
            }
            let Some(obj) = walk.fetch(id, id.object_id(), ObjectKind::Commit) else {
                break;
            };
            let commit = match Commit::from_stored_object(obj.clone()) {
                Ok(commit) => commit,
                Err(e) => {
                    walk.report(Some(id), ViolationKind::CorruptObject, e.to_string());
                    break;
                }
            };

            walk.check_tree(id, commit.tree);
            next = commit.parent;
            links.push(CommitLink {
                id,
                parent: commit.parent,
                payload: obj.data,
            });
        }

        links.reverse();
        if let Err(e) = RevisionChainVerifier::verify_chain(&links) {
            let (index, kind) = match e {
                ChainError::RootHasParent => (0, ViolationKind::ChainBreak),
                ChainError::BrokenLink { index } | ChainError::MissingParent { index } => {
                    (index, ViolationKind::ChainBreak)
                }
                ChainError::HashMismatch { index } => (index, ViolationKind::HashMismatch),
            };
            // A walk cut short by a missing commit already has a violation.
            if walk.violations.is_empty() || kind == ViolationKind::HashMismatch {
                let revision = links.get(index).map(|l| l.id);
                walk.report(revision, kind, e.to_string());
            }
        }

        let report = ValidationReport {
            head,
            revision_count: links.len() as u64,
            objects_checked: walk.seen.len() as u64,
            violations: walk.violations,
        };
        if report.is_valid() {
            debug!(revisions = report.revision_count, objects = report.objects_checked, "history valid");
        } else {
            warn!(violations = report.violations.len(), "history has integrity violations");
        }
        Ok(report)
    }
}

struct Walk<'a, O: ?Sized> {
    objects: &'a O,
    seen: HashSet<ObjectId>,
    violations: Vec<Violation>,
}

impl<O: ObjectStore + ?Sized> Walk<'_, O> {
    fn report(&mut self, revision: Option<RevisionId>, kind: ViolationKind, description: impl Into<String>) {
        self.violations.push(Violation {
            revision,
            kind,
            description: description.into(),
        });
    }

    /// Read `id`, recording a violation if it is missing, corrupt, or of the
    /// wrong kind.
    fn fetch(&mut self, revision: RevisionId, id: ObjectId, kind: ObjectKind) -> Option<StoredObject> {
        match self.objects.read(&id) {
            Ok(Some(obj)) if obj.kind == kind => Some(obj),
            Ok(Some(obj)) => {
                self.report(
                    Some(revision),
                    ViolationKind::CorruptObject,
                    format!("{} is a {}, expected {kind}", id.short_hex(), obj.kind),
                );
                None
            }
            Ok(None) => {
                self.report(
                    Some(revision),
                    ViolationKind::MissingObject,
                    format!("{kind} {} is missing", id.short_hex()),
                );
                None
            }
            Err(StoreError::HashMismatch { .. }) => {
                self.report(
                    Some(revision),
                    ViolationKind::HashMismatch,
                    format!("{kind} {} does not match its content", id.short_hex()),
                );
                None
            }
            Err(e) => {
                self.report(Some(revision), ViolationKind::CorruptObject, e.to_string());
                None
            }
        }
    }

    fn check_tree(&mut self, revision: RevisionId, id: ObjectId) {
        if !self.seen.insert(id) {
            return;
        }
        let Some(obj) = self.fetch(revision, id, ObjectKind::Tree) else {
            return;
        };
        let tree = match Tree::from_stored_object(obj) {
            Ok(tree) => tree,
            Err(e) => {
                self.report(Some(revision), ViolationKind::CorruptObject, e.to_string());
                return;
            }
        };
        for entry in tree.entries {
            match entry.mode {
                EntryMode::Directory => self.check_tree(revision, entry.object_id),
                EntryMode::Regular => {
                    if self.seen.insert(entry.object_id) {
                        self.fetch(revision, entry.object_id, ObjectKind::Blob);
                    }
                }
            }
        }
    }
}
