use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::object::ObjectId;

/// Identifier of one committed revision.
///
/// A revision id is the object id of the revision's commit object, so it is
/// derived from the snapshot tree, the parent link, the signature, and the
/// message. Kept as a distinct type so that blob and tree ids cannot be
/// passed where a revision is expected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(ObjectId);

impl RevisionId {
    pub const fn new(id: ObjectId) -> Self {
        Self(id)
    }

    /// The underlying commit object id.
    pub fn object_id(&self) -> ObjectId {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn short_hex(&self) -> String {
        self.0.short_hex()
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        ObjectId::from_hex(s).map(Self)
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({})", self.short_hex())
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RevisionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<ObjectId> for RevisionId {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}
