use gitdb_types::ObjectId;

use crate::hasher::ContentHasher;

/// One link in a parent-chained history.
pub trait ChainLink {
    /// The id this link was stored under.
    fn link_id(&self) -> ObjectId;
    /// The previous link's id (None for the first revision).
    fn parent_id(&self) -> Option<ObjectId>;
    /// Canonical bytes the id was computed from.
    fn payload_bytes(&self) -> Vec<u8>;
}

/// Verifies a linear revision chain.
///
/// Links are given oldest first. Checks that:
/// 1. the first link has no parent,
/// 2. every later link names its predecessor as parent,
/// 3. every id is the commit-domain hash of its payload.
pub struct RevisionChainVerifier;

impl RevisionChainVerifier {
    pub fn verify_chain(links: &[impl ChainLink]) -> Result<(), ChainError> {
        let Some(first) = links.first() else {
            return Ok(());
        };
        if first.parent_id().is_some() {
            return Err(ChainError::RootHasParent);
        }

        for (index, link) in links.iter().enumerate() {
            if index > 0 {
                let expected = links[index - 1].link_id();
                match link.parent_id() {
                    Some(parent) if parent == expected => {}
                    Some(_) => return Err(ChainError::BrokenLink { index }),
                    None => return Err(ChainError::MissingParent { index }),
                }
            }
            if !ContentHasher::COMMIT.verify(&link.payload_bytes(), &link.link_id()) {
                return Err(ChainError::HashMismatch { index });
            }
        }

        Ok(())
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first revision has a parent")]
    RootHasParent,

    #[error("broken link at index {index}: parent does not match previous revision")]
    BrokenLink { index: usize },

    #[error("missing parent at index {index}")]
    MissingParent { index: usize },

    #[error("hash mismatch at index {index}: stored id differs from content hash")]
    HashMismatch { index: usize },
}
