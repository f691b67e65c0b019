//! Hashing primitives for gitdb.
//!
//! Provides domain-separated BLAKE3 hashing for the object model and a
//! verifier for the parent-linked chain of revisions.

pub mod chain;
pub mod hasher;

pub use chain::{ChainError, ChainLink, RevisionChainVerifier};
pub use hasher::ContentHasher;
