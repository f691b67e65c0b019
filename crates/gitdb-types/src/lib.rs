//! Foundation types for gitdb.
//!
//! Every other gitdb crate depends on `gitdb-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash) of a stored object
//! - [`RevisionId`] -- Identifier of one committed revision in a store's history
//! - [`Signature`] -- Author identity and wall-clock time stamped on a revision

pub mod error;
pub mod object;
pub mod revision;
pub mod signature;

pub use error::TypeError;
pub use object::ObjectId;
pub use revision::RevisionId;
pub use signature::Signature;
