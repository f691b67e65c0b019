//! In-memory reference store for testing and ephemeral use.

use std::sync::RwLock;

use gitdb_types::RevisionId;

use crate::error::{RefError, Result};
use crate::traits::RefStore;

/// An in-memory implementation of [`RefStore`]. Data is lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    head: RwLock<Option<RevisionId>>,
}

impl InMemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn head(&self) -> Result<Option<RevisionId>> {
        let head = self.head.read().map_err(|_| RefError::Poisoned)?;
        Ok(*head)
    }

    fn update_head(&self, expected: Option<RevisionId>, new: RevisionId) -> Result<()> {
        let mut head = self.head.write().map_err(|_| RefError::Poisoned)?;
        if *head != expected {
            return Err(RefError::HeadMoved {
                expected,
                actual: *head,
            });
        }
        *head = Some(new);
        Ok(())
    }
}
