//! In-memory branch table.
//!
//! [`InMemoryBranchTable`] stores all pointers in a `BTreeMap` protected by
//! a `RwLock`, so listings come out ordered by `(workspace, change set)`.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use mvc_types::{BranchKey, IndexChecksum, WorkspaceId};
use tracing::debug;

use crate::error::{RefError, Result};
use crate::traits::{BranchPointer, BranchTable};

type Pointers = BTreeMap<BranchKey, IndexChecksum>;

/// An in-memory implementation of [`BranchTable`].
#[derive(Debug, Default)]
pub struct InMemoryBranchTable {
    pointers: RwLock<Pointers>,
}

impl InMemoryBranchTable {
    /// Create a new empty branch table.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Pointers>> {
        self.pointers
            .read()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Pointers>> {
        self.pointers
            .write()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }
}

impl BranchTable for InMemoryBranchTable {
    fn resolve(&self, branch: &BranchKey) -> Result<Option<IndexChecksum>> {
        Ok(self.read()?.get(branch).cloned())
    }

    fn advance(&self, branch: &BranchKey, index: &IndexChecksum) -> Result<Option<IndexChecksum>> {
        let previous = self.write()?.insert(branch.clone(), index.clone());
        debug!(%branch, to = %index, from = ?previous, "branch advanced");
        Ok(previous)
    }

    fn remove(&self, branch: &BranchKey) -> Result<Option<IndexChecksum>> {
        let removed = self.write()?.remove(branch);
        if removed.is_some() {
            debug!(%branch, "branch removed");
        }
        Ok(removed)
    }

    fn list(&self, workspace: Option<&WorkspaceId>) -> Result<Vec<BranchPointer>> {
        Ok(self
            .read()?
            .iter()
            .filter(|(branch, _)| workspace.map_or(true, |ws| branch.in_workspace(ws)))
            .map(|(branch, index)| BranchPointer {
                branch: branch.clone(),
                index_checksum: index.clone(),
            })
            .collect())
    }

    fn pointing_at(&self, index: &IndexChecksum) -> Result<Vec<BranchKey>> {
        Ok(self
            .read()?
            .iter()
            .filter(|(_, target)| *target == index)
            .map(|(branch, _)| branch.clone())
            .collect())
    }

    fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}
