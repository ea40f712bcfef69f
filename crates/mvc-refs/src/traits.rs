//! The [`BranchTable`] trait defining the branch pointer storage interface.

use mvc_types::{BranchKey, IndexChecksum, WorkspaceId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of `branch_pointer(workspace_id, change_set_id, index_checksum)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchPointer {
    pub branch: BranchKey,
    pub index_checksum: IndexChecksum,
}

/// Storage backend for branch pointers.
///
/// Implementations must be thread-safe (`Send + Sync`). Each branch has at
/// most one pointer; writing a pointer replaces the previous one.
pub trait BranchTable: Send + Sync {
    /// The snapshot a branch currently points at, if any.
    fn resolve(&self, branch: &BranchKey) -> Result<Option<IndexChecksum>>;

    /// Point `branch` at `index`, creating the branch if needed.
    ///
    /// Returns the previous pointer.
    fn advance(&self, branch: &BranchKey, index: &IndexChecksum) -> Result<Option<IndexChecksum>>;

    /// Remove a branch pointer. Returns the snapshot it pointed at.
    fn remove(&self, branch: &BranchKey) -> Result<Option<IndexChecksum>>;

    /// All pointers, optionally restricted to one workspace, sorted by branch.
    fn list(&self, workspace: Option<&WorkspaceId>) -> Result<Vec<BranchPointer>>;

    /// Branches currently pointing at `index`.
    fn pointing_at(&self, index: &IndexChecksum) -> Result<Vec<BranchKey>>;

    /// Remove every pointer.
    fn clear(&self) -> Result<()>;

    /// Number of branches.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns `true` if any branch other than `except` points at `index`.
    fn is_shared(&self, index: &IndexChecksum, except: &BranchKey) -> Result<bool> {
        Ok(self.pointing_at(index)?.iter().any(|b| b != except))
    }
}
