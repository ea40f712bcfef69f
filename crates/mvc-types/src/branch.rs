use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{ChangeSetId, WorkspaceId};

/// Coordinates of one branch: a change set inside a workspace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BranchKey {
    pub workspace_id: WorkspaceId,
    pub change_set_id: ChangeSetId,
}

impl BranchKey {
    pub fn new(workspace_id: impl Into<WorkspaceId>, change_set_id: impl Into<ChangeSetId>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            change_set_id: change_set_id.into(),
        }
    }

    /// Returns `true` if this branch belongs to `workspace_id`.
    pub fn in_workspace(&self, workspace_id: &WorkspaceId) -> bool {
        &self.workspace_id == workspace_id
    }
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace_id, self.change_set_id)
    }
}
