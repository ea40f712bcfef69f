//! Result types returned by engine commands.

use mvc_types::{BranchKey, IndexChecksum};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a batch or forced overwrite was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// A new snapshot was materialized and the branch advanced.
    Applied,
    /// The target snapshot already existed; only the branch pointer moved.
    Replayed,
    /// The branch already resolved to the target; nothing changed.
    Duplicate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub branch: BranchKey,
    pub index_checksum: IndexChecksum,
    pub outcome: ApplyOutcome,
    /// New atom rows inserted.
    pub atoms_written: usize,
    /// Objects whose value changed, and were invalidated.
    pub touched: usize,
    /// Snapshot dropped because the branch moved off it and nothing else
    /// pointed at it.
    pub superseded: Option<IndexChecksum>,
}

impl ApplyReport {
    pub(crate) fn duplicate(branch: BranchKey, index_checksum: IndexChecksum) -> Self {
        Self {
            branch,
            index_checksum,
            outcome: ApplyOutcome::Duplicate,
            atoms_written: 0,
            touched: 0,
            superseded: None,
        }
    }
}

/// Rows removed by a reclamation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    pub branches_removed: usize,
    pub snapshots_dropped: usize,
    pub atoms_swept: usize,
}

impl PruneReport {
    pub fn is_noop(&self) -> bool {
        self.branches_removed == 0 && self.snapshots_dropped == 0 && self.atoms_swept == 0
    }
}

/// Result of a full resync. Never an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncReport {
    pub reclaimed: PruneReport,
    /// The journal was emptied because no state remained.
    pub journal_truncated: bool,
    /// Teardown failed and the engine fell back to an empty state.
    pub degraded: bool,
    /// Local state was discarded; the host must re-request a complete
    /// snapshot before sending further batches for this scope.
    pub resync_required: bool,
}

impl ResyncReport {
    /// A resync that could not be carried out cleanly. The host must
    /// assume nothing survived.
    pub fn degraded(journal_truncated: bool) -> Self {
        Self {
            journal_truncated,
            degraded: true,
            resync_required: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub instance_id: Uuid,
    pub atoms: usize,
    pub snapshots: usize,
    pub membership_rows: usize,
    pub branches: usize,
    /// Last committed transaction sequence number.
    pub last_seq: u64,
    /// Size of the journal file, if one is configured.
    pub journal_bytes: Option<u64>,
}
