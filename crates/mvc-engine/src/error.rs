use mvc_types::{AtomKey, AtomVersion, BranchKey, IndexChecksum};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] mvc_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] mvc_index::IndexError),

    #[error("ref error: {0}")]
    Ref(#[from] mvc_refs::RefError),

    #[error("codec error: {0}")]
    Codec(#[from] mvc_codec::CodecError),

    #[error("journal error: {0}")]
    Journal(#[from] mvc_journal::JournalError),

    #[error("patch error: {0}")]
    Patch(mvc_patch::PatchError),

    /// A Modify patch's base version is not held locally.
    #[error("base atom missing: {version}; forced overwrite or full resync required")]
    MissingBaseAtom { version: AtomVersion },

    /// The batch does not continue from the branch's current snapshot.
    #[error("out-of-order batch for {branch}: branch is at {expected}, batch starts from {received}")]
    OutOfOrder {
        branch: BranchKey,
        expected: IndexChecksum,
        received: IndexChecksum,
    },

    /// A new branch was asked to fork from a snapshot that is not held locally.
    #[error("snapshot {index_checksum} is not materialized; cannot start {branch}")]
    UnknownSnapshot {
        branch: BranchKey,
        index_checksum: IndexChecksum,
    },

    /// A forced overwrite targets a snapshot another branch resolves to.
    #[error("snapshot {index_checksum} is shared with other branches; cannot overwrite it from {branch}")]
    SharedSnapshot {
        branch: BranchKey,
        index_checksum: IndexChecksum,
    },

    #[error("branch not found: {0}")]
    UnknownBranch(BranchKey),

    #[error("refusing to prune the trunk branch {0}")]
    TrunkBranch(BranchKey),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("{key} is not a list document")]
    NotAList { key: AtomKey },

    #[error("config error: {0}")]
    Config(String),

    #[error("engine command queue is closed")]
    QueueClosed,
}

impl EngineError {
    /// Returns `true` if local state has drifted from the patch stream and
    /// the host should fall back to a forced overwrite or a full resync
    /// rather than retry.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            Self::MissingBaseAtom { .. }
                | Self::OutOfOrder { .. }
                | Self::UnknownSnapshot { .. }
                | Self::SharedSnapshot { .. }
        )
    }

    /// Returns `true` for the same-key, different-bytes integrity error.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Self::Store(mvc_store::StoreError::IntegrityViolation { .. })
        )
    }
}

impl From<mvc_patch::PatchError> for EngineError {
    fn from(e: mvc_patch::PatchError) -> Self {
        use mvc_patch::PatchError;
        match e {
            PatchError::MissingBaseAtom(version) => Self::MissingBaseAtom { version },
            PatchError::Store(e) => Self::Store(e),
            PatchError::Codec(e) => Self::Codec(e),
            other => Self::Patch(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
