//! Logical redo records.

use mvc_index::Overlay;
use mvc_store::Atom;
use mvc_types::{AtomVersion, BranchKey, IndexChecksum};
use serde::{Deserialize, Serialize};

/// One change to one table. Replaying a transaction's mutations in order
/// reproduces its effect exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Insert an atom if absent.
    PutAtom(Atom),
    /// Remove an atom row.
    DeleteAtom(AtomVersion),
    /// Copy-on-write a snapshot from `source` (or nothing) plus `overlay`.
    Materialize {
        source: Option<IndexChecksum>,
        target: IndexChecksum,
        overlay: Overlay,
    },
    /// Remove every membership row of a snapshot.
    DropSnapshot(IndexChecksum),
    /// Upsert a branch pointer.
    AdvanceBranch {
        branch: BranchKey,
        index_checksum: IndexChecksum,
    },
    /// Remove a branch pointer.
    RemoveBranch(BranchKey),
    /// Empty all three tables.
    Clear,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PutAtom(_) => "put_atom",
            Self::DeleteAtom(_) => "delete_atom",
            Self::Materialize { .. } => "materialize",
            Self::DropSnapshot(_) => "drop_snapshot",
            Self::AdvanceBranch { .. } => "advance_branch",
            Self::RemoveBranch(_) => "remove_branch",
            Self::Clear => "clear",
        }
    }
}

/// The unit of atomicity: all of a command's mutations, committed as one
/// journal frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Monotonic sequence number assigned by the engine.
    pub seq: u64,
    pub mutations: Vec<Mutation>,
}

impl Transaction {
    pub fn new(seq: u64) -> Self {
        Self {
            seq,
            mutations: Vec::new(),
        }
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }
}
