//! Applying committed transactions to the three tables.
//!
//! The same routine serves live commits and journal replay, so a replayed
//! journal reproduces the live state exactly.

use mvc_index::IndexTable;
use mvc_journal::{Mutation, Transaction};
use mvc_refs::BranchTable;
use mvc_store::AtomStore;
use tracing::trace;

use crate::error::EngineResult;

/// Borrowed handles to the engine's tables.
#[derive(Clone, Copy)]
pub(crate) struct Tables<'a> {
    pub atoms: &'a dyn AtomStore,
    pub index: &'a dyn IndexTable,
    pub branches: &'a dyn BranchTable,
}

impl Tables<'_> {
    pub fn apply(&self, txn: &Transaction) -> EngineResult<()> {
        for mutation in &txn.mutations {
            self.apply_mutation(mutation)?;
        }
        trace!(seq = txn.seq, mutations = txn.len(), "transaction applied");
        Ok(())
    }

    fn apply_mutation(&self, mutation: &Mutation) -> EngineResult<()> {
        match mutation {
            Mutation::PutAtom(atom) => {
                self.atoms.put(atom)?;
            }
            Mutation::DeleteAtom(version) => {
                self.atoms.delete(version)?;
            }
            Mutation::Materialize {
                source,
                target,
                overlay,
            } => {
                self.index.materialize(source.as_ref(), target, overlay)?;
            }
            Mutation::DropSnapshot(index) => {
                self.index.drop_snapshot(index)?;
            }
            Mutation::AdvanceBranch {
                branch,
                index_checksum,
            } => {
                self.branches.advance(branch, index_checksum)?;
            }
            Mutation::RemoveBranch(branch) => {
                self.branches.remove(branch)?;
            }
            Mutation::Clear => {
                self.atoms.clear()?;
                self.index.clear()?;
                self.branches.clear()?;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.atoms.is_empty()? && self.index.snapshots()?.is_empty() && self.branches.is_empty()?)
    }
}
