//! Branch pointers for the materialized-view cache.
//!
//! A branch is identified by `(workspace_id, change_set_id)` and points at
//! exactly one materialized snapshot. Pointers are the entry points for
//! every lookup: a read names a branch, the branch names a snapshot, and the
//! snapshot's membership relation names the atoms.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`traits`] -- The [`BranchTable`] trait defining the storage interface
//! - [`names`] -- Workspace / change set id validation
//! - [`memory`] -- In-memory [`InMemoryBranchTable`]

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;

pub use error::{RefError, Result};
pub use memory::InMemoryBranchTable;
pub use names::{validate_branch_key, validate_id};
pub use traits::{BranchPointer, BranchTable};
