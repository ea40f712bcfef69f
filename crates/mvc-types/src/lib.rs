//! Foundation types for the materialized-view cache (MVC).
//!
//! This crate provides the identifier and key types shared by every other
//! MVC crate. All identifiers are opaque strings supplied by the upstream
//! source of truth; the cache never derives them itself.
//!
//! # Key Types
//!
//! - [`WorkspaceId`] / [`ChangeSetId`] -- Branch coordinates
//! - [`Checksum`] -- Version identity of one atom (sentinel `"0"` = absent)
//! - [`IndexChecksum`] -- Identity of one snapshot (sentinel `"0"` = no parent)
//! - [`AtomKey`] -- Logical object slot `(kind, args)`
//! - [`AtomVersion`] -- One concrete atom `(kind, args, checksum)`
//! - [`AtomRef`] -- `kind:args:checksum` reference string used by list atoms
//! - [`BranchKey`] -- `(workspace_id, change_set_id)` pair

pub mod atom;
pub mod branch;
pub mod error;
pub mod id;

pub use atom::{AtomKey, AtomRef, AtomVersion};
pub use branch::BranchKey;
pub use error::TypeError;
pub use id::{ChangeSetId, Checksum, IndexChecksum, WorkspaceId, SENTINEL};
