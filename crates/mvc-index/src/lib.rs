//! Snapshot index for the materialized-view cache.
//!
//! A snapshot ("index") is the complete set of atom versions live at one
//! revision, stored as the membership relation
//! `index_membership(index_checksum, kind, args, checksum)`. New snapshots
//! are produced by copy-on-write from a parent: the parent's rows are
//! duplicated under the new checksum and an [`Overlay`] is applied on top.
//!
//! # Key Types
//!
//! - [`IndexTable`] -- The storage interface for the membership relation
//! - [`InMemoryIndexTable`] -- `BTreeMap`-backed implementation
//! - [`Overlay`] / [`OverlayEntry`] -- Per-slot changes applied during materialization
//! - [`MembershipRow`] -- One row of the relation
//! - [`Materialized`] -- Outcome of a materialization (created or already present)

pub mod error;
pub mod memory;
pub mod overlay;
pub mod traits;

pub use error::{IndexError, IndexResult};
pub use memory::InMemoryIndexTable;
pub use overlay::{Overlay, OverlayEntry};
pub use traits::{IndexTable, Materialized, MembershipRow};
