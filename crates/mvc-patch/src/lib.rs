//! Patch protocol for the materialized-view cache.
//!
//! The upstream source of truth streams per-branch batches of per-object
//! JSON-Patch diffs. This crate owns their wire shape, classifies each diff
//! (add / modify / delete by checksum sentinels), applies JSON-Patch
//! operations, and plans a whole batch into staged atoms plus a snapshot
//! overlay without touching any table.
//!
//! # Key Types
//!
//! - [`Message`] -- Tagged union of the two inbound message kinds
//! - [`PatchBatch`] / [`BatchMeta`] / [`ObjectPatch`] -- Incremental diff batch
//! - [`AtomMessage`] / [`AtomMeta`] -- Forced single-atom overwrite
//! - [`PatchClass`] -- Add, Modify or Delete
//! - [`BatchPlan`] -- Staged atoms, overlay and touched slots of one batch

pub mod apply;
pub mod classify;
pub mod error;
pub mod message;
pub mod plan;

pub use apply::apply_ops;
pub use classify::PatchClass;
pub use error::{PatchError, PatchResult};
pub use message::{AtomMessage, AtomMeta, BatchMeta, Message, ObjectPatch, PatchBatch};
pub use plan::{plan_batch, plan_overwrite, BatchPlan};
