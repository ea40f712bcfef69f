//! Synchronization engine for the materialized-view cache.
//!
//! The engine keeps a local, queryable replica of an upstream object graph
//! in sync by applying per-branch batches of JSON-Patch diffs. Every object
//! version is stored once (content-addressed), every snapshot is a complete
//! membership list built copy-on-write from its parent, and every branch is
//! a movable pointer to one snapshot. Closed branches are reclaimed by
//! mark-and-sweep from the remaining branch pointers.
//!
//! # Key Types
//!
//! - [`Engine`] -- Single-writer core: apply, overwrite, prune, resync, read
//! - [`EngineHandle`] -- FIFO actor around an engine on its own task
//! - [`CacheService`] -- Async command surface implemented by the handle
//! - [`EngineConfig`] -- Trunk id, codec, journal, queue depth, ordering
//! - [`InvalidationHook`] -- Outbound per-object invalidation callback
//! - [`DiagnosticQuery`] / [`QueryRows`] -- Raw diagnostic reads

mod commit;
pub mod config;
pub mod engine;
pub mod error;
pub mod handle;
pub mod hooks;
pub mod query;
pub mod report;
pub mod service;

#[cfg(test)]
mod scenarios;

pub use config::{CodecKind, EngineConfig};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use handle::EngineHandle;
pub use hooks::{BroadcastInvalidator, Invalidation, InvalidationHook, NoopInvalidator};
pub use query::{DiagnosticQuery, QueryRows};
pub use report::{ApplyOutcome, ApplyReport, EngineStats, PruneReport, ResyncReport};
pub use service::CacheService;

// Re-export the wire types hosts need to build commands.
pub use mvc_journal::{JournalConfig, SyncMode};
pub use mvc_patch::{AtomMessage, AtomMeta, BatchMeta, Message, ObjectPatch, PatchBatch};
pub use mvc_types::{BranchKey, ChangeSetId, Checksum, IndexChecksum, WorkspaceId};
