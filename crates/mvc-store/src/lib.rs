//! Content-addressed atom storage for the materialized-view cache.
//!
//! The atom store is the durable table `atoms(kind, args, checksum, data)`,
//! unique on `(kind, args, checksum)`. Every version of every logical
//! object the cache has ever seen lives here until the reclaimer sweeps it.
//!
//! # Design Rules
//!
//! 1. Atoms are immutable once written. "Updating" an object inserts a new
//!    version; the old row stays until garbage collected.
//! 2. Re-inserting an existing version with identical bytes is a no-op.
//! 3. Re-inserting an existing version with different bytes is an
//!    integrity violation and is never silently ignored.
//! 4. The store never interprets payloads; decoding belongs to the codec.
//! 5. Deletion is reserved for the reclaimer.
//!
//! # Storage Backends
//!
//! All backends implement the [`AtomStore`] trait:
//!
//! - [`InMemoryAtomStore`] -- `BTreeMap`-based store; durability is layered
//!   on top by the engine's journal

pub mod atom;
pub mod error;
pub mod memory;
pub mod traits;

pub use atom::Atom;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryAtomStore;
pub use traits::AtomStore;
