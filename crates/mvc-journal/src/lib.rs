//! Write-ahead journal for the materialized-view cache.
//!
//! Every committed engine transaction (a patch batch, a forced overwrite, a
//! prune, a resync) is appended here as one framed record before it touches
//! the in-memory tables. Replaying the journal front-to-back on startup
//! rebuilds the exact table state.

pub mod error;
pub mod journal;
pub mod mutation;

pub use error::{JournalError, JournalResult};
pub use journal::{Journal, JournalConfig, SyncMode};
pub use mutation::{Mutation, Transaction};
