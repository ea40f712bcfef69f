//! Error types for the index crate.

use mvc_types::IndexChecksum;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The source snapshot of a copy-on-write is not materialized.
    #[error("snapshot not materialized: {0}")]
    SnapshotNotFound(IndexChecksum),

    /// A lock guarding the table was poisoned by a panicking writer.
    #[error("index lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
