//! Error types for branch pointer operations.

use thiserror::Error;

/// Errors that can occur during branch pointer operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// A workspace or change set id failed validation.
    #[error("invalid {what} id {id:?}: {reason}")]
    InvalidId {
        what: &'static str,
        id: String,
        reason: String,
    },

    /// A lock guarding the table was poisoned by a panicking writer.
    #[error("branch table lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
