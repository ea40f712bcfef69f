use std::io;

/// Errors produced by the journal.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// I/O error while reading or writing the journal file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A transaction could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A single transaction exceeds the frame size limit.
    #[error("transaction of {size} bytes exceeds the {max} byte frame limit")]
    FrameTooLarge { size: usize, max: usize },

    /// The writer mutex was poisoned by a panicking appender.
    #[error("journal lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Convenience alias used throughout the journal crate.
pub type JournalResult<T> = Result<T, JournalError>;
