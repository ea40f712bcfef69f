use mvc_types::AtomVersion;

/// Errors from atom store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The same `(kind, args, checksum)` was written with different bytes.
    #[error("integrity violation for {version}: stored {stored_len} bytes, offered {offered_len} different bytes")]
    IntegrityViolation {
        version: AtomVersion,
        stored_len: usize,
        offered_len: usize,
    },

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
