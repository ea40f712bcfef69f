//! Error types for the patch crate.

use mvc_types::{AtomKey, AtomVersion};

/// Errors that can occur while planning a batch.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The patch is malformed (both sentinels, empty key parts, ...).
    #[error("invalid patch for {key}: {reason}")]
    InvalidPatch { key: AtomKey, reason: String },

    /// A Modify patch names a base version this cache does not hold.
    #[error("base atom missing: {0}")]
    MissingBaseAtom(AtomVersion),

    /// A JSON-Patch operation's precondition failed.
    #[error("cannot apply patch to {key}: {reason}")]
    Apply { key: AtomKey, reason: String },

    /// Encoding or decoding a document failed.
    #[error("codec error: {0}")]
    Codec(#[from] mvc_codec::CodecError),

    /// Reading a base atom failed.
    #[error("store error: {0}")]
    Store(#[from] mvc_store::StoreError),
}

/// Convenience alias for patch results.
pub type PatchResult<T> = Result<T, PatchError>;
