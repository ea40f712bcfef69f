use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid atom reference {0:?}: expected kind:args:checksum")]
    InvalidAtomRef(String),
}
