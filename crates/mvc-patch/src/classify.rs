//! Sentinel-based classification of object patches.

use crate::error::{PatchError, PatchResult};
use crate::message::ObjectPatch;

/// What an [`ObjectPatch`] does to its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchClass {
    /// `fromChecksum == "0"`: the object is new in this snapshot.
    Add,
    /// Neither checksum is the sentinel: the object changed.
    Modify,
    /// `toChecksum == "0"`: the object is gone from this snapshot.
    Delete,
}

impl ObjectPatch {
    /// Classify by checksum sentinels, rejecting malformed patches.
    pub fn classify(&self) -> PatchResult<PatchClass> {
        let invalid = |reason: &str| PatchError::InvalidPatch {
            key: self.key(),
            reason: reason.to_string(),
        };

        if self.kind.is_empty() || self.kind.contains(':') {
            return Err(invalid("kind must be non-empty and free of ':'"));
        }
        if self.id.is_empty() {
            return Err(invalid("id must be non-empty"));
        }

        match (self.from_checksum.is_sentinel(), self.to_checksum.is_sentinel()) {
            (true, true) => Err(invalid("both checksums are the sentinel")),
            (true, false) => Ok(PatchClass::Add),
            (false, true) => Ok(PatchClass::Delete),
            (false, false) => Ok(PatchClass::Modify),
        }
    }
}
