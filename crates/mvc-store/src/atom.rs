use bytes::Bytes;
use mvc_types::{AtomKey, AtomVersion, Checksum};
use serde::{Deserialize, Serialize};

/// One stored atom: a version identity plus its encoded payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub version: AtomVersion,
    pub data: Bytes,
}

impl Atom {
    pub fn new(version: AtomVersion, data: impl Into<Bytes>) -> Self {
        Self {
            version,
            data: data.into(),
        }
    }

    pub fn key(&self) -> &AtomKey {
        &self.version.key
    }

    pub fn checksum(&self) -> &Checksum {
        &self.version.checksum
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
