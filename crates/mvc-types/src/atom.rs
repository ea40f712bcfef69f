//! Composite atom keys.
//!
//! An atom is addressed at two levels: the logical slot ([`AtomKey`],
//! `(kind, args)`) and one concrete version of it ([`AtomVersion`],
//! `(kind, args, checksum)`). List documents refer to other atoms by the
//! string form `kind:args:checksum` ([`AtomRef`]), which is resolved lazily
//! by lookup rather than held as an in-memory reference.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::Checksum;

/// A logical object slot: a record type and its instance id, or a list
/// type and its owning scope id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomKey {
    pub kind: String,
    pub args: String,
}

impl AtomKey {
    pub fn new(kind: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            args: args.into(),
        }
    }

    /// Pin this slot to a concrete version.
    pub fn at(&self, checksum: Checksum) -> AtomVersion {
        AtomVersion {
            key: self.clone(),
            checksum,
        }
    }
}

impl fmt::Display for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.args)
    }
}

/// One immutable, content-addressed version of a logical object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomVersion {
    pub key: AtomKey,
    pub checksum: Checksum,
}

impl AtomVersion {
    pub fn new(kind: impl Into<String>, args: impl Into<String>, checksum: impl Into<Checksum>) -> Self {
        Self {
            key: AtomKey::new(kind, args),
            checksum: checksum.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.key.kind
    }

    pub fn args(&self) -> &str {
        &self.key.args
    }
}

impl fmt::Display for AtomVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.checksum)
    }
}

/// A `kind:args:checksum` reference string as it appears inside list
/// documents.
///
/// `kind` may not contain `:`; `checksum` is everything after the last `:`;
/// `args` is whatever lies between (and may itself contain `:`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomRef(AtomVersion);

impl AtomRef {
    pub fn new(version: AtomVersion) -> Self {
        Self(version)
    }

    /// Parse a reference string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidAtomRef(s.to_string());
        let (kind, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (args, checksum) = rest.rsplit_once(':').ok_or_else(invalid)?;
        if kind.is_empty() || args.is_empty() || checksum.is_empty() {
            return Err(invalid());
        }
        Ok(Self(AtomVersion::new(kind, args, checksum)))
    }

    pub fn version(&self) -> &AtomVersion {
        &self.0
    }

    pub fn into_version(self) -> AtomVersion {
        self.0
    }
}

impl fmt::Display for AtomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for AtomRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
