use std::fmt;

use serde::{Deserialize, Serialize};

/// The sentinel value the upstream protocol uses for "no version".
///
/// As a `fromChecksum` it marks an added object, as a `toChecksum` a
/// deleted one. As a `fromIndexChecksum` it marks a branch starting from
/// the empty snapshot.
pub const SENTINEL: &str = "0";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an upstream-supplied identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The raw identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a workspace. Branches are scoped to one workspace.
    WorkspaceId
);

string_id!(
    /// Identifier of a change set (branch) within a workspace.
    ChangeSetId
);

string_id!(
    /// Content hash identifying one version of a logical object.
    ///
    /// Treated as an opaque, collision-free identifier supplied upstream.
    Checksum
);

string_id!(
    /// Content identifier of a snapshot (an "index").
    IndexChecksum
);

impl Checksum {
    /// The `"0"` sentinel checksum.
    pub fn sentinel() -> Self {
        Self(SENTINEL.to_string())
    }

    /// Returns `true` if this is the `"0"` sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL
    }
}

impl IndexChecksum {
    /// The `"0"` sentinel, meaning "no parent snapshot".
    pub fn sentinel() -> Self {
        Self(SENTINEL.to_string())
    }

    /// Returns `true` if this is the `"0"` sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL
    }
}
