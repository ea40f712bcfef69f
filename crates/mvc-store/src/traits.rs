use bytes::Bytes;
use mvc_types::AtomVersion;

use crate::atom::Atom;
use crate::error::{StoreError, StoreResult};

/// Content-addressed atom store.
///
/// All implementations must satisfy these invariants:
/// - `(kind, args, checksum)` uniquely determines the stored bytes.
/// - Writing an identical atom twice is idempotent.
/// - Writing a known version with different bytes fails with
///   [`StoreError::IntegrityViolation`] and leaves the stored row intact.
/// - Listing operations return versions in sorted order.
pub trait AtomStore: Send + Sync {
    /// Read the payload of one atom version.
    ///
    /// Returns `Ok(None)` if the version does not exist.
    fn get(&self, version: &AtomVersion) -> StoreResult<Option<Bytes>>;

    /// Insert an atom if absent. Returns `true` if a new row was created.
    fn put(&self, atom: &Atom) -> StoreResult<bool>;

    /// Check whether an atom version exists.
    fn contains(&self, version: &AtomVersion) -> StoreResult<bool>;

    /// Delete an atom version. Returns `true` if it existed.
    ///
    /// Reserved for the reclaimer: deleting a version that is still a
    /// snapshot member corrupts that snapshot.
    fn delete(&self, version: &AtomVersion) -> StoreResult<bool>;

    /// All stored versions, sorted.
    fn versions(&self) -> StoreResult<Vec<AtomVersion>>;

    /// All stored atoms with payloads, sorted by version.
    fn scan(&self) -> StoreResult<Vec<Atom>>;

    /// Number of atom rows.
    fn len(&self) -> StoreResult<usize>;

    /// Remove every atom.
    fn clear(&self) -> StoreResult<()>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Check that `atom` could be inserted without violating integrity.
    ///
    /// Returns `true` if the exact atom is already present, `false` if it
    /// would be a new row.
    fn verify(&self, atom: &Atom) -> StoreResult<bool> {
        match self.get(&atom.version)? {
            Some(stored) if stored == atom.data => Ok(true),
            Some(stored) => Err(StoreError::IntegrityViolation {
                version: atom.version.clone(),
                stored_len: stored.len(),
                offered_len: atom.data.len(),
            }),
            None => Ok(false),
        }
    }
}
