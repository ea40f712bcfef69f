use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use mvc_types::AtomVersion;
use tracing::debug;

use crate::atom::Atom;
use crate::error::{StoreError, StoreResult};
use crate::traits::AtomStore;

/// In-memory, `BTreeMap`-based atom store.
///
/// Rows are kept sorted by `(kind, args, checksum)`, so listings come out
/// ordered without an extra sort. Payloads are `Bytes`, so reads are cheap
/// reference-counted clones.
pub struct InMemoryAtomStore {
    atoms: RwLock<BTreeMap<AtomVersion, Bytes>>,
}

impl InMemoryAtomStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            atoms: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<AtomVersion, Bytes>>> {
        self.atoms
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, BTreeMap<AtomVersion, Bytes>>> {
        self.atoms
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryAtomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomStore for InMemoryAtomStore {
    fn get(&self, version: &AtomVersion) -> StoreResult<Option<Bytes>> {
        Ok(self.read()?.get(version).cloned())
    }

    fn put(&self, atom: &Atom) -> StoreResult<bool> {
        let mut map = self.write()?;
        if let Some(stored) = map.get(&atom.version) {
            if *stored != atom.data {
                return Err(StoreError::IntegrityViolation {
                    version: atom.version.clone(),
                    stored_len: stored.len(),
                    offered_len: atom.data.len(),
                });
            }
            return Ok(false);
        }
        debug!(atom = %atom.version, size = atom.size(), "atom inserted");
        map.insert(atom.version.clone(), atom.data.clone());
        Ok(true)
    }

    fn contains(&self, version: &AtomVersion) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(version))
    }

    fn delete(&self, version: &AtomVersion) -> StoreResult<bool> {
        Ok(self.write()?.remove(version).is_some())
    }

    fn versions(&self) -> StoreResult<Vec<AtomVersion>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn scan(&self) -> StoreResult<Vec<Atom>> {
        Ok(self
            .read()?
            .iter()
            .map(|(version, data)| Atom::new(version.clone(), data.clone()))
            .collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryAtomStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.atoms.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryAtomStore")
            .field("atom_count", &count)
            .finish()
    }
}
