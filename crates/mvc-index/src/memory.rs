//! In-memory membership relation.
//!
//! Snapshots are stored as `BTreeMap<IndexChecksum, BTreeMap<AtomKey,
//! Checksum>>`. The outer key's presence is what "materialized" means, so an
//! empty snapshot is still distinguishable from an unknown one. The inner
//! map gives the one-row-per-slot invariant for free.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use mvc_types::{AtomKey, AtomVersion, Checksum, IndexChecksum};
use tracing::debug;

use crate::error::{IndexError, IndexResult};
use crate::overlay::Overlay;
use crate::traits::{IndexTable, Materialized, MembershipRow};

type Snapshots = BTreeMap<IndexChecksum, BTreeMap<AtomKey, Checksum>>;

/// `BTreeMap`-backed [`IndexTable`].
#[derive(Default)]
pub struct InMemoryIndexTable {
    snapshots: RwLock<Snapshots>,
}

impl InMemoryIndexTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> IndexResult<RwLockReadGuard<'_, Snapshots>> {
        self.snapshots
            .read()
            .map_err(|e| IndexError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> IndexResult<RwLockWriteGuard<'_, Snapshots>> {
        self.snapshots
            .write()
            .map_err(|e| IndexError::LockPoisoned(e.to_string()))
    }
}

impl std::fmt::Debug for InMemoryIndexTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.snapshots.read().map(|s| s.len()).unwrap_or_default();
        f.debug_struct("InMemoryIndexTable")
            .field("snapshots", &count)
            .finish()
    }
}

impl IndexTable for InMemoryIndexTable {
    fn is_materialized(&self, index: &IndexChecksum) -> IndexResult<bool> {
        Ok(self.read()?.contains_key(index))
    }

    fn membership(&self, index: &IndexChecksum) -> IndexResult<BTreeMap<AtomKey, Checksum>> {
        Ok(self.read()?.get(index).cloned().unwrap_or_default())
    }

    fn resolve(&self, index: &IndexChecksum, key: &AtomKey) -> IndexResult<Option<Checksum>> {
        Ok(self
            .read()?
            .get(index)
            .and_then(|members| members.get(key))
            .cloned())
    }

    fn materialize(
        &self,
        source: Option<&IndexChecksum>,
        target: &IndexChecksum,
        overlay: &Overlay,
    ) -> IndexResult<Materialized> {
        let mut snapshots = self.write()?;
        if snapshots.contains_key(target) {
            debug!(%target, "snapshot already materialized");
            return Ok(Materialized::AlreadyPresent);
        }

        let mut members = match source {
            Some(source) => snapshots
                .get(source)
                .cloned()
                .ok_or_else(|| IndexError::SnapshotNotFound(source.clone()))?,
            None => BTreeMap::new(),
        };
        overlay.apply_to(&mut members);

        let rows = members.len();
        snapshots.insert(target.clone(), members);
        debug!(%target, source = ?source, rows, overlaid = overlay.len(), "snapshot materialized");
        Ok(Materialized::Created { rows })
    }

    fn drop_snapshot(&self, index: &IndexChecksum) -> IndexResult<usize> {
        Ok(self
            .write()?
            .remove(index)
            .map(|members| members.len())
            .unwrap_or(0))
    }

    fn snapshots(&self) -> IndexResult<Vec<IndexChecksum>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    fn referenced_versions(
        &self,
        within: &BTreeSet<IndexChecksum>,
    ) -> IndexResult<BTreeSet<AtomVersion>> {
        let snapshots = self.read()?;
        Ok(within
            .iter()
            .filter_map(|index| snapshots.get(index))
            .flat_map(|members| {
                members
                    .iter()
                    .map(|(key, checksum)| key.at(checksum.clone()))
            })
            .collect())
    }

    fn rows(&self, index: Option<&IndexChecksum>) -> IndexResult<Vec<MembershipRow>> {
        let snapshots = self.read()?;
        let to_rows = |(index, members): (&IndexChecksum, &BTreeMap<AtomKey, Checksum>)| {
            members
                .iter()
                .map(|(key, checksum)| MembershipRow {
                    index_checksum: index.clone(),
                    key: key.clone(),
                    checksum: checksum.clone(),
                })
                .collect::<Vec<_>>()
        };
        Ok(match index {
            Some(index) => snapshots
                .get_key_value(index)
                .map(to_rows)
                .unwrap_or_default(),
            None => snapshots.iter().flat_map(to_rows).collect(),
        })
    }

    fn row_count(&self, index: Option<&IndexChecksum>) -> IndexResult<usize> {
        let snapshots = self.read()?;
        Ok(match index {
            Some(index) => snapshots.get(index).map_or(0, BTreeMap::len),
            None => snapshots.values().map(BTreeMap::len).sum(),
        })
    }

    fn clear(&self) -> IndexResult<()> {
        self.write()?.clear();
        Ok(())
    }
}
