use std::collections::{BTreeMap, BTreeSet};

use mvc_types::{AtomKey, AtomVersion, Checksum, IndexChecksum};
use serde::{Deserialize, Serialize};

use crate::error::IndexResult;
use crate::overlay::Overlay;

/// One row of `index_membership(index_checksum, kind, args, checksum)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MembershipRow {
    pub index_checksum: IndexChecksum,
    pub key: AtomKey,
    pub checksum: Checksum,
}

impl MembershipRow {
    pub fn version(&self) -> AtomVersion {
        self.key.at(self.checksum.clone())
    }
}

/// Outcome of [`IndexTable::materialize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Materialized {
    /// The target snapshot was built with this many membership rows.
    Created { rows: usize },
    /// The target snapshot already existed; nothing was written.
    AlreadyPresent,
}

/// Storage for the snapshot membership relation.
///
/// Invariants every implementation upholds:
/// - A snapshot holds at most one row per logical slot.
/// - A materialized snapshot is complete: absence of a slot means the
///   object is not present in that snapshot.
/// - Materializing an already-materialized target is a no-op, so duplicate
///   delivery of the same batch cannot corrupt a snapshot.
pub trait IndexTable: Send + Sync {
    /// Returns `true` if `index` has been materialized (possibly empty).
    fn is_materialized(&self, index: &IndexChecksum) -> IndexResult<bool>;

    /// The slot → version map of one snapshot. Empty if unknown.
    fn membership(&self, index: &IndexChecksum) -> IndexResult<BTreeMap<AtomKey, Checksum>>;

    /// The version a slot resolves to in one snapshot.
    fn resolve(&self, index: &IndexChecksum, key: &AtomKey) -> IndexResult<Option<Checksum>>;

    /// Build `target` by copying `source`'s rows (if any) and applying
    /// `overlay`.
    ///
    /// Fails with [`crate::IndexError::SnapshotNotFound`] if `source` is
    /// given but not materialized.
    fn materialize(
        &self,
        source: Option<&IndexChecksum>,
        target: &IndexChecksum,
        overlay: &Overlay,
    ) -> IndexResult<Materialized>;

    /// Delete every membership row of `index`. Returns the rows removed.
    fn drop_snapshot(&self, index: &IndexChecksum) -> IndexResult<usize>;

    /// All materialized snapshot checksums, sorted.
    fn snapshots(&self) -> IndexResult<Vec<IndexChecksum>>;

    /// Every atom version referenced by at least one membership row of the
    /// snapshots in `within`. Snapshots that are not materialized are skipped.
    fn referenced_versions(
        &self,
        within: &BTreeSet<IndexChecksum>,
    ) -> IndexResult<BTreeSet<AtomVersion>>;

    /// Membership rows of one snapshot, or of all snapshots if `None`.
    fn rows(&self, index: Option<&IndexChecksum>) -> IndexResult<Vec<MembershipRow>>;

    /// Number of membership rows in one snapshot, or in all if `None`.
    fn row_count(&self, index: Option<&IndexChecksum>) -> IndexResult<usize>;

    /// Remove every snapshot.
    fn clear(&self) -> IndexResult<()>;
}
