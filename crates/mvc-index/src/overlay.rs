//! Per-slot changes applied on top of a parent snapshot.

use std::collections::BTreeMap;

use mvc_types::{AtomKey, Checksum};
use serde::{Deserialize, Serialize};

/// What a snapshot should hold for one logical slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayEntry {
    /// The slot resolves to this atom version.
    Live(Checksum),
    /// The slot is absent (the object was deleted).
    Tombstone,
}

/// An ordered map from logical slot to its new state.
///
/// Setting the same slot twice keeps the last value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay {
    entries: BTreeMap<AtomKey, OverlayEntry>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at `checksum`. Returns the previous entry for the slot.
    pub fn set_live(&mut self, key: AtomKey, checksum: Checksum) -> Option<OverlayEntry> {
        self.entries.insert(key, OverlayEntry::Live(checksum))
    }

    /// Mark `key` as deleted. Returns the previous entry for the slot.
    pub fn set_tombstone(&mut self, key: AtomKey) -> Option<OverlayEntry> {
        self.entries.insert(key, OverlayEntry::Tombstone)
    }

    pub fn get(&self, key: &AtomKey) -> Option<&OverlayEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AtomKey, &OverlayEntry)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AtomKey> {
        self.entries.keys()
    }

    /// Number of tombstones.
    pub fn deletions(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, OverlayEntry::Tombstone))
            .count()
    }

    /// Apply this overlay to a membership map in place.
    ///
    /// Any existing row for an overlaid slot is replaced; tombstones leave
    /// the slot empty.
    pub fn apply_to(&self, members: &mut BTreeMap<AtomKey, Checksum>) {
        for (key, entry) in &self.entries {
            members.remove(key);
            if let OverlayEntry::Live(checksum) = entry {
                members.insert(key.clone(), checksum.clone());
            }
        }
    }
}

impl FromIterator<(AtomKey, OverlayEntry)> for Overlay {
    fn from_iter<T: IntoIterator<Item = (AtomKey, OverlayEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
