//! Batch planning: turn a [`PatchBatch`] into staged atoms and an overlay.
//!
//! Planning reads the atom store but never writes to it. The caller commits
//! the plan as one transaction, so a batch that fails to plan leaves no
//! trace.

use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use mvc_codec::DocumentCodec;
use mvc_index::Overlay;
use mvc_store::{Atom, AtomStore, StoreError};
use mvc_types::{AtomKey, AtomVersion};
use serde_json::Value;
use tracing::debug;

use crate::apply::apply_ops;
use crate::classify::PatchClass;
use crate::error::{PatchError, PatchResult};
use crate::message::{AtomMessage, PatchBatch};

/// Everything a batch will write, computed up front.
#[derive(Clone, Debug, Default)]
pub struct BatchPlan {
    /// New atom versions to insert, one per distinct version.
    pub atoms: Vec<Atom>,
    /// Per-slot changes to apply on top of the parent snapshot.
    pub overlay: Overlay,
    /// Slots touched by the batch, in first-seen order.
    pub touched: Vec<AtomKey>,
}

/// Plan every patch of `batch` against `store`.
///
/// Modify patches read their base version from atoms staged earlier in the
/// same batch first, then from the store. A base found in neither is a
/// [`PatchError::MissingBaseAtom`], unless the target version is already
/// held, in which case the stored target is used as-is.
///
/// A target version that already exists is recomputed whenever its base is
/// available and must encode to the stored bytes; a mismatch fails the
/// batch with an integrity violation.
pub fn plan_batch(
    batch: &PatchBatch,
    store: &dyn AtomStore,
    codec: &dyn DocumentCodec,
) -> PatchResult<BatchPlan> {
    let mut staged: BTreeMap<AtomVersion, Bytes> = BTreeMap::new();
    let mut overlay = Overlay::new();
    let mut touched = Vec::new();
    let mut seen = BTreeSet::new();

    for patch in &batch.patches {
        let class = patch.classify()?;
        let key = patch.key();
        if seen.insert(key.clone()) {
            touched.push(key.clone());
        }

        if class == PatchClass::Delete {
            overlay.set_tombstone(key);
            continue;
        }

        let target = patch.to_version();
        let base = match class {
            PatchClass::Add => Some(Value::Null),
            _ => {
                let from = patch.from_version();
                match staged.get(&from) {
                    Some(bytes) => Some(codec.decode(bytes)?),
                    None => store.get(&from)?.map(|b| codec.decode(&b)).transpose()?,
                }
            }
        };
        let Some(base) = base else {
            if staged.contains_key(&target) || store.contains(&target)? {
                debug!(%target, "base not held; using stored target");
                overlay.set_live(key, target.checksum);
                continue;
            }
            return Err(PatchError::MissingBaseAtom(patch.from_version()));
        };

        let document = apply_ops(&key, &base, &patch.patch)?;
        let atom = Atom::new(target.clone(), codec.encode(&document)?);
        match staged.get(&target) {
            Some(earlier) if *earlier != atom.data => {
                return Err(StoreError::IntegrityViolation {
                    version: target,
                    stored_len: earlier.len(),
                    offered_len: atom.data.len(),
                }
                .into());
            }
            Some(_) => {}
            None => {
                if !store.verify(&atom)? {
                    debug!(%target, ?class, ops = patch.patch.len(), "atom staged");
                    staged.insert(target.clone(), atom.data);
                }
            }
        }
        overlay.set_live(key, target.checksum);
    }

    Ok(BatchPlan {
        atoms: staged
            .into_iter()
            .map(|(version, data)| Atom::new(version, data))
            .collect(),
        overlay,
        touched,
    })
}

/// Plan a forced overwrite: encode the full document and point its slot at
/// the new version. No base version is read.
pub fn plan_overwrite(msg: &AtomMessage, codec: &dyn DocumentCodec) -> PatchResult<BatchPlan> {
    let key = msg.atom.key();
    if key.kind.is_empty() || key.kind.contains(':') || key.args.is_empty() {
        return Err(PatchError::InvalidPatch {
            key,
            reason: "kind and id must be non-empty and kind free of ':'".into(),
        });
    }
    if msg.atom.to_checksum.is_sentinel() {
        return Err(PatchError::InvalidPatch {
            key,
            reason: "forced overwrite cannot target the sentinel checksum".into(),
        });
    }

    let encoded = codec.encode(&msg.data)?;
    let mut overlay = Overlay::new();
    overlay.set_live(key.clone(), msg.atom.to_checksum.clone());

    Ok(BatchPlan {
        atoms: vec![Atom::new(msg.atom.version(), encoded)],
        overlay,
        touched: vec![key],
    })
}
