//! JSON-Patch application.

use json_patch::PatchOperation;
use mvc_types::AtomKey;
use serde_json::Value;

use crate::error::{PatchError, PatchResult};

/// Apply `ops` in order to a copy of `base`.
///
/// The result is all-or-nothing: if any operation's precondition fails,
/// `base` is untouched and an [`PatchError::Apply`] names the slot.
pub fn apply_ops(key: &AtomKey, base: &Value, ops: &[PatchOperation]) -> PatchResult<Value> {
    let mut document = base.clone();
    json_patch::patch(&mut document, ops).map_err(|e| PatchError::Apply {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    Ok(document)
}
