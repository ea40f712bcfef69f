//! Wire shapes of the inbound message stream.
//!
//! Field names follow the upstream JSON (camelCase). The two message kinds
//! share one stream and are told apart by the top-level `kind` tag, which
//! is dispatched once into [`Message`].

use json_patch::PatchOperation;
use mvc_types::{AtomKey, AtomVersion, BranchKey, ChangeSetId, Checksum, IndexChecksum, WorkspaceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every message the cache accepts from the patch stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    /// An incremental batch of per-object diffs.
    #[serde(rename = "patch", alias = "PatchMessage")]
    Patch(PatchBatch),
    /// A forced overwrite of one atom.
    #[serde(rename = "mjolnir")]
    Mjolnir(AtomMessage),
}

impl Message {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Patch(_) => "patch",
            Self::Mjolnir(_) => "mjolnir",
        }
    }

    /// The branch this message moves.
    pub fn branch(&self) -> BranchKey {
        match self {
            Self::Patch(batch) => batch.meta.branch(),
            Self::Mjolnir(msg) => msg.atom.branch(),
        }
    }
}

impl From<PatchBatch> for Message {
    fn from(batch: PatchBatch) -> Self {
        Self::Patch(batch)
    }
}

impl From<AtomMessage> for Message {
    fn from(msg: AtomMessage) -> Self {
        Self::Mjolnir(msg)
    }
}

/// Which branch moves, and between which snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMeta {
    pub workspace_id: WorkspaceId,
    pub change_set_id: ChangeSetId,
    pub from_index_checksum: IndexChecksum,
    pub to_index_checksum: IndexChecksum,
}

impl BatchMeta {
    pub fn branch(&self) -> BranchKey {
        BranchKey {
            workspace_id: self.workspace_id.clone(),
            change_set_id: self.change_set_id.clone(),
        }
    }
}

/// An ordered set of per-object diffs moving one branch to its next
/// snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchBatch {
    pub meta: BatchMeta,
    #[serde(default)]
    pub patches: Vec<ObjectPatch>,
}

/// A JSON-Patch diff of one logical object between two versions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPatch {
    pub kind: String,
    pub id: String,
    pub from_checksum: Checksum,
    pub to_checksum: Checksum,
    #[serde(default)]
    pub patch: Vec<PatchOperation>,
}

impl ObjectPatch {
    pub fn key(&self) -> AtomKey {
        AtomKey::new(self.kind.clone(), self.id.clone())
    }

    pub fn from_version(&self) -> AtomVersion {
        self.key().at(self.from_checksum.clone())
    }

    pub fn to_version(&self) -> AtomVersion {
        self.key().at(self.to_checksum.clone())
    }
}

/// Addressing of a forced overwrite.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomMeta {
    pub id: String,
    pub kind: String,
    pub to_checksum: Checksum,
    pub workspace_id: WorkspaceId,
    pub change_set_id: ChangeSetId,
    pub from_index_checksum: IndexChecksum,
    pub to_index_checksum: IndexChecksum,
}

impl AtomMeta {
    pub fn branch(&self) -> BranchKey {
        BranchKey {
            workspace_id: self.workspace_id.clone(),
            change_set_id: self.change_set_id.clone(),
        }
    }

    pub fn key(&self) -> AtomKey {
        AtomKey::new(self.kind.clone(), self.id.clone())
    }

    pub fn version(&self) -> AtomVersion {
        self.key().at(self.to_checksum.clone())
    }
}

/// A full document replacing one atom, with no base version required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtomMessage {
    pub atom: AtomMeta,
    pub data: Value,
}
