//! The synchronization engine.
//!
//! [`Engine`] owns exclusive handles to the three tables and is driven one
//! command at a time. Every mutating command follows the same shape: read
//! the tables and compute a complete [`Transaction`], append it to the
//! journal, then apply it. A command that fails before the append leaves
//! no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use mvc_codec::DocumentCodec;
use mvc_index::{InMemoryIndexTable, IndexTable, Overlay, OverlayEntry};
use mvc_journal::{Journal, Mutation, Transaction};
use mvc_patch::{plan_batch, plan_overwrite, AtomMessage, Message, PatchBatch};
use mvc_refs::{validate_branch_key, BranchTable, InMemoryBranchTable};
use mvc_store::{AtomStore, InMemoryAtomStore, StoreError};
use mvc_types::{AtomKey, AtomRef, AtomVersion, BranchKey, ChangeSetId, Checksum, IndexChecksum, WorkspaceId};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::commit::Tables;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::hooks::{InvalidationHook, NoopInvalidator};
use crate::query::{self, DiagnosticQuery, QueryRows};
use crate::report::{ApplyOutcome, ApplyReport, EngineStats, PruneReport, ResyncReport};

pub struct Engine {
    config: EngineConfig,
    instance_id: Uuid,
    atoms: Arc<dyn AtomStore>,
    index: Arc<dyn IndexTable>,
    branches: Arc<dyn BranchTable>,
    codec: Arc<dyn DocumentCodec>,
    hook: Arc<dyn InvalidationHook>,
    journal: Option<Journal>,
    seq: u64,
    initialized: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("instance_id", &self.instance_id)
            .field("codec", &self.codec.name())
            .field("journal", &self.journal)
            .field("seq", &self.seq)
            .finish()
    }
}

impl Engine {
    /// An engine over fresh in-memory tables.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_tables(
            config,
            Arc::new(InMemoryAtomStore::new()),
            Arc::new(InMemoryIndexTable::new()),
            Arc::new(InMemoryBranchTable::new()),
        )
    }

    /// An engine with default configuration and no journal.
    pub fn in_memory() -> EngineResult<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn with_tables(
        config: EngineConfig,
        atoms: Arc<dyn AtomStore>,
        index: Arc<dyn IndexTable>,
        branches: Arc<dyn BranchTable>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let journal = config.journal.as_ref().map(Journal::open).transpose()?;
        Ok(Self {
            codec: config.build_codec(),
            config,
            instance_id: Uuid::now_v7(),
            atoms,
            index,
            branches,
            hook: Arc::new(NoopInvalidator),
            journal,
            seq: 0,
            initialized: false,
        })
    }

    /// Build and [`initialize`](Self::initialize) in one step.
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        let mut engine = Self::new(config)?;
        engine.initialize()?;
        Ok(engine)
    }

    pub fn with_hook(mut self, hook: Arc<dyn InvalidationHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn codec(&self) -> &dyn DocumentCodec {
        self.codec.as_ref()
    }

    /// The trunk branch of `workspace_id`.
    pub fn trunk(&self, workspace_id: &WorkspaceId) -> BranchKey {
        BranchKey::new(workspace_id.clone(), self.config.trunk_change_set_id.clone())
    }

    fn tables(&self) -> Tables<'_> {
        Tables {
            atoms: self.atoms.as_ref(),
            index: self.index.as_ref(),
            branches: self.branches.as_ref(),
        }
    }

    // ---- Lifecycle ----

    /// Replay the journal, if any, into the tables. Returns the number of
    /// transactions replayed. Calling it again is a no-op.
    pub fn initialize(&mut self) -> EngineResult<usize> {
        if self.initialized {
            return Ok(0);
        }

        let mut replayed = 0;
        let mut last_seq = self.seq;
        if let Some(journal) = &self.journal {
            let tables = self.tables();
            for txn in journal.recover()? {
                match tables.apply(&txn) {
                    Ok(()) => {
                        replayed += 1;
                        last_seq = last_seq.max(txn.seq);
                    }
                    Err(e) => warn!(seq = txn.seq, error = %e, "journal transaction failed to replay; skipping"),
                }
            }
        }

        self.seq = last_seq;
        self.initialized = true;
        info!(
            instance_id = %self.instance_id,
            replayed,
            seq = self.seq,
            codec = self.codec.name(),
            "engine initialized"
        );
        Ok(replayed)
    }

    /// Journal and apply one transaction.
    fn commit(&mut self, mut txn: Transaction) -> EngineResult<u64> {
        if txn.is_empty() {
            return Ok(self.seq);
        }
        txn.seq = self.seq + 1;
        if let Some(journal) = &self.journal {
            journal.append(&txn)?;
        }
        self.tables().apply(&txn)?;
        self.seq = txn.seq;
        Ok(txn.seq)
    }

    fn notify(&self, branch: &BranchKey, touched: &[AtomKey]) {
        for key in touched {
            self.hook.on_cache_invalidate(
                &branch.workspace_id,
                &branch.change_set_id,
                &key.kind,
                &key.args,
            );
        }
    }

    /// Drop `previous` if `branch` is moving off it and no other branch
    /// points there.
    fn supersede(
        &self,
        txn: &mut Transaction,
        branch: &BranchKey,
        previous: Option<&IndexChecksum>,
        next: &IndexChecksum,
    ) -> EngineResult<Option<IndexChecksum>> {
        match previous {
            Some(prev) if prev != next && !self.branches.is_shared(prev, branch)? => {
                txn.push(Mutation::DropSnapshot(prev.clone()));
                Ok(Some(prev.clone()))
            }
            _ => Ok(None),
        }
    }

    // ---- Patch application ----

    /// Dispatch one inbound message.
    pub fn handle_message(&mut self, message: &Message) -> EngineResult<ApplyReport> {
        match message {
            Message::Patch(batch) => self.apply_patch_batch(batch),
            Message::Mjolnir(msg) => self.apply_forced_overwrite(msg),
        }
    }

    /// Apply a batch of per-object diffs as one transaction and advance the
    /// branch to `toIndexChecksum`.
    pub fn apply_patch_batch(&mut self, batch: &PatchBatch) -> EngineResult<ApplyReport> {
        let branch = batch.meta.branch();
        validate_branch_key(&branch)?;
        let from = &batch.meta.from_index_checksum;
        let to = &batch.meta.to_index_checksum;
        if to.is_sentinel() {
            return Err(EngineError::InvalidMessage(format!(
                "{branch}: toIndexChecksum may not be the sentinel"
            )));
        }

        let current = self.branches.resolve(&branch)?;
        if current.as_ref() == Some(to) {
            warn!(
                workspace_id = %branch.workspace_id,
                change_set_id = %branch.change_set_id,
                index_checksum = %to,
                "duplicate batch ignored"
            );
            return Ok(ApplyReport::duplicate(branch, to.clone()));
        }

        self.check_order(&branch, current.as_ref(), from)?;

        let mut txn = Transaction::default();
        let touched = batch_touched(batch);
        let (outcome, atoms_written) = if self.index.is_materialized(to)? {
            (ApplyOutcome::Replayed, 0)
        } else {
            let source = self.batch_source(&branch, from)?;
            let plan = plan_batch(batch, self.atoms.as_ref(), self.codec.as_ref())?;
            let written = plan.atoms.len();
            txn.mutations
                .extend(plan.atoms.into_iter().map(Mutation::PutAtom));
            txn.push(Mutation::Materialize {
                source,
                target: to.clone(),
                overlay: plan.overlay,
            });
            (ApplyOutcome::Applied, written)
        };
        txn.push(Mutation::AdvanceBranch {
            branch: branch.clone(),
            index_checksum: to.clone(),
        });
        let superseded = self.supersede(&mut txn, &branch, current.as_ref(), to)?;

        let seq = self.commit(txn)?;
        self.notify(&branch, &touched);
        info!(
            workspace_id = %branch.workspace_id,
            change_set_id = %branch.change_set_id,
            from = %from,
            to = %to,
            ?outcome,
            patches = batch.patches.len(),
            atoms_written,
            seq,
            "patch batch committed"
        );

        Ok(ApplyReport {
            branch,
            index_checksum: to.clone(),
            outcome,
            atoms_written,
            touched: touched.len(),
            superseded,
        })
    }

    /// Under strict ordering a batch must continue from the branch's current
    /// snapshot. A branch with no pointer accepts any starting point.
    fn check_order(
        &self,
        branch: &BranchKey,
        current: Option<&IndexChecksum>,
        from: &IndexChecksum,
    ) -> EngineResult<()> {
        match current {
            Some(current) if self.config.strict_ordering && current != from => {
                Err(EngineError::OutOfOrder {
                    branch: branch.clone(),
                    expected: current.clone(),
                    received: from.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// The snapshot a new materialization copies from.
    fn batch_source(
        &self,
        branch: &BranchKey,
        from: &IndexChecksum,
    ) -> EngineResult<Option<IndexChecksum>> {
        if from.is_sentinel() {
            return Ok(None);
        }
        if self.index.is_materialized(from)? {
            Ok(Some(from.clone()))
        } else {
            Err(EngineError::UnknownSnapshot {
                branch: branch.clone(),
                index_checksum: from.clone(),
            })
        }
    }

    /// Unconditionally replace one atom and re-point its slot in
    /// `toIndexChecksum`. Never reads a base version.
    pub fn apply_forced_overwrite(&mut self, msg: &AtomMessage) -> EngineResult<ApplyReport> {
        let branch = msg.atom.branch();
        validate_branch_key(&branch)?;
        let to = &msg.atom.to_index_checksum;
        if to.is_sentinel() {
            return Err(EngineError::InvalidMessage(format!(
                "{branch}: toIndexChecksum may not be the sentinel"
            )));
        }

        let plan = plan_overwrite(msg, self.codec.as_ref())?;
        let key = msg.atom.key();
        let current = self.branches.resolve(&branch)?;
        let mut txn = Transaction::default();

        let mut atoms_written = 0;
        for atom in plan.atoms {
            match self.atoms.verify(&atom) {
                Ok(true) => {}
                Ok(false) => {
                    txn.push(Mutation::PutAtom(atom));
                    atoms_written += 1;
                }
                Err(StoreError::IntegrityViolation { .. }) => {
                    warn!(version = %atom.version, "replacing atom whose stored bytes differ");
                    txn.push(Mutation::DeleteAtom(atom.version.clone()));
                    txn.push(Mutation::PutAtom(atom));
                    atoms_written += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if self.index.is_materialized(to)? {
            if self.index.resolve(to, &key)?.as_ref() != Some(&msg.atom.to_checksum) {
                // Other branches must keep seeing the snapshot they resolve to.
                if self.branches.is_shared(to, &branch)? {
                    return Err(EngineError::SharedSnapshot {
                        branch,
                        index_checksum: to.clone(),
                    });
                }
                // Rebuild the target in place with the slot re-pointed.
                let mut members = self.index.membership(to)?;
                plan.overlay.apply_to(&mut members);
                txn.push(Mutation::DropSnapshot(to.clone()));
                txn.push(Mutation::Materialize {
                    source: None,
                    target: to.clone(),
                    overlay: full_overlay(members),
                });
            }
        } else {
            let source = self.overwrite_source(&msg.atom.from_index_checksum, current.as_ref())?;
            txn.push(Mutation::Materialize {
                source,
                target: to.clone(),
                overlay: plan.overlay,
            });
        }

        if current.as_ref() != Some(to) {
            txn.push(Mutation::AdvanceBranch {
                branch: branch.clone(),
                index_checksum: to.clone(),
            });
        }
        let superseded = self.supersede(&mut txn, &branch, current.as_ref(), to)?;

        let seq = self.commit(txn)?;
        self.notify(&branch, &plan.touched);
        info!(
            workspace_id = %branch.workspace_id,
            change_set_id = %branch.change_set_id,
            version = %msg.atom.version(),
            to = %to,
            atoms_written,
            seq,
            "forced overwrite committed"
        );

        Ok(ApplyReport {
            branch,
            index_checksum: to.clone(),
            outcome: ApplyOutcome::Applied,
            atoms_written,
            touched: plan.touched.len(),
            superseded,
        })
    }

    /// `fromIndexChecksum` if held locally, else the branch's current
    /// snapshot, else nothing.
    fn overwrite_source(
        &self,
        from: &IndexChecksum,
        current: Option<&IndexChecksum>,
    ) -> EngineResult<Option<IndexChecksum>> {
        if !from.is_sentinel() && self.index.is_materialized(from)? {
            return Ok(Some(from.clone()));
        }
        Ok(current.cloned())
    }

    // ---- Branch management ----

    /// Point `to_change_set` at the snapshot `from_change_set` currently
    /// resolves to. Returns `false` if it already did.
    pub fn link_change_set(
        &mut self,
        workspace_id: &WorkspaceId,
        from_change_set: &ChangeSetId,
        to_change_set: &ChangeSetId,
    ) -> EngineResult<bool> {
        let source = BranchKey::new(workspace_id.clone(), from_change_set.clone());
        let target = BranchKey::new(workspace_id.clone(), to_change_set.clone());
        validate_branch_key(&target)?;

        let index = self
            .branches
            .resolve(&source)?
            .ok_or_else(|| EngineError::UnknownBranch(source.clone()))?;
        let previous = self.branches.resolve(&target)?;
        if previous.as_ref() == Some(&index) {
            return Ok(false);
        }

        let mut txn = Transaction::default();
        txn.push(Mutation::AdvanceBranch {
            branch: target.clone(),
            index_checksum: index.clone(),
        });
        self.supersede(&mut txn, &target, previous.as_ref(), &index)?;
        self.commit(txn)?;

        info!(
            workspace_id = %workspace_id,
            from = %from_change_set,
            to = %to_change_set,
            index_checksum = %index,
            "change set linked"
        );
        Ok(true)
    }

    // ---- Reclamation ----

    /// Remove a closed branch and everything only it could reach.
    ///
    /// A branch with no pointer is a no-op. The trunk branch is refused.
    pub fn prune_closed_branch(
        &mut self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
    ) -> EngineResult<PruneReport> {
        let branch = BranchKey::new(workspace_id.clone(), change_set_id.clone());
        if change_set_id == &self.config.trunk_change_set_id {
            return Err(EngineError::TrunkBranch(branch));
        }
        if self.branches.resolve(&branch)?.is_none() {
            debug!(%branch, "prune of unknown branch ignored");
            return Ok(PruneReport::default());
        }

        let mut txn = Transaction::default();
        txn.push(Mutation::RemoveBranch(branch.clone()));
        let mut report = self.reclaim(&mut txn, std::slice::from_ref(&branch))?;
        report.branches_removed = 1;
        let seq = self.commit(txn)?;

        info!(
            workspace_id = %workspace_id,
            change_set_id = %change_set_id,
            snapshots_dropped = report.snapshots_dropped,
            atoms_swept = report.atoms_swept,
            seq,
            "branch pruned"
        );
        Ok(report)
    }

    /// Mark-and-sweep over the state that remains once `removed` are gone.
    ///
    /// Roots are the surviving branch pointers. Snapshots no root names are
    /// dropped; atoms no surviving membership row names are deleted.
    fn reclaim(&self, txn: &mut Transaction, removed: &[BranchKey]) -> EngineResult<PruneReport> {
        let live: BTreeSet<IndexChecksum> = self
            .branches
            .list(None)?
            .into_iter()
            .filter(|p| !removed.contains(&p.branch))
            .map(|p| p.index_checksum)
            .collect();

        let mut report = PruneReport::default();
        for index in self.index.snapshots()? {
            if !live.contains(&index) {
                txn.push(Mutation::DropSnapshot(index));
                report.snapshots_dropped += 1;
            }
        }

        let referenced = self.index.referenced_versions(&live)?;
        for version in self.atoms.versions()? {
            if !referenced.contains(&version) {
                txn.push(Mutation::DeleteAtom(version));
                report.atoms_swept += 1;
            }
        }
        Ok(report)
    }

    // ---- Recovery ----

    /// Drop local state for a branch (or, with `force`, its whole
    /// workspace) so the host can re-request a complete snapshot.
    ///
    /// Never fails. Internal errors are logged and the engine falls back to
    /// an empty state.
    pub fn full_resync(
        &mut self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
        force: bool,
    ) -> ResyncReport {
        match self.try_full_resync(workspace_id, change_set_id, force) {
            Ok(report) => report,
            Err(e) => {
                error!(
                    workspace_id = %workspace_id,
                    change_set_id = %change_set_id,
                    force,
                    error = %e,
                    "full resync failed; resetting to an empty state"
                );
                let journal_truncated = self.reset();
                ResyncReport::degraded(journal_truncated)
            }
        }
    }

    fn try_full_resync(
        &mut self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
        force: bool,
    ) -> EngineResult<ResyncReport> {
        let branch = BranchKey::new(workspace_id.clone(), change_set_id.clone());
        let doomed: Vec<BranchKey> = if force {
            self.branches
                .list(Some(workspace_id))?
                .into_iter()
                .map(|p| p.branch)
                .collect()
        } else if self.branches.resolve(&branch)?.is_some() {
            vec![branch]
        } else {
            Vec::new()
        };

        let mut txn = Transaction::default();
        for branch in &doomed {
            txn.push(Mutation::RemoveBranch(branch.clone()));
        }
        let mut reclaimed = self.reclaim(&mut txn, &doomed)?;
        reclaimed.branches_removed = doomed.len();
        self.commit(txn)?;

        let mut report = ResyncReport {
            resync_required: !reclaimed.is_noop(),
            reclaimed,
            ..ResyncReport::default()
        };
        if self.tables().is_empty()? {
            if let Some(journal) = &self.journal {
                journal.truncate()?;
                report.journal_truncated = true;
            }
        }

        info!(
            workspace_id = %workspace_id,
            change_set_id = %change_set_id,
            force,
            branches_removed = report.reclaimed.branches_removed,
            snapshots_dropped = report.reclaimed.snapshots_dropped,
            atoms_swept = report.reclaimed.atoms_swept,
            "full resync"
        );
        Ok(report)
    }

    /// Empty every table and the journal, logging rather than returning
    /// failures. Returns whether the journal was truncated.
    fn reset(&mut self) -> bool {
        let clear = Transaction {
            seq: self.seq,
            mutations: vec![Mutation::Clear],
        };
        if let Err(e) = self.tables().apply(&clear) {
            error!(error = %e, "failed to clear tables during reset");
        }
        match &self.journal {
            Some(journal) => match journal.truncate() {
                Ok(()) => true,
                Err(e) => {
                    error!(error = %e, "failed to truncate journal during reset");
                    false
                }
            },
            None => false,
        }
    }

    /// Rewrite the journal as one transaction equivalent to the current
    /// state. Returns the new journal size in bytes.
    pub fn compact(&mut self) -> EngineResult<u64> {
        let Some(journal) = &self.journal else {
            return Ok(0);
        };

        if self.tables().is_empty()? {
            journal.rewrite(&[])?;
            return Ok(0);
        }

        let mut txn = Transaction::new(self.seq);
        txn.push(Mutation::Clear);
        for atom in self.atoms.scan()? {
            txn.push(Mutation::PutAtom(atom));
        }
        for index in self.index.snapshots()? {
            let overlay = full_overlay(self.index.membership(&index)?);
            txn.push(Mutation::Materialize {
                source: None,
                target: index,
                overlay,
            });
        }
        for pointer in self.branches.list(None)? {
            txn.push(Mutation::AdvanceBranch {
                branch: pointer.branch,
                index_checksum: pointer.index_checksum,
            });
        }

        journal.rewrite(std::slice::from_ref(&txn))?;
        let size = journal.offset()?;
        info!(mutations = txn.len(), bytes = size, seq = self.seq, "journal compacted");
        Ok(size)
    }

    // ---- Reads ----

    /// The current value of one object inside one branch.
    pub fn get(
        &self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
        kind: &str,
        id: &str,
    ) -> EngineResult<Option<Value>> {
        let branch = BranchKey::new(workspace_id.clone(), change_set_id.clone());
        let Some(index) = self.branches.resolve(&branch)? else {
            return Ok(None);
        };
        let key = AtomKey::new(kind, id);
        let Some(checksum) = self.index.resolve(&index, &key)? else {
            return Ok(None);
        };
        let version = key.at(checksum);
        let document = self.decode_version(&version)?;
        if document.is_none() {
            warn!(%branch, %version, "membership row names a missing atom");
        }
        Ok(document)
    }

    /// Resolve a list object whose document is an array of
    /// `kind:args:checksum` references into the referenced documents.
    ///
    /// References that do not resolve are skipped.
    pub fn get_list(
        &self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
        kind: &str,
        id: &str,
    ) -> EngineResult<Vec<Value>> {
        let Some(document) = self.get(workspace_id, change_set_id, kind, id)? else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = document else {
            return Err(EngineError::NotAList {
                key: AtomKey::new(kind, id),
            });
        };

        let mut resolved = Vec::with_capacity(items.len());
        for item in &items {
            let Some(reference) = item.as_str().and_then(|s| AtomRef::parse(s).ok()) else {
                warn!(list = %AtomKey::new(kind, id), %item, "list entry is not an atom reference");
                continue;
            };
            match self.decode_version(reference.version())? {
                Some(value) => resolved.push(value),
                None => warn!(list = %AtomKey::new(kind, id), %reference, "list reference does not resolve"),
            }
        }
        Ok(resolved)
    }

    fn decode_version(&self, version: &AtomVersion) -> EngineResult<Option<Value>> {
        match self.atoms.get(version)? {
            Some(data) => Ok(Some(self.codec.decode(&data)?)),
            None => Ok(None),
        }
    }

    /// The snapshot a branch currently resolves to.
    pub fn resolve_branch(
        &self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
    ) -> EngineResult<Option<IndexChecksum>> {
        let branch = BranchKey::new(workspace_id.clone(), change_set_id.clone());
        Ok(self.branches.resolve(&branch)?)
    }

    pub fn query(&self, query: &DiagnosticQuery) -> EngineResult<QueryRows> {
        query::execute(query, self.tables(), self.codec.as_ref())
    }

    pub fn stats(&self) -> EngineResult<EngineStats> {
        Ok(EngineStats {
            instance_id: self.instance_id,
            atoms: self.atoms.len()?,
            snapshots: self.index.snapshots()?.len(),
            membership_rows: self.index.row_count(None)?,
            branches: self.branches.len()?,
            last_seq: self.seq,
            journal_bytes: self.journal.as_ref().map(Journal::offset).transpose()?,
        })
    }

    /// BLAKE3 digest (hex) over every row of every table.
    pub fn state_digest(&self) -> EngineResult<String> {
        let mut hasher = blake3::Hasher::new();
        for atom in self.atoms.scan()? {
            hasher.update(b"atom\0");
            hash_version(&mut hasher, &atom.version);
            hasher.update(&(atom.data.len() as u64).to_le_bytes());
            hasher.update(&atom.data);
        }
        for row in self.index.rows(None)? {
            hasher.update(b"member\0");
            hasher.update(row.index_checksum.as_str().as_bytes());
            hasher.update(b"\0");
            hash_version(&mut hasher, &row.version());
        }
        for pointer in self.branches.list(None)? {
            hasher.update(b"branch\0");
            hasher.update(pointer.branch.workspace_id.as_str().as_bytes());
            hasher.update(b"\0");
            hasher.update(pointer.branch.change_set_id.as_str().as_bytes());
            hasher.update(b"\0");
            hasher.update(pointer.index_checksum.as_str().as_bytes());
            hasher.update(b"\0");
        }
        Ok(hex::encode(hasher.finalize().as_bytes()))
    }
}

fn hash_version(hasher: &mut blake3::Hasher, version: &AtomVersion) {
    for part in [version.kind(), version.args(), version.checksum.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update(b"\0");
    }
}

/// An overlay that recreates `members` from nothing.
fn full_overlay(members: BTreeMap<AtomKey, Checksum>) -> Overlay {
    members
        .into_iter()
        .map(|(key, checksum)| (key, OverlayEntry::Live(checksum)))
        .collect()
}

/// Slots a batch touches, first-seen order.
fn batch_touched(batch: &PatchBatch) -> Vec<AtomKey> {
    let mut seen = BTreeSet::new();
    batch
        .patches
        .iter()
        .map(|p| p.key())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}
