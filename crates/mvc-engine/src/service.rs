//! The inbound command surface, as seen from the host's RPC shim.

use async_trait::async_trait;
use mvc_patch::{AtomMessage, Message, PatchBatch};
use mvc_types::{ChangeSetId, WorkspaceId};
use serde_json::Value;
use tracing::error;

use crate::error::EngineResult;
use crate::handle::EngineHandle;
use crate::query::{DiagnosticQuery, QueryRows};
use crate::report::{ApplyReport, EngineStats, PruneReport, ResyncReport};

/// Commands a host may issue to the cache.
///
/// Implementations serialize commands: two overlapping calls never
/// interleave.
#[async_trait]
pub trait CacheService: Send + Sync {
    async fn initialize(&self) -> EngineResult<usize>;

    async fn apply_patch_batch(&self, batch: PatchBatch) -> EngineResult<ApplyReport>;

    async fn apply_forced_overwrite(&self, msg: AtomMessage) -> EngineResult<ApplyReport>;

    async fn handle_message(&self, message: Message) -> EngineResult<ApplyReport>;

    async fn prune_closed_branch(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
    ) -> EngineResult<PruneReport>;

    /// Never fails; see [`crate::Engine::full_resync`].
    async fn full_resync(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
        force: bool,
    ) -> ResyncReport;

    async fn link_change_set(
        &self,
        workspace_id: WorkspaceId,
        from_change_set: ChangeSetId,
        to_change_set: ChangeSetId,
    ) -> EngineResult<bool>;

    async fn get(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
        kind: String,
        id: String,
    ) -> EngineResult<Option<Value>>;

    async fn get_list(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
        kind: String,
        id: String,
    ) -> EngineResult<Vec<Value>>;

    async fn query(&self, query: DiagnosticQuery) -> EngineResult<QueryRows>;

    async fn stats(&self) -> EngineResult<EngineStats>;
}

#[async_trait]
impl CacheService for EngineHandle {
    async fn initialize(&self) -> EngineResult<usize> {
        self.call(|engine| engine.initialize()).await?
    }

    async fn apply_patch_batch(&self, batch: PatchBatch) -> EngineResult<ApplyReport> {
        self.call(move |engine| engine.apply_patch_batch(&batch)).await?
    }

    async fn apply_forced_overwrite(&self, msg: AtomMessage) -> EngineResult<ApplyReport> {
        self.call(move |engine| engine.apply_forced_overwrite(&msg)).await?
    }

    async fn handle_message(&self, message: Message) -> EngineResult<ApplyReport> {
        self.call(move |engine| engine.handle_message(&message)).await?
    }

    async fn prune_closed_branch(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
    ) -> EngineResult<PruneReport> {
        self.call(move |engine| engine.prune_closed_branch(&workspace_id, &change_set_id))
            .await?
    }

    async fn full_resync(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
        force: bool,
    ) -> ResyncReport {
        let result = self
            .call(move |engine| engine.full_resync(&workspace_id, &change_set_id, force))
            .await;
        match result {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "full resync could not reach the engine");
                ResyncReport::degraded(false)
            }
        }
    }

    async fn link_change_set(
        &self,
        workspace_id: WorkspaceId,
        from_change_set: ChangeSetId,
        to_change_set: ChangeSetId,
    ) -> EngineResult<bool> {
        self.call(move |engine| {
            engine.link_change_set(&workspace_id, &from_change_set, &to_change_set)
        })
        .await?
    }

    async fn get(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
        kind: String,
        id: String,
    ) -> EngineResult<Option<Value>> {
        self.call(move |engine| engine.get(&workspace_id, &change_set_id, &kind, &id))
            .await?
    }

    async fn get_list(
        &self,
        workspace_id: WorkspaceId,
        change_set_id: ChangeSetId,
        kind: String,
        id: String,
    ) -> EngineResult<Vec<Value>> {
        self.call(move |engine| engine.get_list(&workspace_id, &change_set_id, &kind, &id))
            .await?
    }

    async fn query(&self, query: DiagnosticQuery) -> EngineResult<QueryRows> {
        self.call(move |engine| engine.query(&query)).await?
    }

    async fn stats(&self) -> EngineResult<EngineStats> {
        self.call(|engine| engine.stats()).await?
    }
}
