//! Outbound change notification.
//!
//! After every committed batch or forced overwrite the engine calls
//! [`InvalidationHook::on_cache_invalidate`] once per touched object so a
//! higher-level query cache can refetch it.

use mvc_types::{ChangeSetId, WorkspaceId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

pub trait InvalidationHook: Send + Sync {
    fn on_cache_invalidate(
        &self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
        kind: &str,
        id: &str,
    );
}

/// One invalidated object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalidation {
    pub workspace_id: WorkspaceId,
    pub change_set_id: ChangeSetId,
    pub kind: String,
    pub id: String,
}

pub struct NoopInvalidator;

impl InvalidationHook for NoopInvalidator {
    fn on_cache_invalidate(&self, _: &WorkspaceId, _: &ChangeSetId, _: &str, _: &str) {}
}

/// Fans invalidations out to any number of subscribers.
///
/// Sending never blocks the engine. Slow subscribers observe
/// `RecvError::Lagged` and should treat it as "refetch everything".
#[derive(Clone, Debug)]
pub struct BroadcastInvalidator {
    tx: broadcast::Sender<Invalidation>,
}

impl BroadcastInvalidator {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl InvalidationHook for BroadcastInvalidator {
    fn on_cache_invalidate(
        &self,
        workspace_id: &WorkspaceId,
        change_set_id: &ChangeSetId,
        kind: &str,
        id: &str,
    ) {
        let event = Invalidation {
            workspace_id: workspace_id.clone(),
            change_set_id: change_set_id.clone(),
            kind: kind.to_string(),
            id: id.to_string(),
        };
        // No subscribers is not an error.
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(%workspace_id, %change_set_id, kind, id, delivered, "cache invalidated");
    }
}
