//! Single-writer actor around [`Engine`].
//!
//! The engine is moved onto its own task and driven through a bounded FIFO
//! queue of closures. Commands from any number of [`EngineHandle`] clones
//! are therefore applied strictly one at a time, in arrival order, and a
//! full queue applies backpressure to senders.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error_span, Instrument};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

type Job = Box<dyn FnOnce(&mut Engine) + Send + 'static>;

/// Cloneable handle to an engine running on its own task.
///
/// The actor stops once every handle has been dropped and the queue has
/// drained.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    to_actor_tx: mpsc::Sender<Job>,
    instance_id: Uuid,
}

impl EngineHandle {
    /// Move `engine` onto a new task. Must be called from within a tokio
    /// runtime.
    pub fn spawn(engine: Engine) -> Self {
        let instance_id = engine.instance_id();
        let (to_actor_tx, to_actor_rx) = mpsc::channel(engine.config().queue_capacity);
        let actor = Actor {
            engine,
            to_actor_rx,
        };
        tokio::spawn(
            actor
                .run()
                .instrument(error_span!("engine", %instance_id)),
        );
        Self {
            to_actor_tx,
            instance_id,
        }
    }

    /// Run `f` against the engine once every earlier command has finished.
    pub async fn call<R, F>(&self, f: F) -> EngineResult<R>
    where
        F: FnOnce(&mut Engine) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            // The caller may have given up waiting.
            reply_tx.send(f(engine)).ok();
        });
        self.to_actor_tx
            .send(job)
            .await
            .map_err(|_| EngineError::QueueClosed)?;
        reply_rx.await.map_err(|_| EngineError::QueueClosed)
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Returns `true` once the actor task has exited.
    pub fn is_closed(&self) -> bool {
        self.to_actor_tx.is_closed()
    }
}

struct Actor {
    engine: Engine,
    to_actor_rx: mpsc::Receiver<Job>,
}

impl Actor {
    async fn run(mut self) {
        debug!("engine actor started");
        while let Some(job) = self.to_actor_rx.recv().await {
            job(&mut self.engine);
        }
        debug!("engine actor stopped");
    }
}
