use std::sync::Arc;

use crate::{core::Config, subscribers::Subscribe};

use super::{
    orchestrator::Orchestrator,
    spawn::{OsSpawner, Spawner},
};

/// Builder for constructing an Orchestrator with optional features.
pub struct OrchestratorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    spawner: Arc<dyn Spawner>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            spawner: Arc::new(OsSpawner),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive run events (phases, spawns, callback failures, ...)
    /// through dedicated workers with bounded queues, driven by a per-run
    /// observer thread.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the default [`OsSpawner`].
    ///
    /// An error returned by the spawner is handled exactly like an OS refusing
    /// to create the thread.
    pub fn with_spawner(mut self, spawner: impl Spawner) -> Self {
        self.spawner = Arc::new(spawner);
        self
    }

    /// Builds and returns the Orchestrator instance.
    pub fn build(self) -> Orchestrator {
        Orchestrator::new_internal(self.cfg, self.subscribers, self.spawner)
    }
}
