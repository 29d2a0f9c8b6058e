//! Pipeline command service
//!
//! Translates the create / execute / status / subscribe commands into calls on
//! the registry, engine and broadcaster. Handlers hold a clone of the service
//! and never touch the core directly.

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::errors::AppResult;
use crate::models::{PipelineCreateRequest, PipelineSummary, StatusMap};
use crate::pipeline::{
    ExecutionEngine, ExecutionHandle, PipelineRegistry, SimulatedStageRunner, StageRunner,
    StatusBroadcaster, Subscription,
};

#[derive(Clone)]
pub struct PipelineService {
    registry: PipelineRegistry,
    engine: ExecutionEngine,
    broadcaster: StatusBroadcaster,
}

impl PipelineService {
    pub fn new(
        registry: PipelineRegistry,
        engine: ExecutionEngine,
        broadcaster: StatusBroadcaster,
    ) -> Self {
        Self {
            registry,
            engine,
            broadcaster,
        }
    }

    /// Wire up registry, broadcaster and engine from configuration with the
    /// given stage runner
    pub fn with_runner(config: &Config, runner: Arc<dyn StageRunner>) -> Self {
        let registry = PipelineRegistry::new(config.registry.on_duplicate);
        let broadcaster = StatusBroadcaster::new(config.broadcast.subscriber_buffer);
        let engine = ExecutionEngine::new(runner, broadcaster.clone())
            .with_stage_timeout(config.execution.stage_timeout());
        Self::new(registry, engine, broadcaster)
    }

    /// Service backed by the simulated stage runner
    pub fn from_config(config: &Config) -> Self {
        let runner = SimulatedStageRunner::from_config(&config.runner);
        info!(
            stage_duration_ms = config.runner.simulated_stage_duration_ms,
            fail_stages = ?config.runner.fail_stages,
            "Using simulated stage runner"
        );
        Self::with_runner(config, Arc::new(runner))
    }

    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &StatusBroadcaster {
        &self.broadcaster
    }

    pub async fn create_pipeline(&self, request: PipelineCreateRequest) -> AppResult<PipelineSummary> {
        let instance = self.registry.create(request.name, request.stages).await?;
        Ok(instance.summary().await)
    }

    pub async fn execute_pipeline(&self, name: &str) -> AppResult<ExecutionHandle> {
        let claim = self.registry.claim(name).await?;
        Ok(self.engine.execute(claim))
    }

    pub async fn get_status(&self, name: &str) -> AppResult<StatusMap> {
        Ok(self.registry.lookup(name).await?.statuses().await)
    }

    pub async fn get_pipeline(&self, name: &str) -> AppResult<PipelineSummary> {
        Ok(self.registry.lookup(name).await?.summary().await)
    }

    pub async fn list_pipelines(&self) -> Vec<PipelineSummary> {
        let mut summaries = Vec::new();
        for instance in self.registry.list().await {
            summaries.push(instance.summary().await);
        }
        summaries
    }

    pub async fn subscribe(&self) -> Subscription {
        self.broadcaster.subscribe(&self.registry).await
    }

    pub async fn unsubscribe(&self, subscription: &Subscription) {
        self.broadcaster.unsubscribe(subscription.id()).await;
    }
}
