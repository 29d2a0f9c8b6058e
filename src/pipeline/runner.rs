//! Stage runner contract and the simulated runner shipped with the service

use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::errors::{StageError, StageResult};
use crate::models::StageKind;

/// What a runner knows about the execution it is working for
#[derive(Debug, Clone)]
pub struct StageContext {
    pub pipeline: String,
    pub execution_id: Uuid,
    /// Index of the stage within the pipeline's stage list
    pub position: usize,
    pub stages: Vec<String>,
}

/// Performs the work of one recognized stage.
///
/// The engine treats the runner as a black box: `Ok(())` marks the stage
/// successful, any error marks it failed and stops the execution.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run(&self, stage: StageKind, context: &StageContext) -> StageResult;
}

/// Runner that pretends to do the work by sleeping
#[derive(Debug, Clone)]
pub struct SimulatedStageRunner {
    duration: Duration,
    fail_stages: HashSet<StageKind>,
}

impl SimulatedStageRunner {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            fail_stages: HashSet::new(),
        }
    }

    /// Make every run of `stage` report failure
    pub fn failing(mut self, stage: StageKind) -> Self {
        self.fail_stages.insert(stage);
        self
    }

    /// Build from configuration; unrecognized names in `fail_stages` are ignored
    pub fn from_config(config: &RunnerConfig) -> Self {
        config
            .fail_stages
            .iter()
            .filter_map(|name| name.parse::<StageKind>().ok())
            .fold(
                Self::new(config.simulated_stage_duration()),
                |runner, stage| runner.failing(stage),
            )
    }
}

#[async_trait]
impl StageRunner for SimulatedStageRunner {
    async fn run(&self, stage: StageKind, context: &StageContext) -> StageResult {
        info!(
            pipeline = %context.pipeline,
            execution_id = %context.execution_id,
            "{} for {}",
            stage.action(),
            context.pipeline
        );

        tokio::time::sleep(self.duration).await;

        if self.fail_stages.contains(&stage) {
            return Err(StageError::failed(
                stage.as_str(),
                "simulated failure",
            ));
        }
        Ok(())
    }
}
