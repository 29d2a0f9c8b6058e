//! Sequential execution of a pipeline's stages

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{RunClaim, StageContext, StageRunner, StatusBroadcaster};
use crate::errors::{AppError, AppResult, StageError, StageResult};
use crate::metrics::{ExecutionMetricsLogger, ExecutionSession};
use crate::models::{ExecutionOutcome, ExecutionResult, StageKind, StageStatus};

/// Drives pipeline instances through their stages.
///
/// One engine serves every pipeline; each call to [`execute`](Self::execute)
/// spawns its own task, so different pipelines run concurrently while a
/// single pipeline never has two runs.
#[derive(Clone)]
pub struct ExecutionEngine {
    runner: Arc<dyn StageRunner>,
    broadcaster: StatusBroadcaster,
    metrics: ExecutionMetricsLogger,
    stage_timeout: Option<Duration>,
}

/// Handle to a started execution
#[derive(Debug)]
pub struct ExecutionHandle {
    execution_id: Uuid,
    pipeline: String,
    started_at: DateTime<Utc>,
    task: JoinHandle<ExecutionOutcome>,
}

impl ExecutionHandle {
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wait for the execution to finish.
    ///
    /// By the time this returns the pipeline accepts a new execution.
    pub async fn wait(self) -> AppResult<ExecutionOutcome> {
        self.task.await.map_err(|e| {
            AppError::internal(format!(
                "execution {} of '{}' did not complete: {}",
                self.execution_id, self.pipeline, e
            ))
        })
    }
}

impl ExecutionEngine {
    pub fn new(runner: Arc<dyn StageRunner>, broadcaster: StatusBroadcaster) -> Self {
        Self {
            runner,
            broadcaster,
            metrics: ExecutionMetricsLogger::new(),
            stage_timeout: None,
        }
    }

    /// Treat a stage that runs longer than `timeout` as failed
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Start executing the claimed instance in the background.
    ///
    /// Returns without waiting for any stage; the claim is released when
    /// the run ends.
    pub fn execute(&self, claim: RunClaim) -> ExecutionHandle {
        let pipeline = claim.instance().name().to_string();
        let execution_id = Uuid::new_v4();
        let session = self.metrics.log_execution_start(&pipeline, execution_id);
        let started_at = session.started_at();

        let engine = self.clone();
        let task = tokio::spawn(async move { engine.run(claim, execution_id, session).await });

        ExecutionHandle {
            execution_id,
            pipeline,
            started_at,
            task,
        }
    }

    async fn run(
        &self,
        claim: RunClaim,
        execution_id: Uuid,
        mut session: ExecutionSession,
    ) -> ExecutionOutcome {
        let instance = Arc::clone(claim.instance());
        let name = instance.name();
        let stages = instance.stages().to_vec();

        let cleared = claim.reset().await;
        self.broadcaster.notify(name, cleared).await;

        let mut result = ExecutionResult::Succeeded;

        for (position, stage) in stages.iter().enumerate() {
            let kind = match stage.parse::<StageKind>() {
                Ok(kind) => kind,
                Err(_) => {
                    warn!(pipeline = %name, stage = %stage, "Unknown stage");
                    let statuses = claim.set_status(stage, StageStatus::Unknown).await;
                    self.broadcaster.notify(name, statuses).await;
                    continue;
                }
            };

            let statuses = claim.set_status(stage, StageStatus::Running).await;
            self.broadcaster.notify(name, statuses).await;

            let context = StageContext {
                pipeline: name.to_string(),
                execution_id,
                position,
                stages: stages.clone(),
            };
            let clock = Instant::now();
            let stage_result = self.run_stage(kind, &context).await;

            let status = match &stage_result {
                Ok(()) => StageStatus::Success,
                Err(_) => StageStatus::Failure,
            };
            session.record_stage(stage, status, clock.elapsed());

            let statuses = claim.set_status(stage, status).await;
            self.broadcaster.notify(name, statuses).await;

            if let Err(error) = stage_result {
                debug!(pipeline = %name, stage = %stage, "Skipping remaining stages after failure");
                result = ExecutionResult::Failed {
                    stage: stage.clone(),
                    error: error.to_string(),
                };
                break;
            }
        }

        let outcome = ExecutionOutcome {
            execution_id,
            pipeline: name.to_string(),
            result,
            statuses: instance.statuses().await,
            started_at: session.started_at(),
            finished_at: Utc::now(),
        };
        claim.record_outcome(outcome.clone()).await;
        session.finish(&outcome);

        outcome
    }

    async fn run_stage(&self, kind: StageKind, context: &StageContext) -> StageResult {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, self.runner.run(kind, context))
                .await
                .unwrap_or_else(|_| Err(StageError::timed_out(kind.as_str(), limit))),
            None => self.runner.run(kind, context).await,
        }
    }
}
