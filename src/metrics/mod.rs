use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{ExecutionOutcome, ExecutionResult, StageStatus};

/// Execution metrics logger
///
/// Timing records are emitted as structured log events.
#[derive(Debug, Clone, Default)]
pub struct ExecutionMetricsLogger {}

impl ExecutionMetricsLogger {
    pub fn new() -> Self {
        Self {}
    }

    /// Log execution start and return a session that times it
    pub fn log_execution_start(&self, pipeline: &str, execution_id: Uuid) -> ExecutionSession {
        info!(
            pipeline = %pipeline,
            execution_id = %execution_id,
            "Pipeline execution started"
        );

        ExecutionSession {
            pipeline: pipeline.to_string(),
            execution_id,
            started_at: Utc::now(),
            clock: Instant::now(),
            stages_run: 0,
        }
    }
}

/// Timing state for one in-flight execution
#[derive(Debug, Clone)]
pub struct ExecutionSession {
    pipeline: String,
    execution_id: Uuid,
    started_at: DateTime<Utc>,
    clock: Instant,
    stages_run: usize,
}

impl ExecutionSession {
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Log a finished stage
    pub fn record_stage(&mut self, stage: &str, status: StageStatus, duration: Duration) {
        self.stages_run += 1;
        info!(
            pipeline = %self.pipeline,
            execution_id = %self.execution_id,
            stage = %stage,
            status = %status,
            duration_ms = duration.as_secs_f64() * 1_000.0,
            "Stage finished"
        );
    }

    /// Log the final outcome of the execution
    pub fn finish(self, outcome: &ExecutionOutcome) {
        let duration_ms = self.clock.elapsed().as_secs_f64() * 1_000.0;
        match &outcome.result {
            ExecutionResult::Succeeded => info!(
                pipeline = %self.pipeline,
                execution_id = %self.execution_id,
                stages_run = self.stages_run,
                duration_ms,
                "Pipeline execution succeeded"
            ),
            ExecutionResult::Failed { stage, error } => warn!(
                pipeline = %self.pipeline,
                execution_id = %self.execution_id,
                stages_run = self.stages_run,
                failed_stage = %stage,
                error = %error,
                duration_ms,
                "Pipeline execution failed"
            ),
        }
    }
}
