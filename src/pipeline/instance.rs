//! A registered pipeline and its mutable execution state

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{
    ExecutionOutcome, PipelineDefinition, PipelineSummary, StageStatus, StatusMap,
};

/// One named pipeline: its definition plus per-stage status.
///
/// The status map is only written through a [`RunClaim`], and at most one
/// claim exists per instance at a time.
#[derive(Debug)]
pub struct PipelineInstance {
    definition: PipelineDefinition,
    statuses: RwLock<StatusMap>,
    running: AtomicBool,
    last_execution: RwLock<Option<ExecutionOutcome>>,
    created_at: DateTime<Utc>,
}

impl PipelineInstance {
    pub fn new(definition: PipelineDefinition) -> Self {
        Self {
            definition,
            statuses: RwLock::new(StatusMap::new()),
            running: AtomicBool::new(false),
            last_execution: RwLock::new(None),
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn stages(&self) -> &[String] {
        &self.definition.stages
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Copy of the current status map
    pub async fn statuses(&self) -> StatusMap {
        self.statuses.read().await.clone()
    }

    pub async fn last_execution(&self) -> Option<ExecutionOutcome> {
        self.last_execution.read().await.clone()
    }

    pub async fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            name: self.definition.name.clone(),
            stages: self.definition.stages.clone(),
            statuses: self.statuses().await,
            running: self.is_running(),
            created_at: self.created_at,
            last_execution: self.last_execution().await,
        }
    }

    /// Claim the instance for an execution.
    ///
    /// Returns `None` if another execution holds the claim. Outside this
    /// module claims go through [`PipelineRegistry::claim`](super::PipelineRegistry::claim).
    pub(crate) fn try_claim(self: &Arc<Self>) -> Option<RunClaim> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunClaim {
                instance: Arc::clone(self),
            })
    }
}

/// Exclusive write access to an instance's status for one execution.
///
/// Dropping the claim releases the instance, including when the owning task
/// unwinds.
#[derive(Debug)]
pub struct RunClaim {
    instance: Arc<PipelineInstance>,
}

impl RunClaim {
    pub fn instance(&self) -> &Arc<PipelineInstance> {
        &self.instance
    }

    /// Record a stage status and return the resulting map
    pub async fn set_status(&self, stage: &str, status: StageStatus) -> StatusMap {
        let mut statuses = self.instance.statuses.write().await;
        statuses.insert(stage.to_string(), status);
        statuses.clone()
    }

    /// Clear all stage statuses back to pending
    pub async fn reset(&self) -> StatusMap {
        let mut statuses = self.instance.statuses.write().await;
        statuses.clear();
        statuses.clone()
    }

    pub async fn record_outcome(&self, outcome: ExecutionOutcome) {
        *self.instance.last_execution.write().await = Some(outcome);
    }
}

impl Drop for RunClaim {
    fn drop(&mut self) {
        self.instance.running.store(false, Ordering::Release);
    }
}
