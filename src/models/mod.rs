use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub mod event;
pub mod stage;

/// Per-pipeline mapping from stage identifier to its latest known status.
///
/// A stage absent from the map is `pending`.
pub type StatusMap = BTreeMap<String, StageStatus>;

/// Stages the engine knows how to hand to a stage runner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Build,
    Test,
    Deploy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    Failure,
    /// The stage identifier is not one of the recognized stages
    Unknown,
}

/// Immutable definition of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineDefinition {
    pub name: String,
    pub stages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCreateRequest {
    #[serde(alias = "pipelineName")]
    pub name: String,
    #[serde(default)]
    pub stages: Vec<String>,
}

/// How an execution ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ExecutionResult {
    /// Every stage was processed without a failure
    Succeeded,
    /// A recognized stage failed and the remaining stages were skipped
    Failed { stage: String, error: String },
}

/// Record of a finished execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub execution_id: Uuid,
    pub pipeline: String,
    #[serde(flatten)]
    pub result: ExecutionResult,
    pub statuses: StatusMap,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Acknowledgment returned when an execution is accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStarted {
    pub execution_id: Uuid,
    pub pipeline: String,
    pub started_at: DateTime<Utc>,
}

/// Read model for a single pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub name: String,
    pub stages: Vec<String>,
    pub statuses: StatusMap,
    pub running: bool,
    pub created_at: DateTime<Utc>,
    pub last_execution: Option<ExecutionOutcome>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusEventKind {
    /// Current state sent to a subscriber when it connects
    Snapshot,
    /// Sent after a stage status change
    Update,
}

/// Push notification payload: pipeline name plus its full status map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEvent {
    #[serde(rename = "type")]
    pub kind: StatusEventKind,
    pub pipeline: String,
    pub statuses: StatusMap,
    pub timestamp: DateTime<Utc>,
}
