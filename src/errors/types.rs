//! Error type definitions for the pipeline controller
//!
//! Errors are split in two layers: [`AppError`] is what a command on the
//! registry, engine or service can fail with and is surfaced to callers,
//! while [`StageError`] is what a stage runner reports for a single stage
//! and only ever shows up through the status map and execution outcome.

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
///
/// Every variant is scoped to one command; none of them is fatal to the
/// process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Referenced pipeline does not exist
    #[error("Not found: {resource} '{name}'")]
    NotFound { resource: String, name: String },

    /// A pipeline with this name is already registered
    #[error("Pipeline '{name}' already exists")]
    DuplicatePipeline { name: String },

    /// The pipeline has an execution in progress
    #[error("Pipeline '{name}' is already running")]
    AlreadyRunning { name: String },

    /// Request failed basic validation
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failure reported for a single stage of an execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The runner completed the stage and reported failure
    #[error("Stage '{stage}' failed: {message}")]
    Failed { stage: String, message: String },

    /// The runner did not finish within the configured stage timeout
    #[error("Stage '{stage}' timed out after {after:?}")]
    TimedOut { stage: String, after: Duration },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a not found error for a pipeline
    pub fn pipeline_not_found<N: Into<String>>(name: N) -> Self {
        Self::NotFound {
            resource: "pipeline".to_string(),
            name: name.into(),
        }
    }

    /// Create a duplicate pipeline error
    pub fn duplicate_pipeline<N: Into<String>>(name: N) -> Self {
        Self::DuplicatePipeline { name: name.into() }
    }

    /// Create an already running error
    pub fn already_running<N: Into<String>>(name: N) -> Self {
        Self::AlreadyRunning { name: name.into() }
    }

    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl StageError {
    /// Create a stage failure
    pub fn failed<S: Into<String>, M: Into<String>>(stage: S, message: M) -> Self {
        Self::Failed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a stage timeout
    pub fn timed_out<S: Into<String>>(stage: S, after: Duration) -> Self {
        Self::TimedOut {
            stage: stage.into(),
            after,
        }
    }
}
