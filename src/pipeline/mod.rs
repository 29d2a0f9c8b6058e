//! Pipeline execution core
//!
//! - [`PipelineRegistry`] owns every [`PipelineInstance`] by name
//! - [`ExecutionEngine`] runs one instance's stages in order through a
//!   [`StageRunner`], recording each status change
//! - [`StatusBroadcaster`] pushes every change to connected subscribers

pub mod broadcaster;
pub mod engine;
pub mod instance;
pub mod registry;
pub mod runner;

pub use broadcaster::{StatusBroadcaster, Subscription};
pub use engine::{ExecutionEngine, ExecutionHandle};
pub use instance::{PipelineInstance, RunClaim};
pub use registry::PipelineRegistry;
pub use runner::{SimulatedStageRunner, StageContext, StageRunner};
