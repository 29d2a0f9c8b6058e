//! Service layer
//!
//! Services sit between the web layer and the pipeline core, exposing one
//! method per command.

pub mod pipeline;

pub use pipeline::PipelineService;
