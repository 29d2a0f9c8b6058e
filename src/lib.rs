//! Pipeline controller library
//!
//! Register named build/test/deploy pipelines, execute them in the
//! background, query per-stage status and receive status pushes.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod web;

pub use errors::{AppError, AppResult};
