//! Centralized error handling for the pipeline controller
//!
//! # Usage
//!
//! ```rust
//! use pipeline_controller::errors::{AppError, AppResult};
//!
//! fn lookup(name: &str) -> AppResult<()> {
//!     Err(AppError::pipeline_not_found(name))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for stage runner results
pub type StageResult = Result<(), StageError>;
