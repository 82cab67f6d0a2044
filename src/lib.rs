//! tson - scenario test runner
//!
//! Loads JSON/YAML test-definition documents, resolves `{{key}}` references
//! against layered properties, executes steps through pluggable capabilities
//! and renders the outcome as a line-based report.

pub mod cli;
pub mod commands;
pub mod common;
pub mod engine;
pub mod properties;
pub mod report;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use engine::{CancelToken, RunResult, ScenarioRunner, Status};
pub use properties::PropertySet;
