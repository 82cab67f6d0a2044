//! Step execution and run orchestration

mod assertion;
pub mod cancel;
pub mod capabilities;
pub mod capability;
pub mod executor;
pub mod json_path;
pub mod outcome;
pub mod runner;

pub use cancel::CancelToken;
pub use capability::{Capability, CapabilityContext, CapabilityOutput, CapabilityRegistry};
pub use executor::StepExecutor;
pub use outcome::{RunResult, RunState, SkippedStep, Status, StepOutcome};
pub use runner::ScenarioRunner;
