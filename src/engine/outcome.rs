//! Step outcomes and run results

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::common::Error;
use crate::scenario::{Scenario, Step};

/// Verdict of a step, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// 1-based step index (0 for outcomes not tied to a step)
    pub index: usize,
    pub kind: String,
    pub title: Option<String>,
    pub status: Status,
    pub message: String,
    /// Error code when `status` is Error
    pub code: Option<&'static str>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Values written into the runtime property layer after this step
    pub exports: Vec<(String, String)>,
}

impl StepOutcome {
    pub fn pass(step: &Step, message: impl Into<String>, elapsed: Duration) -> Self {
        Self::with_status(step, Status::Pass, message.into(), elapsed)
    }

    pub fn fail(step: &Step, message: impl Into<String>, elapsed: Duration) -> Self {
        Self::with_status(step, Status::Fail, message.into(), elapsed)
    }

    pub fn error(step: &Step, error: &Error, elapsed: Duration) -> Self {
        let mut outcome = Self::with_status(step, Status::Error, error.to_string(), elapsed);
        outcome.code = Some(error.code());
        outcome
    }

    /// Error outcome for a failure that happened before any step ran
    pub fn synthetic(stage: &str, error: &Error) -> Self {
        Self {
            index: 0,
            kind: stage.to_string(),
            title: None,
            status: Status::Error,
            message: error.to_string(),
            code: Some(error.code()),
            elapsed: Duration::ZERO,
            exports: Vec::new(),
        }
    }

    fn with_status(step: &Step, status: Status, message: String, elapsed: Duration) -> Self {
        Self {
            index: step.index,
            kind: step.kind().to_string(),
            title: step.title.clone(),
            status,
            message,
            code: None,
            elapsed,
            exports: Vec::new(),
        }
    }
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Loading,
    Executing,
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Loading => "loading",
            RunState::Executing => "executing",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// A step that did not run because the run stopped early
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub index: usize,
    pub kind: String,
    pub title: Option<String>,
}

impl From<&Step> for SkippedStep {
    fn from(step: &Step) -> Self {
        Self {
            index: step.index,
            kind: step.kind().to_string(),
            title: step.title.clone(),
        }
    }
}

/// Aggregate result of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Loaded scenario, absent when loading failed
    #[serde(skip)]
    pub scenario: Option<Arc<Scenario>>,
    pub name: String,
    pub source: PathBuf,
    /// One outcome per executed step, in step order
    pub outcomes: Vec<StepOutcome>,
    pub final_state: RunState,
    pub abort_reason: Option<String>,
    pub skipped: Vec<SkippedStep>,
    pub status: Status,
}

impl RunResult {
    /// Build a result, deriving the overall status
    pub fn new(
        scenario: Arc<Scenario>,
        outcomes: Vec<StepOutcome>,
        final_state: RunState,
        abort_reason: Option<String>,
    ) -> Self {
        let skipped = scenario
            .steps
            .iter()
            .skip(outcomes.len())
            .map(SkippedStep::from)
            .collect();
        let status = overall_status(&outcomes, final_state);
        Self {
            name: scenario.name.clone(),
            source: scenario.source.clone(),
            scenario: Some(scenario),
            outcomes,
            final_state,
            abort_reason,
            skipped,
            status,
        }
    }

    /// Result holding a single synthetic Error outcome
    ///
    /// Used when the scenario could not be loaded or its properties could not be read.
    pub fn failed_before_run(source: PathBuf, stage: &str, error: &Error) -> Self {
        Self {
            scenario: None,
            name: source.display().to_string(),
            source,
            outcomes: vec![StepOutcome::synthetic(stage, error)],
            final_state: RunState::Completed,
            abort_reason: None,
            skipped: Vec::new(),
            status: Status::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Pass
    }

    /// Number of outcomes with the given status
    pub fn count(&self, status: Status) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Error if any outcome errored or the run aborted, else Fail if any failed, else Pass
pub fn overall_status(outcomes: &[StepOutcome], final_state: RunState) -> Status {
    if final_state == RunState::Aborted {
        return Status::Error;
    }
    outcomes
        .iter()
        .map(|o| o.status)
        .max()
        .unwrap_or(Status::Pass)
}
