//! Scenario runner
//!
//! Drives a run through `Idle -> Loading -> Executing -> Completed`, or
//! `Aborted` when the continuation policy or a cancel request stops it early.
//! A run always produces a [`RunResult`]; load failures become a single
//! synthetic Error outcome.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::common::config::{Config, RunnerConfig};
use crate::common::Error;
use crate::properties::PropertySet;
use crate::scenario::{self, Scenario};

use super::cancel::CancelToken;
use super::capability::{Capability, CapabilityRegistry};
use super::executor::StepExecutor;
use super::outcome::{RunResult, RunState, Status, StepOutcome};

/// Runs scenarios from one workspace against one set of file properties
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    workspace: PathBuf,
    properties: BTreeMap<String, String>,
    registry: CapabilityRegistry,
    policy: RunnerConfig,
    default_timeout: std::time::Duration,
}

impl ScenarioRunner {
    /// Create a runner with the built-in capabilities
    pub fn new(
        workspace: impl Into<PathBuf>,
        properties: BTreeMap<String, String>,
        config: &Config,
    ) -> crate::common::Result<Self> {
        Ok(Self {
            workspace: workspace.into(),
            properties,
            registry: CapabilityRegistry::with_builtins(config)?,
            policy: config.runner,
            default_timeout: config.timeouts.step_default(),
        })
    }

    /// Replace the capability registry
    pub fn with_registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add or replace a single capability
    pub fn register(mut self, capability: Arc<dyn Capability>) -> Self {
        self.registry.register(capability);
        self
    }

    /// Override the continuation policy
    pub fn with_policy(mut self, policy: RunnerConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Load and run the scenario at `path`, relative to the workspace
    pub async fn run(&self, path: &Path) -> RunResult {
        self.run_with_cancel(path, &CancelToken::new()).await
    }

    /// Load and run the scenario at `path`, stopping early if `cancel` fires
    pub async fn run_with_cancel(&self, path: &Path, cancel: &CancelToken) -> RunResult {
        let mut state = RunState::Idle;
        transition(&mut state, RunState::Loading, path);

        let scenario = match scenario::load(path, &self.workspace, &self.registry) {
            Ok(scenario) => Arc::new(scenario),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to load scenario");
                transition(&mut state, RunState::Completed, path);
                return RunResult::failed_before_run(path.to_path_buf(), "load", &e);
            }
        };

        self.execute(scenario, state, cancel).await
    }

    /// Run an already loaded scenario
    ///
    /// The scenario is not modified, so it can be re-run with other properties.
    pub async fn run_scenario(&self, scenario: Arc<Scenario>, cancel: &CancelToken) -> RunResult {
        self.execute(scenario, RunState::Loading, cancel).await
    }

    /// Run several scenarios concurrently, returning results in input order
    ///
    /// Each run owns its own property set; nothing mutable is shared.
    pub async fn run_batch(&self, paths: &[PathBuf], cancel: &CancelToken) -> Vec<RunResult> {
        let mut tasks = JoinSet::new();
        for (position, path) in paths.iter().enumerate() {
            let runner = self.clone();
            let path = path.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move { (position, runner.run_with_cancel(&path, &cancel).await) });
        }

        let mut slots: Vec<Option<RunResult>> = vec![None; paths.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, result)) => slots[position] = Some(result),
                Err(e) => tracing::error!(error = %e, "Scenario task failed"),
            }
        }

        slots
            .into_iter()
            .zip(paths)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| {
                    RunResult::failed_before_run(
                        path.clone(),
                        "run",
                        &Error::Internal("scenario task did not complete".to_string()),
                    )
                })
            })
            .collect()
    }

    async fn execute(
        &self,
        scenario: Arc<Scenario>,
        mut state: RunState,
        cancel: &CancelToken,
    ) -> RunResult {
        transition(&mut state, RunState::Executing, &scenario.source);

        let executor = StepExecutor::new(
            Arc::new(self.registry.clone()),
            self.workspace.clone(),
            self.default_timeout,
        );
        let mut properties = PropertySet::new(self.properties.clone());
        let mut outcomes: Vec<StepOutcome> = Vec::with_capacity(scenario.steps.len());
        let mut abort_reason = None;

        for step in &scenario.steps {
            if cancel.is_cancelled() {
                abort_reason = Some("cancelled".to_string());
                break;
            }

            tracing::info!(step = step.index, kind = step.kind(), "Running step");
            let outcome = executor.execute(step, &properties, cancel).await;
            tracing::info!(
                step = step.index,
                status = %outcome.status,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "Step finished"
            );

            for (key, value) in &outcome.exports {
                tracing::debug!(step = step.index, key = %key, "Exporting property");
                properties.export(key.clone(), value.clone());
            }

            let stop = self.stop_reason(&outcome);
            outcomes.push(outcome);
            if let Some(reason) = stop {
                abort_reason = Some(reason);
                break;
            }
        }

        let final_state = if abort_reason.is_some() {
            RunState::Aborted
        } else {
            RunState::Completed
        };
        if let Some(reason) = &abort_reason {
            tracing::warn!(
                scenario = %scenario.name,
                executed = outcomes.len(),
                total = scenario.steps.len(),
                reason = %reason,
                "Run aborted"
            );
        }
        transition(&mut state, final_state, &scenario.source);

        RunResult::new(scenario, outcomes, final_state, abort_reason)
    }

    /// Reason to stop after `outcome`, if the policy says so
    fn stop_reason(&self, outcome: &StepOutcome) -> Option<String> {
        match outcome.status {
            Status::Error if outcome.code == Some(Error::Cancelled.code()) => {
                Some("cancelled".to_string())
            }
            Status::Error if self.policy.abort_on_error => {
                Some(format!("step {} reported ERROR", outcome.index))
            }
            Status::Fail if self.policy.abort_on_fail => {
                Some(format!("step {} reported FAIL", outcome.index))
            }
            _ => None,
        }
    }
}

fn transition(state: &mut RunState, next: RunState, source: &Path) {
    tracing::debug!(from = %state, to = %next, source = %source.display(), "Run state");
    *state = next;
}
