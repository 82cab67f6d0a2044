//! Step executor
//!
//! Executes one step against a property view. Every failure is captured in
//! the returned [`StepOutcome`]; nothing propagates out of `execute`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::{Error, Result};
use crate::properties::PropertySet;
use crate::scenario::{Assertion, Params, Step, StepBody, Subject};

use super::assertion;
use super::cancel::CancelToken;
use super::capability::{CapabilityContext, CapabilityOutput, CapabilityRegistry};
use super::json_path;
use super::outcome::StepOutcome;

/// Verdict of a step before timing is attached
enum Verdict {
    Pass(CapabilityOutput),
    Fail(String),
}

/// Executes single steps through the capability registry
#[derive(Debug, Clone)]
pub struct StepExecutor {
    registry: Arc<CapabilityRegistry>,
    workspace: PathBuf,
    default_timeout: Duration,
}

impl StepExecutor {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        workspace: PathBuf,
        default_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            workspace,
            default_timeout,
        }
    }

    /// Execute `step`, reading substitutions from `properties`
    ///
    /// Exports are returned on the outcome rather than applied, so a step
    /// never observes its own exports.
    pub async fn execute(
        &self,
        step: &Step,
        properties: &PropertySet,
        cancel: &CancelToken,
    ) -> StepOutcome {
        let started = Instant::now();

        let verdict = match &step.body {
            StepBody::Action { kind, params } => {
                self.execute_action(step, kind, params, properties, cancel)
                    .await
            }
            StepBody::Assertion(assertion) => execute_assertion(step, assertion, properties),
        };

        let elapsed = started.elapsed();
        match verdict {
            Ok(Verdict::Pass(output)) => {
                let mut outcome = StepOutcome::pass(step, output.message, elapsed);
                outcome.exports = output.exports;
                outcome
            }
            Ok(Verdict::Fail(message)) => StepOutcome::fail(step, message, elapsed),
            Err(error) => StepOutcome::error(step, &error, elapsed),
        }
    }

    async fn execute_action(
        &self,
        step: &Step,
        kind: &str,
        params: &Params,
        properties: &PropertySet,
        cancel: &CancelToken,
    ) -> Result<Verdict> {
        let capability = self.registry.get(kind).ok_or_else(|| {
            Error::schema(
                step.index,
                format!(
                    "unknown step kind '{}'. Supported: {}",
                    kind,
                    self.registry.kinds().join(", ")
                ),
            )
        })?;

        // Steps built outside the loader have not been validated yet
        capability
            .validate(params)
            .map_err(|message| Error::schema(step.index, format!("{}: {}", kind, message)))?;

        let resolved = substitute(params, properties, step.index)?;
        tracing::debug!(step = step.index, kind, params = ?resolved, "Resolved parameters");

        let ctx = CapabilityContext {
            workspace: &self.workspace,
            step: step.index,
            cancel,
        };
        let limit = step.timeout.unwrap_or(self.default_timeout);

        let output = tokio::select! {
            result = tokio::time::timeout(limit, capability.invoke(&resolved, &ctx)) => {
                match result {
                    Ok(output) => output?,
                    Err(_) => {
                        return Err(Error::Timeout {
                            step: step.index,
                            after: limit,
                        })
                    }
                }
            }
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        Ok(Verdict::Pass(output))
    }
}

fn execute_assertion(
    step: &Step,
    assertion: &Assertion,
    properties: &PropertySet,
) -> Result<Verdict> {
    let expected = properties.resolve_template(&assertion.expected, step.index)?;

    let check = match &assertion.subject {
        Subject::Value(actual) => {
            let actual = properties.resolve_template(actual, step.index)?;
            assertion::evaluate(assertion.op, &actual, &expected)
        }
        Subject::Json { from, path } => {
            let from = properties.resolve_template(from, step.index)?;
            let path = properties.resolve_template(path, step.index)?;
            let count = match &assertion.count {
                Some(count) => Some(properties.resolve_template(count, step.index)?),
                None => None,
            };

            let document: serde_json::Value = match serde_json::from_str(&from) {
                Ok(document) => document,
                Err(e) => return Ok(Verdict::Fail(format!("source is not valid JSON: {}", e))),
            };
            let selected: Vec<(String, String)> = json_path::select(&document, &path)
                .into_iter()
                .map(|(at, value)| (at, json_path::to_text(value)))
                .collect();

            assertion::evaluate_selection(
                assertion.op,
                &path,
                &selected,
                &expected,
                count.as_deref(),
            )
        }
    }
    .map_err(|message| Error::schema(step.index, message))?;

    tracing::debug!(
        step = step.index,
        op = %assertion.op,
        passed = check.passed,
        "Evaluated assertion"
    );

    if check.passed {
        Ok(Verdict::Pass(CapabilityOutput::new(check.message)))
    } else {
        Ok(Verdict::Fail(check.message))
    }
}

/// Substitute every parameter value
fn substitute(params: &Params, properties: &PropertySet, step: usize) -> Result<Params> {
    params
        .iter()
        .map(|(key, raw)| Ok((key.clone(), properties.resolve_template(raw, step)?)))
        .collect()
}
