//! Result reporting
//!
//! Renders a [`RunResult`] as plain text lines (one per outcome plus a
//! summary) or as JSON. The text form omits timings, so the same result
//! always renders identically.

use serde::Serialize;

use crate::common::Result;
use crate::engine::{RunResult, RunState, Status, StepOutcome};

/// Classification of a report line, used by the CLI for coloring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Header,
    Pass,
    Fail,
    Error,
    Skip,
    Aborted,
    Summary,
}

impl From<Status> for Tag {
    fn from(status: Status) -> Self {
        match status {
            Status::Pass => Tag::Pass,
            Status::Fail => Tag::Fail,
            Status::Error => Tag::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub tag: Tag,
    pub text: String,
}

impl ReportLine {
    fn new(tag: Tag, text: String) -> Self {
        Self { tag, text }
    }
}

/// Render a result as tagged lines
pub fn lines(result: &RunResult) -> Vec<ReportLine> {
    let mut lines = Vec::with_capacity(result.outcomes.len() + result.skipped.len() + 3);

    lines.push(ReportLine::new(
        Tag::Header,
        format!(
            "Scenario: {} ({})",
            single_line(&result.name),
            single_line(&result.source.display().to_string())
        ),
    ));

    for outcome in &result.outcomes {
        lines.push(ReportLine::new(outcome.status.into(), outcome_line(outcome)));
    }

    for skipped in &result.skipped {
        lines.push(ReportLine::new(
            Tag::Skip,
            format!(
                "[{}] {:<5} {}{}: not executed",
                skipped.index,
                "SKIP",
                skipped.kind,
                title_suffix(skipped.title.as_deref())
            ),
        ));
    }

    if result.final_state == RunState::Aborted {
        let reason = result.abort_reason.as_deref().unwrap_or("unknown");
        lines.push(ReportLine::new(
            Tag::Aborted,
            format!("Aborted: {}", single_line(reason)),
        ));
    }

    lines.push(ReportLine::new(
        Tag::Summary,
        format!(
            "Total: {}, Passed: {}, Failed: {}, Errors: {}, Skipped: {} -> {}",
            result.outcomes.len(),
            result.count(Status::Pass),
            result.count(Status::Fail),
            result.count(Status::Error),
            result.skipped.len(),
            result.status
        ),
    ));

    lines
}

/// Render a result as plain text lines
pub fn render(result: &RunResult) -> Vec<String> {
    lines(result).into_iter().map(|line| line.text).collect()
}

fn outcome_line(outcome: &StepOutcome) -> String {
    let index = if outcome.index == 0 {
        "-".to_string()
    } else {
        outcome.index.to_string()
    };
    format!(
        "[{}] {:<5} {}{}: {}",
        index,
        outcome.status.as_str(),
        outcome.kind,
        title_suffix(outcome.title.as_deref()),
        single_line(&outcome.message)
    )
}

fn title_suffix(title: Option<&str>) -> String {
    title
        .map(|t| format!(" \"{}\"", single_line(t)))
        .unwrap_or_default()
}

/// Keep one outcome per line
fn single_line(message: &str) -> String {
    message.trim_end().replace('\r', "").replace('\n', "\\n")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    status: Status,
    results: &'a [RunResult],
}

/// Render results as a pretty-printed JSON document
pub fn render_json(results: &[RunResult]) -> Result<String> {
    let report = JsonReport {
        status: overall(results),
        results,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn overall(results: &[RunResult]) -> Status {
    results
        .iter()
        .map(|r| r.status)
        .max()
        .unwrap_or(Status::Pass)
}

/// Process exit code: 0 when every result passed, 1 otherwise
pub fn exit_code(results: &[RunResult]) -> i32 {
    if overall(results) == Status::Pass {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::scenario::{Scenario, Step, StepBody};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn step(index: usize, kind: &str, title: Option<&str>) -> Step {
        Step {
            index,
            title: title.map(String::from),
            timeout: None,
            body: StepBody::Action {
                kind: kind.to_string(),
                params: Default::default(),
            },
        }
    }

    fn scenario(steps: Vec<Step>) -> Arc<Scenario> {
        Arc::new(Scenario {
            name: "login".to_string(),
            description: None,
            source: PathBuf::from("tests/login.yaml"),
            steps,
        })
    }

    #[test]
    fn test_render_completed_run() {
        let s = scenario(vec![step(1, "set", Some("seed")), step(2, "assert", None)]);
        let outcomes = vec![
            StepOutcome::pass(&s.steps[0], "set x", Duration::from_millis(3)),
            StepOutcome::fail(&s.steps[1], "expected \"5\" but got \"4\"", Duration::ZERO),
        ];
        let result = RunResult::new(s, outcomes, RunState::Completed, None);

        assert_eq!(
            render(&result),
            vec![
                "Scenario: login (tests/login.yaml)",
                "[1] PASS  set \"seed\": set x",
                "[2] FAIL  assert: expected \"5\" but got \"4\"",
                "Total: 2, Passed: 1, Failed: 1, Errors: 0, Skipped: 0 -> FAIL",
            ]
        );
        assert_eq!(exit_code(&[result]), 1);
    }

    #[test]
    fn test_render_aborted_run_lists_skipped_steps() {
        let s = scenario(vec![step(1, "http", None), step(2, "assert", None)]);
        let outcomes = vec![StepOutcome::error(
            &s.steps[0],
            &Error::capability("http", "connection refused"),
            Duration::ZERO,
        )];
        let result = RunResult::new(
            s,
            outcomes,
            RunState::Aborted,
            Some("step 1 reported ERROR".to_string()),
        );

        let rendered = render(&result);
        assert_eq!(
            rendered[1],
            "[1] ERROR http: Capability 'http' failed: connection refused"
        );
        assert_eq!(rendered[2], "[2] SKIP  assert: not executed");
        assert_eq!(rendered[3], "Aborted: step 1 reported ERROR");
        assert_eq!(
            rendered[4],
            "Total: 1, Passed: 0, Failed: 0, Errors: 1, Skipped: 1 -> ERROR"
        );
    }

    #[test]
    fn test_render_load_failure() {
        let result = RunResult::failed_before_run(
            PathBuf::from("missing.yaml"),
            "load",
            &Error::NotFound(PathBuf::from("/ws/missing.yaml")),
        );
        let rendered = render(&result);
        assert_eq!(
            rendered[1],
            "[-] ERROR load: Test file not found: /ws/missing.yaml"
        );
        assert_eq!(
            rendered.last().unwrap(),
            "Total: 1, Passed: 0, Failed: 0, Errors: 1, Skipped: 0 -> ERROR"
        );
    }

    #[test]
    fn test_multiline_messages_stay_on_one_line() {
        let s = scenario(vec![step(1, "shell", None)]);
        let outcomes = vec![StepOutcome::pass(&s.steps[0], "a\nb\n", Duration::ZERO)];
        let result = RunResult::new(s, outcomes, RunState::Completed, None);
        assert_eq!(render(&result)[1], "[1] PASS  shell: a\\nb");
    }

    #[test]
    fn test_multiline_titles_and_names_stay_on_one_line() {
        let s = Arc::new(Scenario {
            name: "login\nflow".to_string(),
            description: None,
            source: PathBuf::from("tests/login.yaml"),
            steps: vec![
                step(1, "set", Some("first\nline")),
                step(2, "assert", Some("never\r\nrun")),
            ],
        });
        let outcomes = vec![StepOutcome::pass(&s.steps[0], "set x", Duration::ZERO)];
        let result = RunResult::new(
            s,
            outcomes,
            RunState::Aborted,
            Some("cancelled\nby user".to_string()),
        );

        let rendered = render(&result);
        assert_eq!(
            rendered,
            vec![
                "Scenario: login\\nflow (tests/login.yaml)",
                "[1] PASS  set \"first\\nline\": set x",
                "[2] SKIP  assert \"never\\nrun\": not executed",
                "Aborted: cancelled\\nby user",
                "Total: 1, Passed: 1, Failed: 0, Errors: 0, Skipped: 1 -> ERROR",
            ]
        );
        assert!(rendered.iter().all(|line| !line.contains('\n')));
    }

    #[test]
    fn test_json_report_carries_codes_and_timings() {
        let s = scenario(vec![step(1, "set", None)]);
        let outcomes = vec![StepOutcome::error(
            &s.steps[0],
            &Error::Timeout {
                step: 1,
                after: Duration::from_secs(2),
            },
            Duration::from_millis(2000),
        )];
        let result = RunResult::new(s, outcomes, RunState::Aborted, Some("x".to_string()));

        let json: serde_json::Value =
            serde_json::from_str(&render_json(&[result]).unwrap()).unwrap();
        assert_eq!(json["status"], "error");
        let outcome = &json["results"][0]["outcomes"][0];
        assert_eq!(outcome["code"], "TIMEOUT");
        assert_eq!(outcome["elapsed_ms"], 2000);
        assert_eq!(json["results"][0]["final_state"], "aborted");
    }

    #[test]
    fn test_exit_code_zero_only_when_all_pass() {
        assert_eq!(exit_code(&[]), 0);
        let s = scenario(vec![step(1, "set", None)]);
        let pass = RunResult::new(
            s.clone(),
            vec![StepOutcome::pass(&s.steps[0], "ok", Duration::ZERO)],
            RunState::Completed,
            None,
        );
        assert_eq!(exit_code(&[pass]), 0);
    }
}
