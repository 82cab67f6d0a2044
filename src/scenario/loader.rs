//! Scenario document loading
//!
//! Documents are JSON or YAML. Parsing happens in two passes: text into a
//! generic value (syntax errors carry line/column), then the value into
//! typed steps (schema errors carry the step index). No property
//! substitution happens here.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::common::paths::resolve_in;
use crate::common::{Error, Result};
use crate::engine::CapabilityRegistry;

use super::model::{
    Assertion, Comparison, Params, Scenario, Step, StepBody, Subject, ASSERT_KIND,
};

/// Keys of a step entry that are not passed to the capability
const RESERVED_KEYS: [&str; 3] = ["kind", "title", "timeout"];

/// Document syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// `.json` files are JSON, everything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Top-level document shape
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Document {
    name: Option<String>,
    description: Option<String>,
    steps: Vec<Value>,
}

/// Load a scenario from `path`, resolved relative to `workspace`
pub fn load(path: &Path, workspace: &Path, registry: &CapabilityRegistry) -> Result<Scenario> {
    let resolved = resolve_in(workspace, path);
    if !resolved.is_file() {
        return Err(Error::NotFound(resolved));
    }

    let content =
        std::fs::read_to_string(&resolved).map_err(|e| Error::file_read(&resolved, e))?;

    let scenario = parse(&content, Format::from_path(&resolved), path, registry)?;
    tracing::debug!(
        path = %resolved.display(),
        steps = scenario.steps.len(),
        "Loaded scenario"
    );
    Ok(scenario)
}

/// Parse scenario text; `source` is recorded on the scenario and used in errors
pub fn parse(
    content: &str,
    format: Format,
    source: &Path,
    registry: &CapabilityRegistry,
) -> Result<Scenario> {
    let value = parse_value(content, format, source)?;

    if !value.is_object() {
        return Err(Error::document(
            "document must be a mapping with a 'steps' list",
        ));
    }
    let document: Document =
        serde_json::from_value(value).map_err(|e| Error::document(e.to_string()))?;

    let steps = document
        .steps
        .into_iter()
        .enumerate()
        .map(|(i, raw)| parse_step(i + 1, raw, registry))
        .collect::<Result<Vec<_>>>()?;

    let name = document.name.unwrap_or_else(|| {
        source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string())
    });

    Ok(Scenario {
        name,
        description: document.description,
        source: source.to_path_buf(),
        steps,
    })
}

fn parse_value(content: &str, format: Format, source: &Path) -> Result<Value> {
    match format {
        Format::Json => serde_json::from_str(content).map_err(|e| Error::Parse {
            path: source.to_path_buf(),
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| {
            let (line, column) = e
                .location()
                .map(|l| (l.line(), l.column()))
                .unwrap_or((0, 0));
            Error::Parse {
                path: source.to_path_buf(),
                line,
                column,
                message: e.to_string(),
            }
        }),
    }
}

fn parse_step(index: usize, raw: Value, registry: &CapabilityRegistry) -> Result<Step> {
    let Value::Object(mut map) = raw else {
        return Err(Error::schema(index, "step must be a mapping"));
    };

    let kind = match map.remove("kind") {
        Some(Value::String(kind)) if !kind.trim().is_empty() => kind,
        Some(_) => return Err(Error::schema(index, "'kind' must be a non-empty string")),
        None => return Err(Error::schema(index, "missing required field 'kind'")),
    };

    let title = match map.remove("title") {
        None | Some(Value::Null) => None,
        Some(value) => Some(scalar_to_string(&value)),
    };

    let timeout = match map.remove("timeout") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_timeout(index, &value)?),
    };

    let params: Params = map
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), scalar_to_string(value)))
        .collect();

    let body = if kind == ASSERT_KIND {
        StepBody::Assertion(parse_assertion(index, params)?)
    } else {
        let capability = registry.get(&kind).ok_or_else(|| {
            Error::schema(
                index,
                format!(
                    "unknown step kind '{}'. Supported: {}, {}",
                    kind,
                    registry.kinds().join(", "),
                    ASSERT_KIND
                ),
            )
        })?;
        capability
            .validate(&params)
            .map_err(|message| Error::schema(index, format!("{}: {}", kind, message)))?;
        StepBody::Action { kind, params }
    };

    Ok(Step {
        index,
        title,
        timeout,
        body,
    })
}

fn parse_assertion(index: usize, mut params: Params) -> Result<Assertion> {
    let op = match params.remove("op") {
        Some(op) => op
            .parse::<Comparison>()
            .map_err(|message| Error::schema(index, message))?,
        None => Comparison::Equals,
    };

    let subject = match (
        params.remove("actual"),
        params.remove("from"),
        params.remove("path"),
    ) {
        (Some(actual), None, None) => Subject::Value(actual),
        (None, Some(from), Some(path)) => Subject::Json { from, path },
        (Some(_), _, _) => {
            return Err(Error::schema(
                index,
                "assert: 'actual' cannot be combined with 'from' and 'path'",
            ))
        }
        (None, Some(_), None) => {
            return Err(Error::schema(index, "assert: 'from' requires 'path'"))
        }
        (None, None, Some(_)) => {
            return Err(Error::schema(index, "assert: 'path' requires 'from'"))
        }
        (None, None, None) => {
            return Err(Error::schema(
                index,
                "assert: missing required parameter 'actual' (or 'from' and 'path')",
            ))
        }
    };
    let expected = params
        .remove("expected")
        .ok_or_else(|| Error::schema(index, "assert: missing required parameter 'expected'"))?;

    let count = params.remove("count");
    if count.is_some() && matches!(subject, Subject::Value(_)) {
        return Err(Error::schema(index, "assert: 'count' requires 'from' and 'path'"));
    }

    if let Some(extra) = params.keys().next() {
        return Err(Error::schema(
            index,
            format!("assert: unknown parameter '{}'", extra),
        ));
    }

    Ok(Assertion {
        op,
        subject,
        expected,
        count,
    })
}

fn parse_timeout(index: usize, value: &Value) -> Result<Duration> {
    value
        .as_f64()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| Error::schema(index, "'timeout' must be a positive number of seconds"))
}

/// Render a parameter value as text
///
/// Scalars keep their textual form; mappings and sequences become compact JSON.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Config;

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::with_builtins(&Config::default()).unwrap()
    }

    fn parse_yaml(content: &str) -> Result<Scenario> {
        parse(content, Format::Yaml, Path::new("login.yaml"), &registry())
    }

    #[test]
    fn test_parse_actions_and_assertions() {
        let scenario = parse_yaml(
            r#"
name: set and check
steps:
  - kind: set
    title: seed
    x: 5
  - kind: assert
    op: greaterThan
    actual: "{{x}}"
    expected: 3
"#,
        )
        .unwrap();

        assert_eq!(scenario.name, "set and check");
        assert_eq!(scenario.steps.len(), 2);

        let first = &scenario.steps[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.title.as_deref(), Some("seed"));
        match &first.body {
            StepBody::Action { kind, params } => {
                assert_eq!(kind, "set");
                assert_eq!(params["x"], "5");
            }
            _ => panic!("Expected action step"),
        }

        match &scenario.steps[1].body {
            StepBody::Assertion(a) => {
                assert_eq!(a.op, Comparison::GreaterThan);
                assert_eq!(a.subject, Subject::Value("{{x}}".to_string()));
                assert_eq!(a.expected, "3");
                assert_eq!(a.count, None);
            }
            _ => panic!("Expected assertion step"),
        }
    }

    #[test]
    fn test_name_defaults_to_file_stem() {
        let scenario = parse_yaml("steps: []").unwrap();
        assert_eq!(scenario.name, "login");
        assert!(scenario.steps.is_empty());
    }

    #[test]
    fn test_nested_values_become_json_text() {
        let scenario = parse_yaml(
            r#"
steps:
  - kind: set
    payload:
      user: alice
      roles: [admin]
"#,
        )
        .unwrap();
        match &scenario.steps[0].body {
            StepBody::Action { params, .. } => {
                assert_eq!(params["payload"], r#"{"roles":["admin"],"user":"alice"}"#);
            }
            _ => panic!("Expected action step"),
        }
    }

    #[test]
    fn test_json_syntax_error_has_location() {
        let err = parse(
            "{\n  \"steps\": [\n    {\"kind\": }\n  ]\n}",
            Format::Json,
            Path::new("bad.json"),
            &registry(),
        )
        .unwrap_err();
        match err {
            Error::Parse { line, column, .. } => {
                assert_eq!(line, 3);
                assert!(column > 0);
            }
            other => panic!("Expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_yaml_syntax_error_is_parse_error() {
        let err = parse_yaml("steps:\n  - kind: set\n   x: [1, 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_unknown_kind_is_schema_error_with_step() {
        let err = parse_yaml("steps:\n  - kind: set\n    a: 1\n  - kind: teleport\n").unwrap_err();
        match err {
            Error::Schema { step, message } => {
                assert_eq!(step, Some(2));
                assert!(message.contains("teleport"));
            }
            other => panic!("Expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_parameter_is_schema_error() {
        let err = parse_yaml("steps:\n  - kind: sleep\n").unwrap_err();
        match err {
            Error::Schema { step, message } => {
                assert_eq!(step, Some(1));
                assert!(message.contains("ms"));
            }
            other => panic!("Expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_assertion_requires_operands() {
        let err = parse_yaml("steps:\n  - kind: assert\n    actual: 1\n").unwrap_err();
        assert!(err.to_string().contains("expected"));
    }

    #[test]
    fn test_assertion_over_json_selection() {
        let scenario = parse_yaml(
            r#"
steps:
  - kind: assert
    from: "{{response.body}}"
    path: items.*.status
    op: equals
    expected: ok
    count: 2+
"#,
        )
        .unwrap();
        match &scenario.steps[0].body {
            StepBody::Assertion(a) => {
                assert_eq!(
                    a.subject,
                    Subject::Json {
                        from: "{{response.body}}".to_string(),
                        path: "items.*.status".to_string(),
                    }
                );
                assert_eq!(a.count.as_deref(), Some("2+"));
            }
            _ => panic!("Expected assertion step"),
        }
    }

    #[test]
    fn test_assertion_subject_combinations_are_checked() {
        let cases = [
            ("actual: 1\n    path: a\n    from: \"{}\"", "cannot be combined"),
            ("path: a", "'path' requires 'from'"),
            ("from: \"{}\"", "'from' requires 'path'"),
            ("actual: 1\n    count: 1", "'count' requires"),
        ];
        for (body, message) in cases {
            let doc = format!("steps:\n  - kind: assert\n    expected: 1\n    {}\n", body);
            let err = parse_yaml(&doc).unwrap_err();
            assert!(err.to_string().contains(message), "{}: {}", body, err);
        }
    }

    #[test]
    fn test_missing_steps_is_schema_error() {
        let err = parse_yaml("name: nothing\n").unwrap_err();
        assert!(matches!(err, Error::Schema { step: None, .. }));
    }

    #[test]
    fn test_step_timeout_in_seconds() {
        let scenario = parse_yaml("steps:\n  - kind: sleep\n    ms: 10\n    timeout: 0.5\n").unwrap();
        assert_eq!(scenario.steps[0].timeout, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_out_of_range_timeout_is_schema_error() {
        for value in ["1e30", "-1", "0", "\"soon\""] {
            let doc = format!("steps:\n  - kind: sleep\n    ms: 1\n    timeout: {}\n", value);
            let err = parse_yaml(&doc).unwrap_err();
            assert!(
                matches!(err, Error::Schema { step: Some(1), .. }),
                "timeout {}: {:?}",
                value,
                err
            );
        }
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Path::new("absent.yaml"), dir.path(), &registry()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
