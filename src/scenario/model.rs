//! In-memory scenario types
//!
//! A loaded scenario is immutable: parameter values are kept raw and only
//! substituted when a step executes.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Step kind used for assertion steps in documents
pub const ASSERT_KIND: &str = "assert";

/// Raw (unsubstituted) parameters of an action step
pub type Params = BTreeMap<String, String>;

/// One loaded test-definition document
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Scenario name, defaults to the file stem
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Path of the document the scenario was loaded from
    pub source: PathBuf,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

/// A single unit of work within a scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// 1-based position in the scenario
    pub index: usize,
    /// Optional label shown in the report
    pub title: Option<String>,
    /// Per-step bound overriding the configured default
    pub timeout: Option<Duration>,
    pub body: StepBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepBody {
    /// Invoke the capability registered for `kind`
    Action { kind: String, params: Params },
    /// Compare two values after substitution
    Assertion(Assertion),
}

/// A comparison between an actual and an expected value
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub op: Comparison,
    pub subject: Subject,
    pub expected: String,
    /// Range the number of passing selected values must fall in
    ///
    /// When absent every selected value must pass.
    pub count: Option<String>,
}

/// What an assertion compares against its expected value
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// A single templated value
    Value(String),
    /// Each value `path` selects from the JSON text `from`
    Json { from: String, path: String },
}

impl Step {
    /// Kind string of the step (`assert` for assertions)
    pub fn kind(&self) -> &str {
        match &self.body {
            StepBody::Action { kind, .. } => kind,
            StepBody::Assertion(_) => ASSERT_KIND,
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self.body, StepBody::Assertion(_))
    }
}

/// Comparison operators available to assertion steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Matches,
    InRange,
}

impl Comparison {
    pub const ALL: [Comparison; 7] = [
        Comparison::Equals,
        Comparison::NotEquals,
        Comparison::Contains,
        Comparison::GreaterThan,
        Comparison::LessThan,
        Comparison::Matches,
        Comparison::InRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Equals => "equals",
            Comparison::NotEquals => "not_equals",
            Comparison::Contains => "contains",
            Comparison::GreaterThan => "greater_than",
            Comparison::LessThan => "less_than",
            Comparison::Matches => "matches",
            Comparison::InRange => "in_range",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparison {
    type Err = String;

    /// Accepts snake_case names and their camelCase spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Comparison::Equals),
            "not_equals" | "notEquals" => Ok(Comparison::NotEquals),
            "contains" => Ok(Comparison::Contains),
            "greater_than" | "greaterThan" => Ok(Comparison::GreaterThan),
            "less_than" | "lessThan" => Ok(Comparison::LessThan),
            "matches" => Ok(Comparison::Matches),
            "in_range" | "inRange" => Ok(Comparison::InRange),
            _ => {
                let known: Vec<&str> = Comparison::ALL.iter().map(|c| c.as_str()).collect();
                Err(format!(
                    "unknown comparison '{}'. Supported: {}",
                    s,
                    known.join(", ")
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_accepts_both_spellings() {
        assert_eq!("greater_than".parse(), Ok(Comparison::GreaterThan));
        assert_eq!("greaterThan".parse(), Ok(Comparison::GreaterThan));
        assert_eq!("inRange".parse(), Ok(Comparison::InRange));
    }

    #[test]
    fn test_unknown_comparison_lists_supported() {
        let err = "approx".parse::<Comparison>().unwrap_err();
        assert!(err.contains("approx"));
        assert!(err.contains("less_than"));
    }
}
