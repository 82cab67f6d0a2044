//! Evaluation of assertion comparisons

use regex::Regex;

use crate::scenario::Comparison;

/// Result of a comparison that could be evaluated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub passed: bool,
    pub message: String,
}

impl Check {
    fn new(passed: bool, message: String) -> Self {
        Self { passed, message }
    }
}

fn number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Compare `actual` against `expected`
///
/// Returns `Err` only when the expected operand itself is malformed (an
/// invalid regex or range); a value that does not satisfy the comparison is
/// a failed `Check`.
pub fn evaluate(op: Comparison, actual: &str, expected: &str) -> Result<Check, String> {
    let check = match op {
        Comparison::Equals => {
            let passed = values_equal(actual, expected);
            Check::new(
                passed,
                if passed {
                    format!("\"{}\" equals \"{}\"", actual, expected)
                } else {
                    format!("expected \"{}\" but got \"{}\"", expected, actual)
                },
            )
        }
        Comparison::NotEquals => {
            let passed = !values_equal(actual, expected);
            Check::new(
                passed,
                if passed {
                    format!("\"{}\" differs from \"{}\"", actual, expected)
                } else {
                    format!("expected a value other than \"{}\"", expected)
                },
            )
        }
        Comparison::Contains => {
            let passed = actual.contains(expected);
            Check::new(
                passed,
                if passed {
                    format!("\"{}\" contains \"{}\"", actual, expected)
                } else {
                    format!("\"{}\" does not contain \"{}\"", actual, expected)
                },
            )
        }
        Comparison::GreaterThan => numeric(actual, expected, ">", |a, e| a > e),
        Comparison::LessThan => numeric(actual, expected, "<", |a, e| a < e),
        Comparison::Matches => {
            let re = Regex::new(expected)
                .map_err(|e| format!("invalid regex '{}': {}", expected, e))?;
            let passed = re.is_match(actual);
            Check::new(
                passed,
                if passed {
                    format!("\"{}\" matches /{}/", actual, expected)
                } else {
                    format!("\"{}\" does not match /{}/", actual, expected)
                },
            )
        }
        Comparison::InRange => {
            let ranges = parse_ranges(expected)?;
            match number(actual) {
                Some(value) => {
                    let passed = ranges.iter().any(|(lo, hi)| value >= *lo && value <= *hi);
                    Check::new(
                        passed,
                        if passed {
                            format!("{} is within {}", actual, expected)
                        } else {
                            format!("{} is outside {}", actual, expected)
                        },
                    )
                }
                None => Check::new(false, format!("\"{}\" is not a number", actual)),
            }
        }
    };
    Ok(check)
}

/// Compare every selected `(pointer, value)` pair against `expected`
///
/// Without `count` each value must pass and an empty selection fails. With
/// `count` the number of passing values must fall within that range list.
pub fn evaluate_selection(
    op: Comparison,
    path: &str,
    selected: &[(String, String)],
    expected: &str,
    count: Option<&str>,
) -> Result<Check, String> {
    let checks = selected
        .iter()
        .map(|(at, actual)| Ok((at.as_str(), evaluate(op, actual, expected)?)))
        .collect::<Result<Vec<_>, String>>()?;

    if let Some(range) = count {
        let ranges = parse_ranges(range)?;
        let passing = checks.iter().filter(|(_, check)| check.passed).count();
        let passed = ranges
            .iter()
            .any(|(lo, hi)| passing as f64 >= *lo && passing as f64 <= *hi);
        let summary = format!(
            "{} of {} values at '{}' satisfy {} \"{}\"",
            passing,
            checks.len(),
            path,
            op,
            expected
        );
        return Ok(Check::new(
            passed,
            if passed {
                format!("{}, within {}", summary, range)
            } else {
                format!("{}, expected {}", summary, range)
            },
        ));
    }

    if checks.is_empty() {
        return Ok(Check::new(false, format!("no value at path '{}'", path)));
    }
    if let Some((at, check)) = checks.iter().find(|(_, check)| !check.passed) {
        return Ok(Check::new(false, format!("{}: {}", at, check.message)));
    }
    Ok(match checks.as_slice() {
        [(at, check)] => Check::new(true, format!("{}: {}", at, check.message)),
        _ => Check::new(
            true,
            format!(
                "all {} values at '{}' satisfy {} \"{}\"",
                checks.len(),
                path,
                op,
                expected
            ),
        ),
    })
}

/// String equality, or numeric equality when both sides are numbers
fn values_equal(actual: &str, expected: &str) -> bool {
    if actual == expected {
        return true;
    }
    matches!((number(actual), number(expected)), (Some(a), Some(e)) if a == e)
}

fn numeric(actual: &str, expected: &str, symbol: &str, cmp: fn(f64, f64) -> bool) -> Check {
    match (number(actual), number(expected)) {
        (Some(a), Some(e)) => {
            let passed = cmp(a, e);
            Check::new(
                passed,
                if passed {
                    format!("{} {} {}", actual, symbol, expected)
                } else {
                    format!("expected {} {} {}", actual, symbol, expected)
                },
            )
        }
        (None, _) => Check::new(false, format!("\"{}\" is not a number", actual)),
        (_, None) => Check::new(false, format!("\"{}\" is not a number", expected)),
    }
}

/// Parse a comma-separated range list into inclusive bounds
///
/// Items are `a-b`, `a+` (a and above), `a-` (a and below), or a single value.
fn parse_ranges(text: &str) -> Result<Vec<(f64, f64)>, String> {
    let invalid = || format!("invalid range '{}'", text);

    text.split(',')
        .map(|item| {
            let item = item.trim();
            if let Some(lo) = item.strip_suffix('+') {
                return number(lo).map(|lo| (lo, f64::INFINITY)).ok_or_else(invalid);
            }
            if let Some(hi) = item.strip_suffix('-') {
                return number(hi).map(|hi| (f64::NEG_INFINITY, hi)).ok_or_else(invalid);
            }
            match range_separator(item) {
                Some(pos) => {
                    let (lo, hi) = item.split_at(pos);
                    match (number(lo), number(&hi[1..])) {
                        (Some(lo), Some(hi)) if lo <= hi => Ok((lo, hi)),
                        _ => Err(invalid()),
                    }
                }
                None => number(item).map(|v| (v, v)).ok_or_else(invalid),
            }
        })
        .collect()
}

/// Position of the `-` between the bounds of `a-b`
///
/// A leading sign and the sign of an exponent (`1e-5`) are not separators.
fn range_separator(item: &str) -> Option<usize> {
    let bytes = item.as_bytes();
    (1..bytes.len()).find(|&i| bytes[i] == b'-' && !matches!(bytes[i - 1], b'e' | b'E'))
}
