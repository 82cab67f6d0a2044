//! Error types for the scenario runner
//!
//! Every failure a step can hit is an `Error` variant so the executor can
//! turn it into a step outcome instead of unwinding the run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === Loading Errors ===
    #[error("Test file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse '{}' at line {line}, column {column}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid scenario{}: {message}", .step.map(|s| format!(" (step {s})")).unwrap_or_default())]
    Schema {
        step: Option<usize>,
        message: String,
    },

    // === Execution Errors ===
    #[error("Unresolved property \"{key}\" in step {step}")]
    UnresolvedProperty { key: String, step: usize },

    #[error("Capability '{kind}' failed: {message}")]
    Capability { kind: String, message: String },

    #[error("Step {step} timed out after {} ms", .after.as_millis())]
    Timeout {
        step: usize,
        after: std::time::Duration,
    },

    #[error("Run cancelled")]
    Cancelled,

    // === Configuration Errors ===
    #[error("Invalid properties file '{}' at line {line}: {message}", .path.display())]
    PropertiesParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a schema error attached to a step
    pub fn schema(step: usize, message: impl Into<String>) -> Self {
        Self::Schema {
            step: Some(step),
            message: message.into(),
        }
    }

    /// Create a schema error about the document as a whole
    pub fn document(message: impl Into<String>) -> Self {
        Self::Schema {
            step: None,
            message: message.into(),
        }
    }

    /// Create a capability failure error
    pub fn capability(kind: &str, message: impl Into<String>) -> Self {
        Self::Capability {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Stable machine-readable code, used by the JSON report
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NOT_FOUND",
            Error::Parse { .. } => "PARSE_ERROR",
            Error::Schema { .. } => "SCHEMA_ERROR",
            Error::UnresolvedProperty { .. } => "UNRESOLVED_PROPERTY",
            Error::Capability { .. } => "CAPABILITY_ERROR",
            Error::Timeout { .. } => "TIMEOUT",
            Error::Cancelled => "CANCELLED",
            Error::PropertiesParse { .. } => "PROPERTIES_ERROR",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG_ERROR",
            Error::Io(_) | Error::FileRead { .. } => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unresolved_property_names_key_and_step() {
        let err = Error::UnresolvedProperty {
            key: "missing".to_string(),
            step: 3,
        };
        assert_eq!(err.to_string(), "Unresolved property \"missing\" in step 3");
        assert_eq!(err.code(), "UNRESOLVED_PROPERTY");
    }

    #[test]
    fn test_schema_message_with_and_without_step() {
        assert_eq!(
            Error::schema(2, "unknown kind 'foo'").to_string(),
            "Invalid scenario (step 2): unknown kind 'foo'"
        );
        assert_eq!(
            Error::document("missing 'steps'").to_string(),
            "Invalid scenario: missing 'steps'"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = Error::Timeout {
            step: 1,
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Step 1 timed out after 250 ms");
    }
}
