//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Continuation policy for failed steps
    #[serde(default)]
    pub runner: RunnerConfig,

    /// HTTP capability settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Shell capability settings
    #[serde(default)]
    pub shell: ShellConfig,
}

/// Timeout settings in seconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Timeouts {
    /// Bound applied to every step that does not declare its own timeout
    #[serde(default = "default_step")]
    pub step_default_secs: u64,

    /// Connect timeout for HTTP requests
    #[serde(default = "default_http_connect")]
    pub http_connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            step_default_secs: default_step(),
            http_connect_secs: default_http_connect(),
        }
    }
}

impl Timeouts {
    pub fn step_default(&self) -> Duration {
        Duration::from_secs(self.step_default_secs)
    }

    pub fn http_connect(&self) -> Duration {
        Duration::from_secs(self.http_connect_secs)
    }
}

fn default_step() -> u64 {
    30
}
fn default_http_connect() -> u64 {
    10
}

/// Whether a step outcome stops the remaining steps
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Abort remaining steps after a step reports Error
    #[serde(default = "default_true")]
    pub abort_on_error: bool,

    /// Abort remaining steps after an assertion reports Fail
    #[serde(default)]
    pub abort_on_fail: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            abort_on_error: true,
            abort_on_fail: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// HTTP capability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Prefix applied to relative request URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            base_url: None,
        }
    }
}

fn default_user_agent() -> String {
    format!("tson-runner/{}", env!("CARGO_PKG_VERSION"))
}

/// Shell capability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellConfig {
    /// Shell program used to run `shell` steps
    #[serde(default = "default_shell")]
    pub program: String,

    /// Argument that introduces the command string
    #[serde(default = "default_shell_arg")]
    pub arg: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: default_shell(),
            arg: default_shell_arg(),
        }
    }
}

#[cfg(windows)]
fn default_shell() -> String {
    "cmd".to_string()
}
#[cfg(not(windows))]
fn default_shell() -> String {
    "sh".to_string()
}

#[cfg(windows)]
fn default_shell_arg() -> String {
    "/C".to_string()
}
#[cfg(not(windows))]
fn default_shell_arg() -> String {
    "-c".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from an explicit file, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.timeouts.step_default_secs, 30);
        assert!(config.runner.abort_on_error);
        assert!(!config.runner.abort_on_fail);
        assert!(config.http.base_url.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
[timeouts]
step_default_secs = 5

[runner]
abort_on_fail = true

[http]
base_url = "http://localhost:8080"
"#,
        )
        .unwrap();
        assert_eq!(config.timeouts.step_default(), Duration::from_secs(5));
        assert_eq!(config.timeouts.http_connect_secs, 10);
        assert!(config.runner.abort_on_error);
        assert!(config.runner.abort_on_fail);
        assert_eq!(config.http.base_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::parse("[timeouts\nstep_default_secs = 1").unwrap_err();
        assert!(matches!(err, crate::common::Error::ConfigParse(_)));
    }
}
