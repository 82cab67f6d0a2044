//! `shell`: run a command through the configured shell

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::common::config::ShellConfig;
use crate::common::{Error, Result};
use crate::engine::capability::{required_param, Capability, CapabilityContext, CapabilityOutput};
use crate::scenario::Params;

/// Default export prefix
const DEFAULT_PREFIX: &str = "shell";

pub struct ShellCapability {
    program: String,
    arg: String,
}

impl ShellCapability {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            program: config.program.clone(),
            arg: config.arg.clone(),
        }
    }
}

fn trim_newline(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}

#[async_trait]
impl Capability for ShellCapability {
    fn kind(&self) -> &str {
        "shell"
    }

    fn required_params(&self) -> &[&'static str] {
        &["command"]
    }

    async fn invoke(
        &self,
        params: &Params,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityOutput> {
        let program = which::which(&self.program).map_err(|e| {
            Error::capability(self.kind(), format!("shell '{}' not found: {}", self.program, e))
        })?;

        let command = required_param(params, self.kind(), "command")?;
        let allow_failure = params
            .get("allow_failure")
            .map(|v| v.trim() == "true")
            .unwrap_or(false);
        let prefix = params.get("as").map(String::as_str).unwrap_or(DEFAULT_PREFIX);

        tracing::debug!(step = ctx.step, command = %command, "Running shell command");

        // kill_on_drop so a timed-out or cancelled step does not leave the child running
        let output = Command::new(program)
            .arg(&self.arg)
            .arg(command)
            .current_dir(ctx.workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::capability(self.kind(), format!("failed to start: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = output.status.code();

        if !output.status.success() && !allow_failure {
            return Err(Error::capability(
                self.kind(),
                format!(
                    "'{}' exited with {}: {}",
                    command,
                    code.map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".to_string()),
                    trim_newline(&stderr)
                ),
            ));
        }

        let code_text = code.map(|c| c.to_string()).unwrap_or_default();
        Ok(CapabilityOutput::new(format!("'{}' exited with {}", command, code_text))
            .export(format!("{}.stdout", prefix), trim_newline(&stdout))
            .export(format!("{}.stderr", prefix), trim_newline(&stderr))
            .export(format!("{}.exit_code", prefix), code_text))
    }
}
