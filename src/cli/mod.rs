//! CLI command handling
//!
//! Resolves paths, loads configuration and properties, runs scenarios and
//! prints their reports.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use colored::{ColoredString, Colorize};

use crate::commands::{Commands, OutputFormat};
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::engine::{CancelToken, RunResult, ScenarioRunner, Status};
use crate::properties;
use crate::report::{self, ReportLine, Tag};

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            tests,
            workspace,
            properties,
            config,
            keep_going,
            fail_fast,
            format,
            no_color,
        } => {
            if no_color {
                colored::control::set_override(false);
            }

            let workspace = match workspace {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            if !workspace.is_dir() {
                return Err(Error::Config(format!(
                    "workspace '{}' is not a directory",
                    workspace.display()
                )));
            }

            let tests = if tests.is_empty() {
                prompt_tests()?
            } else {
                tests
            };
            for test in &tests {
                let resolved = paths::resolve_in(&workspace, test);
                if !resolved.is_file() {
                    return Err(Error::NotFound(resolved));
                }
            }

            if let Some(file) = &properties {
                if !file.is_file() {
                    return Err(Error::Config(format!(
                        "properties file '{}' not found",
                        file.display()
                    )));
                }
            }

            let mut config = load_config(config.as_deref())?;
            if keep_going {
                config.runner.abort_on_error = false;
            }
            if fail_fast {
                config.runner.abort_on_error = true;
                config.runner.abort_on_fail = true;
            }

            if format == OutputFormat::Text {
                println!(
                    "{} {}",
                    "tson".bold(),
                    env!("CARGO_PKG_VERSION").dimmed()
                );
            }

            let results = run_tests(&workspace, properties.as_deref(), &config, &tests).await?;

            match format {
                OutputFormat::Text => {
                    for result in &results {
                        println!();
                        print_report(result);
                    }
                }
                OutputFormat::Json => println!("{}", report::render_json(&results)?),
            }

            Ok(report::exit_code(&results))
        }

        Commands::Config { config } => {
            let (path, loaded) = match config {
                Some(path) => {
                    let loaded = Config::load_from(&path)?;
                    (Some(path), loaded)
                }
                None => (paths::config_path(), Config::load()?),
            };

            match path {
                Some(path) => {
                    let state = if path.is_file() { "" } else { " (not found, using defaults)" };
                    println!("Config file: {}{}", path.display(), state);
                }
                None => println!("Config file: (no config directory)"),
            }
            if let Some(global) = paths::global_properties_path() {
                println!("Global properties: {}", global.display());
            }
            println!();

            let rendered =
                toml::to_string_pretty(&loaded).map_err(|e| Error::Config(e.to_string()))?;
            print!("{}", rendered);
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Ask for a test file on stdin
fn prompt_tests() -> Result<Vec<PathBuf>> {
    eprint!("Test file: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::Config("no test file given".to_string()));
    }
    Ok(vec![PathBuf::from(line)])
}

async fn run_tests(
    workspace: &Path,
    custom_properties: Option<&Path>,
    config: &Config,
    tests: &[PathBuf],
) -> Result<Vec<RunResult>> {
    let file_properties = match properties::load_layered(workspace, custom_properties) {
        Ok(values) => values,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load properties");
            return Ok(tests
                .iter()
                .map(|test| RunResult::failed_before_run(test.clone(), "properties", &e))
                .collect());
        }
    };

    let runner = ScenarioRunner::new(workspace, file_properties, config)?;

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            trigger.cancel();
        }
    });

    Ok(runner.run_batch(tests, &cancel).await)
}

fn print_report(result: &RunResult) {
    for line in report::lines(result) {
        println!("{}", colorize(&line, result.status));
    }
}

fn colorize(line: &ReportLine, overall: Status) -> ColoredString {
    let text = line.text.as_str();
    match line.tag {
        Tag::Header => text.bold(),
        Tag::Pass => text.green(),
        Tag::Fail => text.yellow(),
        Tag::Error => text.red(),
        Tag::Skip => text.dimmed(),
        Tag::Aborted => text.red().bold(),
        Tag::Summary => match overall {
            Status::Pass => text.green().bold(),
            Status::Fail => text.yellow().bold(),
            Status::Error => text.red().bold(),
        },
    }
}
