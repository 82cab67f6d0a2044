//! CLI command definitions
//!
//! Defines the clap commands for the tson CLI.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more test scenarios
    Run {
        /// Test-definition file, relative to the workspace (repeatable)
        #[arg(long = "test", short = 't')]
        tests: Vec<PathBuf>,

        /// Workspace directory (default: current directory)
        #[arg(long, short = 'w')]
        workspace: Option<PathBuf>,

        /// Properties file layered above global and local properties
        #[arg(long, short = 'p')]
        properties: Option<PathBuf>,

        /// Configuration file (default: platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep executing steps after an Error outcome
        #[arg(long, conflicts_with = "fail_fast")]
        keep_going: bool,

        /// Stop at the first Fail or Error outcome
        #[arg(long)]
        fail_fast: bool,

        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the configuration file location and effective values
    Config {
        /// Configuration file (default: platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
