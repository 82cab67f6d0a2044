//! tson - scenario test runner
//!
//! Loads test-definition documents, executes their steps against a layered
//! property set and prints a line-based report.

use clap::Parser;
use std::path::PathBuf;
use tson::{cli, commands, common};
use commands::Commands;

#[derive(Parser)]
#[command(name = "tson", about = "Scenario-driven test runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging for this crate
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = common::logging::init_cli(cli.verbose, cli.log_file.as_deref());

    let code = match cli::dispatch(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    // Flush the log file before exiting
    drop(guard);
    std::process::exit(code);
}
