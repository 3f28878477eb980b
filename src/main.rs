mod engine;
mod logging;
mod repl;

#[cfg(test)]
mod test_utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// A small Lisp interpreter.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(name = "mlisp", bin_name = "mlisp")]
struct Cli {
    /// Path to a script to run. Starts a REPL when omitted.
    script: Option<PathBuf>,
}

#[tracing::instrument]
fn main() -> Result<ExitCode> {
    logging::init_logging();

    let cli = Cli::parse();
    info!(?cli, "Parsed CLI arguments");

    match cli.script {
        Some(path) => run_script(&path),
        None => {
            repl::start()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_script(path: &PathBuf) -> Result<ExitCode> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("could not read script {}", path.display()))?;

    let interpreter = engine::eval::Interpreter::new();

    match engine::run_source(&source, &interpreter, &mut io::stderr()) {
        Ok(value) => {
            println!("=> {value}");
            Ok(ExitCode::SUCCESS)
        }
        // Scan diagnostics were already written line by line.
        Err(engine::error::RunError::Scan) => Ok(ExitCode::FAILURE),
        Err(err) => {
            eprintln!("{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
