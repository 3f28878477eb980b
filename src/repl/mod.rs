mod highlighter;
mod history;

use crate::engine::error::RunError;
use crate::engine::eval::Interpreter;
use crate::repl::highlighter::ReplHelper;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::io;
use tracing::{info, warn};

const PROMPT: &str = "> ";

/// Runs the interactive session. Definitions persist between lines so a
/// function defined on one line is callable on the next.
#[tracing::instrument]
pub fn start() -> anyhow::Result<()> {
    info!("Starting REPL session");
    let interpreter = Interpreter::new();
    let mut rl = Editor::<ReplHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(ReplHelper::new()));

    let history_path = history::get_history_path();

    match history_path {
        Some(ref path) => history::load_history_from_path(&mut rl, path),
        None => warn!("Could not determine history file path. History will not be saved."),
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();

                if input.is_empty() {
                    continue;
                }

                if let Err(err) = rl.add_history_entry(input) {
                    warn!("Failed to add line to history: {}", err);
                }

                if input == "exit" {
                    info!("Exiting REPL session via user command.");
                    break;
                }

                match crate::engine::run_source(input, &interpreter, &mut io::stderr()) {
                    Ok(value) => println!("=> {value}"),
                    // Scan diagnostics already went to stderr line by line.
                    Err(RunError::Scan) => {}
                    Err(err) => eprintln!("{err}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // A bare Ctrl-C discards the line but keeps the session.
                continue;
            }
            Err(ReadlineError::Eof) => {
                info!("REPL EOF detected (Ctrl-D).");
                break;
            }
            Err(err) => {
                eprintln!("Readline error: {err:?}");
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        history::save_history_to_path(&mut rl, path);
    }

    Ok(())
}
