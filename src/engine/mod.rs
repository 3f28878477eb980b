//! The core Lisp engine: scanner, parser, AST, evaluator, environments,
//! and the builtin library.

pub mod ast;
pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod list;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

use crate::engine::error::RunError;
use crate::engine::eval::Interpreter;
use crate::engine::parser::Parser;
use crate::engine::scanner::Scanner;
use crate::engine::value::Value;
use std::io;
use tracing::instrument;

/// Runs a unit of source text through the whole pipeline against the
/// given interpreter, returning the value of the last expression.
///
/// Lexical diagnostics stream to `sink` as they are found; when any
/// occur the run aborts before parsing.
#[instrument(skip_all)]
pub fn run_source(
    source: &str,
    interpreter: &Interpreter,
    sink: &mut dyn io::Write,
) -> Result<Value, RunError> {
    let (tokens, ok) = Scanner::new(source, sink).scan();

    if !ok {
        return Err(RunError::Scan);
    }

    let expressions = Parser::new(tokens).parse()?;
    let value = interpreter.interpret(&expressions)?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_tracing;

    fn run(src: &str) -> (Result<Value, RunError>, String) {
        let mut sink = Vec::new();
        let interpreter = Interpreter::new();
        let result = run_source(src, &interpreter, &mut sink);
        (result, String::from_utf8(sink).unwrap())
    }

    #[test]
    fn runs_a_program_end_to_end() {
        setup_tracing();
        let (result, errors) = run("(defun add1 (x) (+ x 1)) (add1 5)");
        assert!(errors.is_empty());
        assert_eq!(result.unwrap(), Value::Number(6.0));
    }

    #[test]
    fn scan_errors_abort_before_parsing() {
        setup_tracing();
        let (result, errors) = run("(defvar x @)");
        assert!(errors.contains("[line 1] Unexpected character: @"));
        assert!(matches!(result, Err(RunError::Scan)));
    }

    #[test]
    fn parse_errors_propagate() {
        setup_tracing();
        let (result, _) = run("(defvar x");
        assert!(matches!(result, Err(RunError::Parse(_))));
    }

    #[test]
    fn execution_errors_propagate() {
        setup_tracing();
        let (result, _) = run("missing");
        assert!(matches!(result, Err(RunError::Execution(_))));
    }

    #[test]
    fn interpreter_state_persists_across_runs() {
        setup_tracing();
        let mut sink = Vec::new();
        let interpreter = Interpreter::new();
        run_source("(defvar x 10)", &interpreter, &mut sink).unwrap();
        let value = run_source("(+ x 5)", &interpreter, &mut sink).unwrap();
        assert_eq!(value, Value::Number(15.0));
    }
}
