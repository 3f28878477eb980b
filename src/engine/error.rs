use thiserror::Error;

/// A lexical error. Recoverable: the scanner reports it to its sink and
/// keeps scanning, so one pass surfaces every problem.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}] {message}")]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

impl LexError {
    pub fn new(line: usize, message: String) -> Self {
        LexError { line, message }
    }
}

/// A structural error. Fatal to the current parse unit; the parser stops
/// at the first one.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}] {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

/// A runtime error. Aborts the current top-level expression and the rest
/// of the batch, but never corrupts interpreter state: bindings defined
/// before the error stay defined.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("[line {line}] Undefined variable '{name}'.")]
    UndefinedVariable { line: usize, name: String },
    #[error("[line {line}] Variable '{name}' already defined")]
    AlreadyDefined { line: usize, name: String },
    #[error("[line {line}] '{name}' is not a function")]
    NotAFunction { line: usize, name: String },
    #[error("[line {line}] {message}")]
    ArityMismatch { line: usize, message: String },
    #[error("[line {line}] {message}")]
    TypeError { line: usize, message: String },
    #[error("[line {line}] Division by zero")]
    DivisionByZero { line: usize },
}

/// Umbrella over the pipeline stages, returned by `engine::run_source`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    /// Lexical errors were already written to the scanner's sink.
    #[error("aborted due to scan errors")]
    Scan,
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}
