use std::fmt;

/// The kind of a scanned lexeme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    LeftParen,
    RightParen,
    Quote,
    Identifier,
    Str,
    Number,
    Lambda,
    True,
    False,
    Defvar,
    Defun,
    If,
    Let,
    Nil,
    Eof,
}

/// Literal payload carried by string and number tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(f64),
}

/// A token at a specific location in a piece of source code.
/// Immutable once created by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenType,
    pub lexeme: String,
    pub line: usize,
    pub literal: Option<Literal>,
}

impl Token {
    pub fn new(kind: TokenType, lexeme: &str, line: usize, literal: Option<Literal>) -> Self {
        Token {
            kind,
            lexeme: lexeme.to_string(),
            line,
            literal,
        }
    }

    /// Shorthand for identifier tokens, used by the stdlib registry and tests.
    pub fn identifier(lexeme: &str, line: usize) -> Self {
        Token::new(TokenType::Identifier, lexeme, line, None)
    }

    pub fn eof(line: usize) -> Self {
        Token::new(TokenType::Eof, "", line, None)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}
