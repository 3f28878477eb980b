use crate::engine::error::LexError;
use crate::engine::token::{Literal, Token, TokenType};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io;
use tracing::{debug, instrument, trace};

static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    HashMap::from([
        ("lambda", TokenType::Lambda),
        ("true", TokenType::True),
        ("false", TokenType::False),
        ("let", TokenType::Let),
        ("defvar", TokenType::Defvar),
        ("defun", TokenType::Defun),
        ("if", TokenType::If),
        ("nil", TokenType::Nil),
    ])
});

// Characters beyond letters that may start or continue an identifier.
const SYMBOL_CHARS: &str = "+-<>!=/*%_?";

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || SYMBOL_CHARS.contains(c)
}

fn is_alphanumeric(c: char) -> bool {
    is_digit(c) || is_alpha(c)
}

/// Turns source text into a sequence of tokens.
///
/// Lexical errors are written to the caller-supplied sink as
/// `[line <n>] <message>` lines; scanning always runs to completion so a
/// caller sees every problem in one pass. The returned flag is `false`
/// when any error was reported.
pub struct Scanner<'a> {
    // start marks where the current lexeme starts, end where it ends.
    start: usize,
    end: usize,
    line: usize,
    src: Vec<char>,
    tokens: Vec<Token>,
    out: &'a mut dyn io::Write,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &str, out: &'a mut dyn io::Write) -> Self {
        Scanner {
            start: 0,
            end: 0,
            line: 1,
            src: src.chars().collect(),
            tokens: Vec::new(),
            out,
        }
    }

    /// Scans the source code and returns the tokens plus an all-ok flag.
    #[instrument(skip(self))]
    pub fn scan(mut self) -> (Vec<Token>, bool) {
        let mut all_ok = true;

        while !self.is_at_end() {
            if let Err(err) = self.next_token() {
                debug!(%err, "lexical error, resynchronizing");
                // Failures writing to the sink are ignored, like any
                // other diagnostics stream.
                let _ = writeln!(self.out, "{err}");
                all_ok = false;
            }

            self.end += 1;
            self.start = self.end;
        }

        self.tokens.push(Token::eof(self.line));
        trace!(count = self.tokens.len(), all_ok, "scan finished");

        (self.tokens, all_ok)
    }

    fn next_token(&mut self) -> Result<(), LexError> {
        let c = self.src[self.end];

        match c {
            '(' => {
                self.push_token(TokenType::LeftParen, None);
                Ok(())
            }
            ')' => {
                self.push_token(TokenType::RightParen, None);
                Ok(())
            }
            '\'' => {
                self.push_token(TokenType::Quote, None);
                Ok(())
            }
            ';' => {
                // Comments run to end of line and are discarded.
                while self.peek_n(1) != '\n' && !self.is_last() {
                    self.end += 1;
                }
                Ok(())
            }
            ' ' | '\t' | '\r' => Ok(()),
            '\n' => {
                self.line += 1;
                Ok(())
            }
            '"' => self.string(),
            _ => {
                if is_digit(c) {
                    self.number()
                } else if is_alpha(c) {
                    self.identifier();
                    Ok(())
                } else {
                    Err(LexError::new(
                        self.line,
                        format!("Unexpected character: {c}"),
                    ))
                }
            }
        }
    }

    fn string(&mut self) -> Result<(), LexError> {
        self.end += 1;

        while !self.is_at_end() && self.src[self.end] != '"' {
            self.end += 1;
        }

        if self.is_at_end() {
            return Err(LexError::new(self.line, "Unterminated string".to_string()));
        }

        let literal: String = self.src[self.start + 1..self.end].iter().collect();
        self.push_token(TokenType::Str, Some(Literal::Str(literal)));

        Ok(())
    }

    fn number(&mut self) -> Result<(), LexError> {
        while is_digit(self.peek_n(1)) {
            self.end += 1;
        }

        if self.peek_n(1) == '.' && is_digit(self.peek_n(2)) {
            self.end += 1;

            while is_digit(self.peek_n(1)) {
                self.end += 1;
            }
        }

        let lexeme: String = self.src[self.start..=self.end].iter().collect();
        let num: f64 = lexeme.parse().map_err(|e| {
            LexError::new(self.line, format!("error while parsing number: {e}"))
        })?;

        self.push_token(TokenType::Number, Some(Literal::Number(num)));

        Ok(())
    }

    fn identifier(&mut self) {
        while is_alphanumeric(self.peek_n(1)) {
            self.end += 1;
        }

        let text: String = self.src[self.start..=self.end].iter().collect();

        match KEYWORDS.get(text.as_str()) {
            Some(kind) => self.push_token(*kind, None),
            None => self.push_token(TokenType::Identifier, None),
        }
    }

    fn push_token(&mut self, kind: TokenType, literal: Option<Literal>) {
        let lexeme: String = self.src[self.start..=self.end].iter().collect();
        trace!(?kind, %lexeme, line = self.line, "token");
        self.tokens.push(Token {
            kind,
            lexeme,
            line: self.line,
            literal,
        });
    }

    /// Looks ahead n positions; returns a space past end of input so
    /// lookahead in lexeme loops terminates cleanly.
    fn peek_n(&self, n: usize) -> char {
        if self.end + n >= self.src.len() {
            return ' ';
        }

        self.src[self.end + n]
    }

    fn is_at_end(&self) -> bool {
        self.end >= self.src.len()
    }

    fn is_last(&self) -> bool {
        self.end + 1 >= self.src.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_tracing;

    fn scan(src: &str) -> (Vec<Token>, bool, String) {
        let mut sink = Vec::new();
        let (tokens, ok) = Scanner::new(src, &mut sink).scan();
        (tokens, ok, String::from_utf8(sink).unwrap())
    }

    #[test]
    fn empty_source_yields_only_eof() {
        setup_tracing();
        let (tokens, ok, errors) = scan("");
        assert!(ok);
        assert!(errors.is_empty());
        assert_eq!(tokens, vec![Token::eof(1)]);
    }

    #[test]
    fn scans_a_full_program() {
        setup_tracing();
        let src = "\n; some comment\n(defun say-hello (name)\n  (if name\n    (println name)\n    (println \"no name\")))\n\n(defvar name \"Steven\")\n\n(println '(123.456 \"two\" say-hello))\n";
        let (tokens, ok, errors) = scan(src);
        assert!(ok, "unexpected errors: {errors}");
        assert!(errors.is_empty());

        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::LeftParen,
                TokenType::Defun,
                TokenType::Identifier, // say-hello
                TokenType::LeftParen,
                TokenType::Identifier, // name
                TokenType::RightParen,
                TokenType::LeftParen,
                TokenType::If,
                TokenType::Identifier,
                TokenType::LeftParen,
                TokenType::Identifier, // println
                TokenType::Identifier,
                TokenType::RightParen,
                TokenType::LeftParen,
                TokenType::Identifier,
                TokenType::Str,
                TokenType::RightParen,
                TokenType::RightParen,
                TokenType::RightParen,
                TokenType::LeftParen,
                TokenType::Defvar,
                TokenType::Identifier,
                TokenType::Str,
                TokenType::RightParen,
                TokenType::LeftParen,
                TokenType::Identifier,
                TokenType::Quote,
                TokenType::LeftParen,
                TokenType::Number,
                TokenType::Str,
                TokenType::Identifier,
                TokenType::RightParen,
                TokenType::RightParen,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn number_literal_carries_value() {
        setup_tracing();
        let (tokens, ok, _) = scan("123.456");
        assert!(ok);
        assert_eq!(tokens[0].kind, TokenType::Number);
        assert_eq!(tokens[0].lexeme, "123.456");
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.456)));
    }

    #[test]
    fn integer_number_does_not_consume_trailing_dot() {
        setup_tracing();
        let (tokens, ok, _) = scan("42.");
        // "42" scans as a number; the lone '.' is an unexpected character.
        assert!(!ok);
        assert_eq!(tokens[0].literal, Some(Literal::Number(42.0)));
    }

    #[test]
    fn string_literal_strips_quotes() {
        setup_tracing();
        let (tokens, ok, _) = scan("\"hello world\"");
        assert!(ok);
        assert_eq!(tokens[0].kind, TokenType::Str);
        assert_eq!(tokens[0].literal, Some(Literal::Str("hello world".to_string())));
    }

    #[test]
    fn unterminated_string_is_reported() {
        setup_tracing();
        let (_, ok, errors) = scan("\"never closed");
        assert!(!ok);
        assert!(errors.contains("[line 1] Unterminated string"));
    }

    #[test]
    fn keywords_are_reclassified() {
        setup_tracing();
        let (tokens, ok, _) = scan("lambda let defvar defun if nil true false foo");
        assert!(ok);
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::Lambda,
                TokenType::Let,
                TokenType::Defvar,
                TokenType::Defun,
                TokenType::If,
                TokenType::Nil,
                TokenType::True,
                TokenType::False,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn symbol_characters_form_identifiers() {
        setup_tracing();
        let (tokens, ok, _) = scan("+ - <= != is-empty?");
        assert!(ok);
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["+", "-", "<=", "!=", "is-empty?", ""]);
    }

    #[test]
    fn comments_are_discarded() {
        setup_tracing();
        let (tokens, ok, _) = scan("; a comment\n42");
        assert!(ok);
        assert_eq!(tokens[0].kind, TokenType::Number);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn recovers_from_multiple_illegal_characters() {
        setup_tracing();
        let (tokens, ok, errors) = scan("@\n(defvar x 1)\n^");
        assert!(!ok);
        assert!(errors.contains("[line 1] Unexpected character: @"));
        assert!(errors.contains("[line 3] Unexpected character: ^"));
        // The healthy tokens around the errors survive.
        let kinds: Vec<TokenType> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::LeftParen,
                TokenType::Defvar,
                TokenType::Identifier,
                TokenType::Number,
                TokenType::RightParen,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_numbers() {
        setup_tracing();
        let (tokens, ok, _) = scan("a\nb\n\nc");
        assert!(ok);
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 4]);
    }
}
