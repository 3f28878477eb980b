use lazy_static::lazy_static;
use owo_colors::OwoColorize;
use regex::Regex;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow::{self, Borrowed, Owned};

lazy_static! {
    // Order matters: at each position the first matching rule wins.
    static ref STRING_RE: Regex = Regex::new(r#""([^"\\]|\\.)*""#).unwrap();
    static ref COMMENT_RE: Regex = Regex::new(r";.*").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"\b\d+(\.\d+)?\b").unwrap();
    static ref KEYWORD_RE: Regex = Regex::new(r"\b(defvar|defun|let|if|lambda)\b").unwrap();
    static ref BOOLEAN_NIL_RE: Regex = Regex::new(r"\b(true|false|nil)\b").unwrap();
    static ref PARENS_RE: Regex = Regex::new(r"['()]").unwrap();
}

fn paint_string(text: &str) -> String {
    text.green().to_string()
}

fn paint_comment(text: &str) -> String {
    text.bright_black().to_string()
}

fn paint_number(text: &str) -> String {
    text.magenta().to_string()
}

fn paint_keyword(text: &str) -> String {
    text.cyan().bold().to_string()
}

fn paint_constant(text: &str) -> String {
    text.yellow().to_string()
}

fn paint_paren(text: &str) -> String {
    text.blue().to_string()
}

#[derive(Default)]
pub struct LispHighlighter {
    brackets: MatchingBracketHighlighter,
}

impl Highlighter for LispHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let rules: [(&Regex, fn(&str) -> String); 6] = [
            (&STRING_RE, paint_string),
            (&COMMENT_RE, paint_comment),
            (&NUMBER_RE, paint_number),
            (&KEYWORD_RE, paint_keyword),
            (&BOOLEAN_NIL_RE, paint_constant),
            (&PARENS_RE, paint_paren),
        ];

        let mut styled = String::with_capacity(line.len());
        let mut styled_any = false;
        let mut current = 0;

        while current < line.len() {
            let matched = rules.iter().find_map(|(regex, paint)| {
                regex
                    .find_at(line, current)
                    .filter(|m| m.start() == current)
                    .map(|m| (m.end(), paint(m.as_str())))
            });

            match matched {
                Some((end, painted)) => {
                    styled.push_str(&painted);
                    styled_any = true;
                    current = end;
                }
                None => {
                    // No rule applies here; pass the character through.
                    let c = line[current..].chars().next().unwrap_or(' ');
                    styled.push(c);
                    current += c.len_utf8();
                }
            }
        }

        if styled_any {
            Owned(styled)
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        // Repaint whenever there is anything to paint, and also let the
        // bracket matcher react to cursor movement.
        self.brackets.highlight_char(line, pos, forced) || !line.is_empty()
    }
}

#[derive(Completer, Helper, Hinter, Validator)]
pub struct ReplHelper {
    highlighter: LispHighlighter,
}

impl ReplHelper {
    pub fn new() -> Self {
        Self {
            highlighter: LispHighlighter::default(),
        }
    }
}

impl Default for ReplHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}
