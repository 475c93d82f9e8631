//! Response formatting - JSON pretty-printing and token classification
//!
//! Both functions are best-effort: malformed input is never an error, it is
//! either passed through unchanged or classified as plain text.

use std::ops::Range;
use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Pretty-print `body` as JSON with two-space indentation.
///
/// Returns the body unchanged when it is not valid JSON.
pub fn pretty_print(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    }
}

/// Lexical category of a highlighted span
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Brace,
    Bracket,
    Comma,
    Colon,
    String,
    Number,
    Boolean,
    Plain,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Byte range into the tokenized text
    pub span: Range<usize>,
    pub kind: TokenKind,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

fn json_pattern() -> &'static Regex {
    static JSON_PATTERN: OnceLock<Regex> = OnceLock::new();
    JSON_PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r#"(?P<brace>[{}])"#,
            r#"|(?P<bracket>[\[\]])"#,
            r#"|(?P<comma>,)"#,
            r#"|(?P<colon>:)"#,
            r#"|(?P<string>"(?:[^"\\]|\\.)*")"#,
            r#"|(?P<number>\b\d+(?:\.\d+)?\b)"#,
            r#"|(?P<boolean>\b(?:true|false|null)\b)"#,
        ))
        .unwrap()
    })
}

fn classify(caps: &Captures<'_>) -> TokenKind {
    const GROUPS: [(&str, TokenKind); 7] = [
        ("brace", TokenKind::Brace),
        ("bracket", TokenKind::Bracket),
        ("comma", TokenKind::Comma),
        ("colon", TokenKind::Colon),
        ("string", TokenKind::String),
        ("number", TokenKind::Number),
        ("boolean", TokenKind::Boolean),
    ];
    GROUPS
        .iter()
        .find(|(name, _)| caps.name(name).is_some())
        .map(|(_, kind)| *kind)
        .unwrap_or(TokenKind::Plain)
}

/// Classify `text` into contiguous, non-overlapping tokens covering all of it.
///
/// The iterator is lazy and cheap to clone; cloning restarts nothing, but
/// calling `tokenize` again always starts from the beginning.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens {
        text,
        pos: 0,
        pending: None,
    }
}

#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
    // Match found after a run of plain text, emitted on the next call
    pending: Option<Token>,
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        if self.pos >= self.text.len() {
            return None;
        }

        let start = self.pos;
        match json_pattern().captures_at(self.text, start) {
            Some(caps) => {
                let whole = caps.get(0)?;
                let token = Token {
                    span: whole.start()..whole.end(),
                    kind: classify(&caps),
                };
                self.pos = whole.end();
                if whole.start() > start {
                    self.pending = Some(token);
                    Some(Token {
                        span: start..whole.start(),
                        kind: TokenKind::Plain,
                    })
                } else {
                    Some(token)
                }
            }
            None => {
                self.pos = self.text.len();
                Some(Token {
                    span: start..self.text.len(),
                    kind: TokenKind::Plain,
                })
            }
        }
    }
}
