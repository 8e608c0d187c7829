//! Lexer for the Fluent language
//!
//! Turns source text into the flat token list consumed by the parser.

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Position;
use logos::Logos;
use std::sync::Arc;
use thiserror::Error;

/// Lexer failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal at {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence `\\{sequence}` at {position}")]
    InvalidEscape { sequence: char, position: Position },
}

impl LexError {
    pub fn position(&self) -> &Position {
        match self {
            LexError::UnterminatedString { position }
            | LexError::InvalidEscape { position, .. } => position,
        }
    }
}

/// Maps byte offsets to 1-based line/column pairs
struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            source,
            line_starts,
        }
    }

    fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let start = self.line_starts[line - 1];
        let column = self.source[start..offset].chars().count() + 1;
        (line, column)
    }
}

/// Lex `source`, attributing every token to `file`
pub fn lex(source: &str, file: &str) -> Result<Vec<Token>, LexError> {
    let file: Arc<str> = Arc::from(file);
    let index = LineIndex::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut tokens: Vec<Token> = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let (line, column) = index.line_col(span.start);
        let position = Position {
            file: file.clone(),
            line,
            column,
        };

        let kind = match result {
            Ok(kind) => kind,
            Err(()) if slice.starts_with('"') => {
                return Err(LexError::UnterminatedString { position });
            }
            Err(()) => TokenKind::Unknown,
        };

        match kind {
            TokenKind::StringLiteral => {
                let value = unescape(&slice[1..slice.len() - 1], &position)?;
                tokens.push(Token::new(kind, value, position));
            }
            // `else if` is a single keyword for the parser
            TokenKind::If if tokens.last().is_some_and(|t| t.kind == TokenKind::Else) => {
                if let Some(previous) = tokens.last_mut() {
                    previous.kind = TokenKind::ElseIf;
                    previous.value = "else if".to_string();
                }
            }
            _ => tokens.push(Token::new(kind, slice, position)),
        }
    }

    tracing::debug!(file = %file, tokens = tokens.len(), "lexed source");
    Ok(tokens)
}

fn unescape(raw: &str, position: &Position) -> Result<String, LexError> {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }

        let escaped = chars.next().unwrap_or('\\');
        value.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            other => {
                return Err(LexError::InvalidEscape {
                    sequence: other,
                    position: position.clone(),
                });
            }
        });
    }

    Ok(value)
}
