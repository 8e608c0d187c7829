//! Diagnostic reporting with source locations
//!
//! Library errors carry line/column positions; this module turns them into
//! miette reports labelled against the original source text.

use crate::common::Position;
use crate::lexer::LexError;
use crate::manifest::ManifestError;
use crate::parser::ParseError;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }

    /// Byte offset of a 1-based line/column position, clamped to the text
    pub fn offset_of(&self, position: &Position) -> usize {
        let mut offset = 0;
        for (index, line) in self.content.split_inclusive('\n').enumerate() {
            if index + 1 == position.line {
                let column = position.column.saturating_sub(1);
                return offset
                    + line
                        .char_indices()
                        .nth(column)
                        .map_or(line.len(), |(i, _)| i);
            }
            offset += line.len();
        }
        self.content.len()
    }

    /// Span of the word starting at `position`
    pub fn span_at(&self, position: &Position) -> SourceSpan {
        let start = self.offset_of(position);
        let len = self.content[start..]
            .chars()
            .take_while(|c| !c.is_whitespace())
            .map(char::len_utf8)
            .sum::<usize>()
            .max(1)
            .min(self.content.len().saturating_sub(start).max(1));
        SourceSpan::new(start.into(), len)
    }

    fn text_at(&self, span: SourceSpan) -> String {
        let start = span.offset().min(self.content.len());
        let end = (span.offset() + span.len()).min(self.content.len());
        self.content.get(start..end).unwrap_or_default().to_string()
    }
}

/// Compiler diagnostic
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CompileError {
    // === Lex Errors ===
    #[error("Unterminated string literal")]
    #[diagnostic(code(lex::unterminated_string), help("add the closing `\"`"))]
    UnterminatedString {
        #[label("string starts here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Invalid escape sequence `\\{sequence}`")]
    #[diagnostic(
        code(lex::invalid_escape),
        help("valid escapes are \\n \\t \\r \\0 \\\\ \\\" and \\'")
    )]
    InvalidEscape {
        sequence: char,
        #[label("in this string")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Parse Errors ===
    #[error("Expected {expected}, found `{found}`")]
    #[diagnostic(code(parse::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected end of file, expected {expected}")]
    #[diagnostic(code(parse::unexpected_eof))]
    UnexpectedEof {
        expected: String,
        #[label("expected more tokens")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    // === Manifest Errors ===
    #[error("Invalid package structure: {message}")]
    #[diagnostic(
        code(manifest::invalid_structure),
        help("a manifest only contains `Key = \"value\";` lines")
    )]
    InvalidPackage {
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("{message}")]
    #[diagnostic(code(io::read))]
    Io { message: String },
}

impl CompileError {
    pub fn from_lex(err: &LexError, source: &SourceFile) -> Self {
        let span = source.span_at(err.position());
        let src = source.to_named_source();
        match err {
            LexError::UnterminatedString { .. } => CompileError::UnterminatedString { span, src },
            LexError::InvalidEscape { sequence, .. } => CompileError::InvalidEscape {
                sequence: *sequence,
                span,
                src,
            },
        }
    }

    pub fn from_parse(err: &ParseError, source: &SourceFile) -> Self {
        let expected = err.expected_list();
        let src = source.to_named_source();

        // Positions past the last token only happen on empty input
        if source.content.trim().is_empty() {
            let span = SourceSpan::new(source.content.len().into(), 0);
            return CompileError::UnexpectedEof {
                expected,
                span,
                src,
            };
        }

        let span = source.span_at(&err.position);
        CompileError::UnexpectedToken {
            expected,
            found: source.text_at(span),
            span,
            src,
        }
    }

    pub fn from_manifest(err: &ManifestError, source: &SourceFile) -> Self {
        match err {
            ManifestError::Io { .. } => CompileError::Io {
                message: err.to_string(),
            },
            ManifestError::Lex(lex) => Self::from_lex(lex, source),
            ManifestError::Parse(parse) => Self::from_parse(parse, source),
            other => {
                let span = other
                    .position()
                    .map(|p| source.span_at(p))
                    .unwrap_or_else(|| SourceSpan::new(0.into(), 0));
                CompileError::InvalidPackage {
                    message: other.to_string(),
                    span,
                    src: source.to_named_source(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_of_multibyte() {
        let source = SourceFile::new("t", "ab\néx y");
        assert_eq!(source.offset_of(&Position::new("t", 1, 2)), 1);
        // `é` is two bytes
        assert_eq!(source.offset_of(&Position::new("t", 2, 2)), 5);
        assert_eq!(source.offset_of(&Position::new("t", 9, 1)), source.content.len());
    }

    #[test]
    fn test_parse_error_points_at_token() {
        let source = SourceFile::new("t", "fn main() { let x = 1; }");
        let err = ParseError::new(
            &[crate::ast::Rule::Declaration],
            Position::new("t", 1, 19),
        );
        match CompileError::from_parse(&err, &source) {
            CompileError::UnexpectedToken {
                expected, found, ..
            } => {
                assert_eq!(expected, "declaration");
                assert_eq!(found, "=");
            }
            other => panic!("unexpected diagnostic: {other:?}"),
        }
    }
}
