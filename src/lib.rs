//! Fluent Programming Language Parser
//!
//! Turns Fluent source text into a uniform syntax tree:
//! - Work-queue driven parsing, so deeply nested input never recurses
//! - Positioned errors naming the rules that were expected
//! - Canonical source printer and package manifest reader
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Tokens → Parser (node arena) → Ast
//! ```
//!
//! # Example
//!
//! ```fluent
//! import "std/io";
//!
//! pub fn main() -> nothing {
//!     let total: num = sum(1, 2) * 3;
//!     if total > 5 {
//!         print(total);
//!     }
//! }
//! ```

pub mod ast;
pub mod common;
pub mod diagnostics;
pub mod lexer;
pub mod manifest;
pub mod parser;

pub use diagnostics::{CompileError, SourceFile};

// Re-exports for convenience
pub use ast::{Ast, Rule};
pub use common::Position;
pub use lexer::{Token, TokenKind};
pub use manifest::Package;
pub use parser::ParseError;

/// Parser version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lex and parse `source` into a program tree
pub fn parse_source(source: &str, file: &str) -> miette::Result<Ast> {
    let source_file = SourceFile::new(file, source);
    let tokens =
        lexer::lex(source, file).map_err(|e| CompileError::from_lex(&e, &source_file))?;
    tracing::debug!("Lexed {} tokens", tokens.len());

    let ast =
        parser::parse(&tokens, file).map_err(|e| CompileError::from_parse(&e, &source_file))?;
    Ok(ast)
}

/// Parse `source` and print it back in canonical form
pub fn format_source(source: &str, file: &str) -> miette::Result<String> {
    let ast = parse_source(source, file)?;
    Ok(ast::printer::print_program(&ast))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_parse_source_reports_position() {
        let err = parse_source("fn main() {\n  let = 1;\n}", "main.fl").unwrap_err();
        let diagnostic = err
            .downcast_ref::<CompileError>()
            .expect("parse failures are compile errors");
        assert!(matches!(diagnostic, CompileError::UnexpectedToken { .. }));
    }
}
