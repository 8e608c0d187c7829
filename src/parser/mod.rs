//! Parser for the Fluent language
//!
//! Sub-parsers work on token slices instead of a cursor: each one is
//! handed exactly the tokens of the construct it builds, found with the
//! nesting-aware helpers in [`util`]. Nested bodies and sub-expressions
//! are pushed onto explicit FIFO work queues instead of being parsed
//! recursively, so stack use stays bounded however deep the input nests.

mod error;
mod expr;
mod stmt;
pub mod tree;
mod types;
pub mod util;

pub use error::{PResult, ParseError};

use crate::ast::{Ast, Rule};
use crate::common::Position;
use crate::lexer::{Token, TokenKind};
use std::collections::VecDeque;
use std::sync::Arc;
use tree::{NodeId, Tree};
use util::{contains_any, extract_before, matching_close};

/// Pending work: a token slice and the pre-created node it fills
type Queue<'t> = VecDeque<(&'t [Token], NodeId)>;

/// Parse a whole program
pub fn parse(tokens: &[Token], file: &str) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(file, tokens);
    let root = parser.program(tokens)?;
    let ast = parser.tree.to_ast(root);

    tracing::debug!(
        file,
        tokens = tokens.len(),
        nodes = parser.tree.len(),
        items = ast.children.len(),
        "parsed program"
    );
    Ok(ast)
}

/// Parse a bare statement list into a `block` node
pub fn parse_block(tokens: &[Token], file: &str) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(file, tokens);
    let position = parser.position_of(tokens, 0);
    let block = parser.tree.node(Rule::Block, &position);
    parser.block(tokens, block)?;

    tracing::debug!(file, statements = parser.tree.children(block).len(), "parsed block");
    Ok(parser.tree.to_ast(block))
}

/// Parse a single expression
pub fn parse_expression(tokens: &[Token]) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(&file_of(tokens), tokens);
    let root = parser.expression(tokens)?;
    Ok(parser.tree.to_ast(root))
}

/// Parse a single type
pub fn parse_type(tokens: &[Token]) -> Result<Ast, ParseError> {
    let mut parser = Parser::new(&file_of(tokens), tokens);
    let root = parser.type_node(tokens)?;
    Ok(parser.tree.to_ast(root))
}

fn file_of(tokens: &[Token]) -> Arc<str> {
    tokens
        .first()
        .map(|t| t.position.file.clone())
        .unwrap_or_else(|| Arc::from("<input>"))
}

/// Parser state shared by all sub-parsers
struct Parser {
    tree: Tree,
    /// Reported when the failing slice has no tokens at all
    fallback: Position,
}

impl Parser {
    fn new(file: &str, tokens: &[Token]) -> Self {
        let fallback = tokens
            .last()
            .map(|t| t.position.clone())
            .unwrap_or_else(|| Position::start_of(file));
        Self {
            tree: Tree::new(),
            fallback,
        }
    }

    /// Position of `tokens[index]`, or of the last token when out of range
    fn position_of(&self, tokens: &[Token], index: usize) -> Position {
        tokens
            .get(index)
            .or(tokens.last())
            .map(|t| t.position.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn error(&self, tokens: &[Token], index: usize, expected: &[Rule]) -> ParseError {
        ParseError::new(expected, self.position_of(tokens, index))
    }

    /// Inner tokens of the `{ ... }` group opening at `tokens[at]`, and
    /// the index just past its closing brace
    fn braces<'t>(&self, tokens: &'t [Token], at: usize) -> PResult<(&'t [Token], usize)> {
        if tokens.get(at).map(|t| t.kind) != Some(TokenKind::OpenCurly) {
            return Err(self.error(tokens, at, &[Rule::Block]));
        }
        let close = matching_close(&tokens[at..], TokenKind::OpenCurly, TokenKind::CloseCurly)
            .ok_or_else(|| self.error(tokens, at, &[Rule::Block]))?
            + at;
        Ok((&tokens[at + 1..close], close + 1))
    }

    // ==================== PROGRAM ====================

    fn program(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        let position = self.position_of(tokens, 0);
        let program = self.tree.node(Rule::Program, &position);
        let mut i = 0;

        while let Some(token) = tokens.get(i) {
            let rest = &tokens[i..];
            let (node, used) = match token.kind {
                TokenKind::Import => {
                    let statement = extract_before(rest, &[TokenKind::Semicolon], None, true)
                        .ok_or_else(|| self.error(rest, rest.len(), &[Rule::Import]))?;
                    (self.import(statement)?, statement.len() + 1)
                }
                TokenKind::Pub => self.public(rest)?,
                TokenKind::Fn => self.function(rest, None)?,
                TokenKind::Mod => self.module(rest, None)?,
                _ => {
                    return Err(self.error(
                        rest,
                        0,
                        &[Rule::Import, Rule::Function, Rule::Module],
                    ));
                }
            };

            tracing::trace!(rule = %self.tree.rule(node), at = %token.position, "top-level item");
            self.tree.push(program, node);
            i += used;
        }

        Ok(program)
    }

    /// `pub` followed by a function or module
    fn public(&mut self, tokens: &[Token]) -> PResult<(NodeId, usize)> {
        let keyword = &tokens[0];
        let (node, used) = match tokens.get(1).map(|t| t.kind) {
            Some(TokenKind::Fn) => self.function(&tokens[1..], Some(keyword))?,
            Some(TokenKind::Mod) => self.module(&tokens[1..], Some(keyword))?,
            _ => return Err(self.error(tokens, 1, &[Rule::Function, Rule::Module])),
        };
        Ok((node, used + 1))
    }

    // ==================== FUNCTIONS ====================

    /// `fn name <T, ...>? ( params ) (-> Type)? { body }`
    ///
    /// Returns the node and the number of tokens it spans.
    fn function(&mut self, tokens: &[Token], public: Option<&Token>) -> PResult<(NodeId, usize)> {
        // fn name ( ) { }
        if tokens.len() < 6 {
            return Err(self.error(tokens, tokens.len(), &[Rule::Function]));
        }

        let start = public.unwrap_or(&tokens[0]);
        let function = self.tree.node(Rule::Function, &start.position);
        if let Some(keyword) = public {
            self.tree.append(function, Rule::Public, &keyword.position);
        }

        let name = self.identifier(&tokens[1..2])?;
        self.tree.push(function, name);
        let mut i = 2;

        if tokens[i].kind == TokenKind::Less {
            let (templates, used) = self.templates_at(tokens, i)?;
            self.tree.push(function, templates);
            i = used;
        }

        let close = matching_close(&tokens[i..], TokenKind::OpenParen, TokenKind::CloseParen)
            .ok_or_else(|| self.error(tokens, i, &[Rule::Parameters]))?
            + i;
        let parameters = self.parameters(&tokens[i + 1..close], &tokens[i])?;
        self.tree.push(function, parameters);
        i = close + 1;

        if tokens.get(i).map(|t| t.kind) == Some(TokenKind::Arrow) {
            let returns = extract_before(&tokens[i + 1..], &[TokenKind::OpenCurly], None, true)
                .ok_or_else(|| self.error(tokens, tokens.len(), &[Rule::Block]))?;
            if returns.is_empty() {
                return Err(self.error(tokens, i + 1, &[Rule::Type]));
            }
            let ty = self.type_node(returns)?;
            self.tree.push(function, ty);
            i += 1 + returns.len();
        }

        let (body, used) = self.braces(tokens, i)?;
        let block = self.tree.append(function, Rule::Block, &tokens[i].position);
        self.block(body, block)?;

        Ok((function, used))
    }

    /// Template parameter list starting at `tokens[at]`, which is `<`
    fn templates_at(&mut self, tokens: &[Token], at: usize) -> PResult<(NodeId, usize)> {
        let list = extract_before(&tokens[at..], &[TokenKind::Greater], None, true)
            .ok_or_else(|| self.error(tokens, at, &[Rule::Templates]))?;
        let close = at + list.len();
        let templates = self.templates(&tokens[at..=close])?;
        Ok((templates, close + 1))
    }

    // ==================== MODULES ====================

    /// `mod name <T, ...>? { members }`
    fn module(&mut self, tokens: &[Token], public: Option<&Token>) -> PResult<(NodeId, usize)> {
        // mod name { }
        if tokens.len() < 4 {
            return Err(self.error(tokens, tokens.len(), &[Rule::Module]));
        }

        let start = public.unwrap_or(&tokens[0]);
        let module = self.tree.node(Rule::Module, &start.position);
        if let Some(keyword) = public {
            self.tree.append(module, Rule::Public, &keyword.position);
        }

        let name = self.identifier(&tokens[1..2])?;
        self.tree.push(module, name);
        let mut i = 2;

        if tokens[i].kind == TokenKind::Less {
            let (templates, used) = self.templates_at(tokens, i)?;
            self.tree.push(module, templates);
            i = used;
        }

        let (body, used) = self.braces(tokens, i)?;
        let block = self.tree.append(module, Rule::Block, &tokens[i].position);
        self.members(body, block)?;

        Ok((module, used))
    }

    /// Module body: declarations and functions only
    fn members(&mut self, tokens: &[Token], block: NodeId) -> PResult<()> {
        let mut i = 0;

        while let Some(token) = tokens.get(i) {
            let rest = &tokens[i..];
            let (node, used) = match token.kind {
                TokenKind::Let | TokenKind::Const => {
                    let statement = extract_before(rest, &[TokenKind::Semicolon], None, true)
                        .ok_or_else(|| self.error(rest, rest.len(), &[Rule::Declaration]))?;
                    let node = if contains_any(statement, &[TokenKind::Assign]) {
                        self.declaration(statement)?
                    } else {
                        self.declaration_head(
                            statement,
                            statement.len(),
                            Rule::IncompleteDeclaration,
                        )?
                    };
                    (node, statement.len() + 1)
                }
                TokenKind::Fn => self.function(rest, None)?,
                TokenKind::Pub => {
                    if rest.get(1).map(|t| t.kind) != Some(TokenKind::Fn) {
                        return Err(self.error(rest, 1, &[Rule::Function]));
                    }
                    let (node, used) = self.function(&rest[1..], Some(token))?;
                    (node, used + 1)
                }
                _ => {
                    return Err(self.error(
                        rest,
                        0,
                        &[
                            Rule::Function,
                            Rule::Declaration,
                            Rule::IncompleteDeclaration,
                        ],
                    ));
                }
            };

            self.tree.push(block, node);
            i += used;
        }

        Ok(())
    }
}
