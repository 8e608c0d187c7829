//! Statements, control flow and the block driver

use super::tree::NodeId;
use super::util::{contains_any, extract_before, split_by_separator};
use super::{PResult, Parser, Queue};
use crate::ast::Rule;
use crate::lexer::{Token, TokenKind};

/// Split on a single top-level `sep` into two non-empty sides
///
/// On failure returns the index of the offending token.
fn split_pair(tokens: &[Token], sep: TokenKind) -> Result<(&[Token], &[Token]), usize> {
    let parts = split_by_separator(
        tokens,
        sep,
        &[TokenKind::OpenParen, TokenKind::OpenBracket],
        &[TokenKind::CloseParen, TokenKind::CloseBracket],
    )
    .ok_or(0usize)?;

    match parts.as_slice() {
        [left, right] if !right.is_empty() => Ok((*left, *right)),
        // Nothing after the separator
        [left, _] => Err(left.len()),
        [only] => Err(only.len()),
        [first, second, ..] => Err(first.len() + 1 + second.len()),
        [] => Err(0),
    }
}

impl Parser {
    // ==================== LEAVES ====================

    /// Exactly one identifier token
    pub(super) fn identifier(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        match tokens {
            [token] if token.kind == TokenKind::Identifier => {
                Ok(self.tree.leaf(Rule::Identifier, token))
            }
            [first, ..] if first.kind == TokenKind::Identifier => {
                Err(self.error(tokens, 1, &[Rule::Identifier]))
            }
            _ => Err(self.error(tokens, 0, &[Rule::Identifier])),
        }
    }

    /// `import "path"` with the semicolon already stripped
    pub(super) fn import(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        match tokens {
            [keyword, path] if path.kind == TokenKind::StringLiteral => {
                let import = self.tree.node(Rule::Import, &keyword.position);
                let literal = self.tree.leaf(Rule::StringLiteral, path);
                self.tree.push(import, literal);
                Ok(import)
            }
            [_, path, ..] if path.kind == TokenKind::StringLiteral => {
                Err(self.error(tokens, 2, &[Rule::Import]))
            }
            _ => Err(self.error(tokens, 1, &[Rule::Import])),
        }
    }

    /// `break` or `continue` on its own
    fn keyword_statement(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        let keyword = &tokens[0];
        let rule = if keyword.kind == TokenKind::Break {
            Rule::Break
        } else {
            Rule::Continue
        };
        if tokens.len() > 1 {
            return Err(self.error(tokens, 1, &[rule]));
        }
        Ok(self.tree.node(rule, &keyword.position))
    }

    // ==================== DECLARATIONS ====================

    /// `let|const name : Type` within `tokens[..end]`
    ///
    /// Errors index into the full `tokens`, so a missing annotation is
    /// reported at whatever follows the name.
    pub(super) fn declaration_head(
        &mut self,
        tokens: &[Token],
        end: usize,
        expected: Rule,
    ) -> PResult<NodeId> {
        let Some(keyword) = tokens
            .first()
            .filter(|t| matches!(t.kind, TokenKind::Let | TokenKind::Const))
        else {
            return Err(self.error(tokens, 0, &[expected]));
        };
        let Some(name) = tokens.get(1).filter(|t| t.kind == TokenKind::Identifier) else {
            return Err(self.error(tokens, 1, &[expected]));
        };
        if end < 3 || tokens[2].kind != TokenKind::Colon {
            return Err(self.error(tokens, 2, &[expected]));
        }
        if end == 3 {
            return Err(self.error(tokens, 3, &[Rule::Type]));
        }

        let declaration = self.tree.node(Rule::IncompleteDeclaration, &keyword.position);
        let kind = self.tree.leaf(Rule::DeclarationType, keyword);
        let identifier = self.tree.leaf(Rule::Identifier, name);
        let ty = self.type_node(&tokens[3..end])?;
        self.tree.push(declaration, kind);
        self.tree.push(declaration, identifier);
        self.tree.push(declaration, ty);
        Ok(declaration)
    }

    /// `let|const name : Type = expression`
    pub(super) fn declaration(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        let (head, value) = split_pair(tokens, TokenKind::Assign)
            .map_err(|at| self.error(tokens, at, &[Rule::Declaration]))?;

        let declaration = self.declaration_head(tokens, head.len(), Rule::Declaration)?;
        let expression = self.expression(value)?;
        self.tree.push(declaration, expression);
        self.tree.set_rule(declaration, Rule::Declaration);
        Ok(declaration)
    }

    /// `target = expression` where the target is a name or ends in one
    fn reassignment(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        let (target, value) = split_pair(tokens, TokenKind::Assign)
            .map_err(|at| self.error(tokens, at, &[Rule::Assignment]))?;

        let lhs = self.expression(target)?;
        if !self.is_assignable(lhs) {
            return Err(self.error(tokens, 0, &[Rule::Assignment]));
        }
        let rhs = self.expression(value)?;

        let assignment = self.tree.node(Rule::Assignment, &tokens[0].position);
        self.tree.push(assignment, lhs);
        self.tree.push(assignment, rhs);
        Ok(assignment)
    }

    fn is_assignable(&self, expression: NodeId) -> bool {
        let ends_in_name = |segment: &NodeId| match self.tree.children(*segment) {
            [only] => self.tree.rule(*only) == Rule::Identifier,
            _ => false,
        };

        match self.tree.children(expression) {
            [only] => match self.tree.rule(*only) {
                Rule::Identifier => true,
                Rule::PropertyAccess => self.tree.children(*only).last().is_some_and(ends_in_name),
                _ => false,
            },
            _ => false,
        }
    }

    /// `return` with an optional value
    fn return_statement(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        let node = self.tree.node(Rule::Return, &tokens[0].position);
        if tokens.len() > 1 {
            let value = self.expression(&tokens[1..])?;
            self.tree.push(node, value);
        }
        Ok(node)
    }

    // ==================== BLOCKS ====================

    /// Fill `block` with the statements of `tokens`
    ///
    /// Nested bodies are created empty, queued, and filled in FIFO order.
    pub(super) fn block<'t>(&mut self, tokens: &'t [Token], block: NodeId) -> PResult<()> {
        let mut queue: Queue<'t> = Queue::new();
        queue.push_back((tokens, block));

        while let Some((item, parent)) = queue.pop_front() {
            tracing::trace!(tokens = item.len(), pending = queue.len(), "block item");
            self.block_item(item, parent, &mut queue)?;
        }
        Ok(())
    }

    fn block_item<'t>(
        &mut self,
        tokens: &'t [Token],
        block: NodeId,
        queue: &mut Queue<'t>,
    ) -> PResult<()> {
        // The `if` an `else if` / `else` right here would attach to
        let mut last_if: Option<NodeId> = None;
        let mut i = 0;

        while let Some(token) = tokens.get(i) {
            let rest = &tokens[i..];
            match token.kind {
                TokenKind::OpenCurly => {
                    let (body, used) = self.braces(rest, 0)?;
                    let nested = self.tree.append(block, Rule::Block, &token.position);
                    queue.push_back((body, nested));
                    last_if = None;
                    i += used;
                }
                TokenKind::If | TokenKind::While => {
                    let (node, used) = self.conditional(rest, queue)?;
                    self.tree.push(block, node);
                    last_if = (token.kind == TokenKind::If).then_some(node);
                    i += used;
                }
                TokenKind::ElseIf => {
                    let Some(owner) = last_if else {
                        return Err(self.error(rest, 0, &[Rule::If]));
                    };
                    let (node, used) = self.conditional(rest, queue)?;
                    self.tree.push(owner, node);
                    i += used;
                }
                TokenKind::Else => {
                    let Some(owner) = last_if.take() else {
                        return Err(self.error(rest, 0, &[Rule::If]));
                    };
                    let (body, used) = self.braces(rest, 1)?;
                    let node = self.tree.append(owner, Rule::Else, &token.position);
                    let nested = self.tree.append(node, Rule::Block, &rest[1].position);
                    queue.push_back((body, nested));
                    i += used;
                }
                TokenKind::For => {
                    let (node, used) = self.for_loop(rest, queue)?;
                    self.tree.push(block, node);
                    last_if = None;
                    i += used;
                }
                _ => {
                    let statement = extract_before(rest, &[TokenKind::Semicolon], None, true)
                        .ok_or_else(|| self.error(rest, rest.len(), &[Rule::Statement]))?;
                    let node = self.statement(statement, rest)?;
                    self.tree.push(block, node);
                    last_if = None;
                    i += statement.len() + 1;
                }
            }
        }

        Ok(())
    }

    /// One `;`-terminated statement; `rest` still holds the semicolon
    fn statement(&mut self, statement: &[Token], rest: &[Token]) -> PResult<NodeId> {
        let Some(first) = statement.first() else {
            return Err(self.error(rest, 0, &[Rule::Statement]));
        };

        match first.kind {
            TokenKind::Let | TokenKind::Const => {
                if contains_any(statement, &[TokenKind::Assign]) {
                    self.declaration(statement)
                } else {
                    // Declarations without a value only exist in modules
                    Err(self.error(rest, statement.len(), &[Rule::Declaration]))
                }
            }
            TokenKind::Break | TokenKind::Continue => self.keyword_statement(statement),
            TokenKind::Return => self.return_statement(statement),
            _ if contains_any(statement, &[TokenKind::Assign]) => self.reassignment(statement),
            _ => self.expression(statement),
        }
    }

    // ==================== CONTROL FLOW ====================

    /// `if`, `else if` or `while`: keyword, condition, body
    fn conditional<'t>(
        &mut self,
        tokens: &'t [Token],
        queue: &mut Queue<'t>,
    ) -> PResult<(NodeId, usize)> {
        let keyword = &tokens[0];
        let rule = match keyword.kind {
            TokenKind::If => Rule::If,
            TokenKind::ElseIf => Rule::ElseIf,
            _ => Rule::While,
        };

        let condition = extract_before(&tokens[1..], &[TokenKind::OpenCurly], None, true)
            .ok_or_else(|| self.error(tokens, tokens.len(), &[Rule::Block]))?;
        if condition.is_empty() {
            return Err(self.error(tokens, 1, &[Rule::Expression]));
        }

        let node = self.tree.node(rule, &keyword.position);
        let expression = self.expression(condition)?;
        self.tree.push(node, expression);

        let at = 1 + condition.len();
        let (body, used) = self.braces(tokens, at)?;
        let block = self.tree.append(node, Rule::Block, &tokens[at].position);
        queue.push_back((body, block));

        Ok((node, used))
    }

    /// `for low to high in name { ... }`
    fn for_loop<'t>(
        &mut self,
        tokens: &'t [Token],
        queue: &mut Queue<'t>,
    ) -> PResult<(NodeId, usize)> {
        let keyword = &tokens[0];
        let header = extract_before(&tokens[1..], &[TokenKind::OpenCurly], None, true)
            .ok_or_else(|| self.error(tokens, tokens.len(), &[Rule::Block]))?;

        let (range, binding) = split_pair(header, TokenKind::In)
            .map_err(|at| self.error(tokens, 1 + at, &[Rule::For]))?;
        let (low, high) = split_pair(range, TokenKind::To)
            .map_err(|at| self.error(tokens, 1 + at, &[Rule::For]))?;

        let node = self.tree.node(Rule::For, &keyword.position);
        let low = self.expression(low)?;
        let high = self.expression(high)?;
        let name = self.identifier(binding)?;
        self.tree.push(node, low);
        self.tree.push(node, high);
        self.tree.push(node, name);

        let at = 1 + header.len();
        let (body, used) = self.braces(tokens, at)?;
        let block = self.tree.append(node, Rule::Block, &tokens[at].position);
        queue.push_back((body, block));

        Ok((node, used))
    }
}
