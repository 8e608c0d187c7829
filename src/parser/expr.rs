//! Expression engine
//!
//! Each work item is a token slice and the pre-created node it fills.
//! Binding strength is decided by looking ahead over the slice for a
//! binary operator outside nesting: first `||`, then the other boolean
//! and comparison operators, then arithmetic. Only a slice without any of
//! them reaches the prefix, primary and property access layer. All three
//! lookaheads and the bounds of the first group come from one scan.

use super::tree::NodeId;
use super::util::{
    ARITHMETIC_OPERATORS, BOOLEAN_SLICE, PROPERTY_OPERATORS, close_at, layers, matching_close,
    next_binary, split_arguments,
};
use super::{PResult, ParseError, Parser, Queue};
use crate::ast::Rule;
use crate::lexer::{Token, TokenKind};

/// Operator chain flavours built by [`Parser::signed_op`]
struct Chain {
    expression: Rule,
    operator: Rule,
    operators: &'static [TokenKind],
    /// `!` may prefix an operand
    negation: bool,
    /// Emit a node per operator; property access only keeps the operands
    include_signs: bool,
    /// Token kinds an operand may start with, when restricted
    operand_start: Option<&'static [TokenKind]>,
    /// A parenthesised operand keeps its own `expression` inside the operand
    wrap_groups: bool,
}

const OR_CHAIN: Chain = Chain {
    expression: Rule::BooleanExpression,
    operator: Rule::BooleanOperator,
    operators: &[TokenKind::Or],
    negation: false,
    include_signs: true,
    operand_start: None,
    wrap_groups: false,
};

const BOOLEAN_CHAIN: Chain = Chain {
    expression: Rule::BooleanExpression,
    operator: Rule::BooleanOperator,
    operators: BOOLEAN_SLICE,
    negation: true,
    include_signs: true,
    operand_start: None,
    wrap_groups: false,
};

const ARITHMETIC_CHAIN: Chain = Chain {
    expression: Rule::ArithmeticExpression,
    operator: Rule::ArithmeticSign,
    operators: ARITHMETIC_OPERATORS,
    negation: false,
    include_signs: true,
    operand_start: None,
    wrap_groups: false,
};

const PROPERTY_CHAIN: Chain = Chain {
    expression: Rule::PropertyAccess,
    operator: Rule::PropertyAccess,
    operators: PROPERTY_OPERATORS,
    negation: false,
    include_signs: false,
    operand_start: Some(&[TokenKind::Identifier, TokenKind::OpenParen]),
    wrap_groups: true,
};

impl Parser {
    /// Parse `tokens` as one expression and return its node
    pub(super) fn expression<'t>(&mut self, tokens: &'t [Token]) -> PResult<NodeId> {
        let position = self.position_of(tokens, 0);
        let root = self.tree.node(Rule::Expression, &position);
        let mut queue: Queue<'t> = Queue::new();
        queue.push_back((tokens, root));

        while let Some((item, parent)) = queue.pop_front() {
            tracing::trace!(tokens = item.len(), pending = queue.len(), "expression item");
            self.expression_item(item, parent, &mut queue)?;
        }

        match self.tree.children(root) {
            [only] if self.tree.rule(*only) == Rule::Expression => Ok(*only),
            _ => Ok(root),
        }
    }

    fn expression_item<'t>(
        &mut self,
        tokens: &'t [Token],
        parent: NodeId,
        queue: &mut Queue<'t>,
    ) -> PResult<()> {
        if tokens.is_empty() {
            let position = self.tree.get(parent).position.clone();
            return Err(ParseError::new(&[Rule::Expression], position));
        }

        let layers = layers(tokens);
        if layers.or.is_some() {
            return self.signed_op(tokens, &OR_CHAIN, None, parent, queue);
        }
        if tokens[0].kind == TokenKind::Not || layers.boolean.is_some() {
            return self.signed_op(tokens, &BOOLEAN_CHAIN, None, parent, queue);
        }
        if layers.arithmetic.is_some() {
            return self.signed_op(tokens, &ARITHMETIC_CHAIN, None, parent, queue);
        }

        self.unary(tokens, layers.group, parent, queue)
    }

    // ==================== OPERATOR CHAINS ====================

    /// Build an n-ary operator chain under `parent`
    ///
    /// Operands run up to the next binary operator of the chain; each is
    /// given a fresh `expression` node and queued. With a `candidate` the
    /// chain already has its first operand and `tokens` starts with an
    /// operator.
    fn signed_op<'t>(
        &mut self,
        tokens: &'t [Token],
        chain: &Chain,
        candidate: Option<NodeId>,
        parent: NodeId,
        queue: &mut Queue<'t>,
    ) -> PResult<()> {
        let position = match candidate {
            Some(first) => self.tree.get(first).position.clone(),
            None => self.position_of(tokens, 0),
        };
        let node = self.tree.append(parent, chain.expression, &position);

        let mut expecting_operand = true;
        if let Some(first) = candidate {
            self.tree.push(node, first);
            expecting_operand = false;
        }

        let mut i = 0;
        while let Some(token) = tokens.get(i) {
            if !expecting_operand {
                if !chain.operators.contains(&token.kind) {
                    return Err(self.error(tokens, i, &[Rule::Expression]));
                }
                if chain.include_signs {
                    let sign = self.tree.leaf(chain.operator, token);
                    self.tree.push(node, sign);
                }
                expecting_operand = true;
                i += 1;
                continue;
            }

            if token.kind == TokenKind::Not && chain.negation {
                let sign = self.tree.leaf(chain.operator, token);
                self.tree.push(node, sign);
                i += 1;
                continue;
            }

            if let Some(starts) = chain.operand_start {
                if !starts.contains(&token.kind) {
                    return Err(self.error(tokens, i, &[chain.expression]));
                }
            }

            let end = next_binary(tokens, i, chain.operators).unwrap_or(tokens.len());
            let mut operand = self.tree.append(node, Rule::Expression, &token.position);
            if chain.wrap_groups && token.kind == TokenKind::OpenParen {
                operand = self.tree.append(operand, Rule::Expression, &token.position);
            }
            queue.push_back((&tokens[i..end], operand));
            expecting_operand = false;
            i = end;
        }

        if expecting_operand {
            return Err(self.error(tokens, tokens.len(), &[Rule::Expression]));
        }
        Ok(())
    }

    // ==================== PRIMARIES ====================

    /// Prefixes, then one primary, then an optional property access tail
    ///
    /// `group` is the first group of `tokens` as found by the layer scan.
    fn unary<'t>(
        &mut self,
        tokens: &'t [Token],
        group: Option<(usize, usize)>,
        parent: NodeId,
        queue: &mut Queue<'t>,
    ) -> PResult<()> {
        let mut start = 0;
        while let Some(token) = tokens.get(start) {
            match token.kind {
                TokenKind::Asterisk => {
                    let node = self.tree.leaf(Rule::Dereference, token);
                    self.tree.push(parent, node);
                }
                TokenKind::Ampersand => {
                    let node = self.tree.leaf(Rule::Pointer, token);
                    self.tree.push(parent, node);
                }
                // `&&` in prefix position: a reference to a pointer
                TokenKind::And => {
                    for _ in 0..2 {
                        let node = self.tree.with_value(Rule::Pointer, "&", &token.position);
                        self.tree.push(parent, node);
                    }
                }
                _ => break,
            }
            start += 1;
        }

        let rest = &tokens[start..];
        let Some(first) = rest.first() else {
            return Err(self.error(tokens, tokens.len(), &[Rule::Expression]));
        };
        let group = group
            .filter(|(open, _)| *open >= start)
            .map(|(open, close)| (open - start, close - start));

        if first.kind == TokenKind::OpenBracket {
            return self.array(rest, group, parent, queue);
        }
        if rest.len() == 1 {
            let node = self.primary(first)?;
            self.tree.push(parent, node);
            return Ok(());
        }

        let (candidate, used) = match first.kind {
            TokenKind::OpenParen => {
                let close = close_at(rest, group, 0, TokenKind::OpenParen, TokenKind::CloseParen)
                    .ok_or_else(|| self.error(rest, 0, &[Rule::Expression]))?;
                if close == 1 {
                    return Err(self.error(rest, 1, &[Rule::Expression]));
                }
                if close == rest.len() - 1 {
                    queue.push_back((&rest[1..close], parent));
                    return Ok(());
                }
                let inner = self.tree.node(Rule::Expression, &first.position);
                queue.push_back((&rest[1..close], inner));
                (inner, close + 1)
            }
            TokenKind::New => self.object_creation(rest, group, queue)?,
            _ if rest[1].kind == TokenKind::OpenParen => self.function_call(rest, group, queue)?,
            _ => (self.primary(first)?, 1),
        };

        let tail = &rest[used..];
        let Some(next) = tail.first() else {
            self.tree.push(parent, candidate);
            return Ok(());
        };
        if next.kind != TokenKind::Dot {
            return Err(self.error(tail, 0, &[Rule::PropertyAccess]));
        }
        if self.tree.rule(candidate).is_literal() {
            return Err(self.error(rest, 0, &[Rule::PropertyAccess]));
        }

        let segment = self.tree.node(Rule::Expression, &first.position);
        self.tree.push(segment, candidate);
        self.signed_op(tail, &PROPERTY_CHAIN, Some(segment), parent, queue)
    }

    /// Literal or identifier node for a lone token
    fn primary(&mut self, token: &Token) -> PResult<NodeId> {
        let rule = match token.kind {
            TokenKind::Identifier => Rule::Identifier,
            TokenKind::StringLiteral => Rule::StringLiteral,
            TokenKind::NumberLiteral => Rule::NumberLiteral,
            TokenKind::DecimalLiteral => Rule::DecimalLiteral,
            TokenKind::BoolLiteral => Rule::BooleanLiteral,
            _ => {
                return Err(ParseError::new(
                    &[Rule::Expression],
                    token.position.clone(),
                ));
            }
        };
        Ok(self.tree.leaf(rule, token))
    }

    // ==================== CALLS ====================

    /// `name ( args )`; returns the node and the tokens it spans
    fn function_call<'t>(
        &mut self,
        tokens: &'t [Token],
        group: Option<(usize, usize)>,
        queue: &mut Queue<'t>,
    ) -> PResult<(NodeId, usize)> {
        let name = &tokens[0];
        if name.kind != TokenKind::Identifier {
            return Err(self.error(tokens, 0, &[Rule::FunctionCall]));
        }
        let close = close_at(tokens, group, 1, TokenKind::OpenParen, TokenKind::CloseParen)
            .ok_or_else(|| self.error(tokens, 1, &[Rule::FunctionCall]))?;

        let call = self.tree.node(Rule::FunctionCall, &name.position);
        let identifier = self.tree.leaf(Rule::Identifier, name);
        self.tree.push(call, identifier);
        self.arguments(&tokens[2..close], &tokens[1], call, queue)?;

        Ok((call, close + 1))
    }

    /// `new Name <types>? ( args )`
    fn object_creation<'t>(
        &mut self,
        tokens: &'t [Token],
        group: Option<(usize, usize)>,
        queue: &mut Queue<'t>,
    ) -> PResult<(NodeId, usize)> {
        let keyword = &tokens[0];
        let Some(name) = tokens.get(1).filter(|t| t.kind == TokenKind::Identifier) else {
            return Err(self.error(tokens, 1, &[Rule::ObjectCreation]));
        };

        let creation = self.tree.node(Rule::ObjectCreation, &keyword.position);
        let identifier = self.tree.leaf(Rule::Identifier, name);
        self.tree.push(creation, identifier);
        let mut i = 2;

        if tokens.get(i).map(|t| t.kind) == Some(TokenKind::Less) {
            let close = matching_close(&tokens[i..], TokenKind::Less, TokenKind::Greater)
                .ok_or_else(|| self.error(tokens, i, &[Rule::Generics]))?
                + i;
            let generics = self.generics(&tokens[i + 1..close], &tokens[i])?;
            self.tree.push(creation, generics);
            i = close + 1;
        }

        let close = close_at(tokens, group, i, TokenKind::OpenParen, TokenKind::CloseParen)
            .ok_or_else(|| self.error(tokens, i, &[Rule::ObjectCreation]))?;
        self.arguments(&tokens[i + 1..close], &tokens[i], creation, queue)?;

        Ok((creation, close + 1))
    }

    /// Queue call arguments under a `parameters` node of `owner`
    fn arguments<'t>(
        &mut self,
        inner: &'t [Token],
        open: &Token,
        owner: NodeId,
        queue: &mut Queue<'t>,
    ) -> PResult<()> {
        if inner.is_empty() {
            return Ok(());
        }

        let parts = split_arguments(inner)
            .ok_or_else(|| ParseError::new(&[Rule::Expression], open.position.clone()))?;
        let parameters = self.tree.append(owner, Rule::Parameters, &open.position);
        for part in parts {
            let Some(first) = part.first() else {
                return Err(self.error(inner, inner.len(), &[Rule::Expression]));
            };
            let argument = self.tree.append(parameters, Rule::Expression, &first.position);
            queue.push_back((part, argument));
        }
        Ok(())
    }

    /// `[ a, b, ... ]` covering all of `tokens`
    fn array<'t>(
        &mut self,
        tokens: &'t [Token],
        group: Option<(usize, usize)>,
        parent: NodeId,
        queue: &mut Queue<'t>,
    ) -> PResult<()> {
        let close = close_at(tokens, group, 0, TokenKind::OpenBracket, TokenKind::CloseBracket)
            .ok_or_else(|| self.error(tokens, 0, &[Rule::Array]))?;
        if close != tokens.len() - 1 {
            return Err(self.error(tokens, close + 1, &[Rule::Expression]));
        }

        let array = self.tree.append(parent, Rule::Array, &tokens[0].position);
        let inner = &tokens[1..close];
        if inner.is_empty() {
            return Ok(());
        }

        let parts = split_arguments(inner).ok_or_else(|| self.error(tokens, 0, &[Rule::Array]))?;
        for part in parts {
            let Some(first) = part.first() else {
                return Err(self.error(inner, inner.len(), &[Rule::Expression]));
            };
            let element = self.tree.append(array, Rule::Expression, &first.position);
            queue.push_back((part, element));
        }
        Ok(())
    }
}
