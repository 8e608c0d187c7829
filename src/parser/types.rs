//! Types, parameter lists, templates and generics

use super::tree::NodeId;
use super::util::{matching_close, split_by_separator};
use super::{PResult, Parser, Queue};
use crate::ast::Rule;
use crate::lexer::{Token, TokenKind};

impl Parser {
    // ==================== TYPES ====================

    /// Parse `tokens` as one type
    ///
    /// Generic arguments are queued and filled in after their enclosing
    /// type, so nesting depth does not grow the stack.
    pub(super) fn type_node<'t>(&mut self, tokens: &'t [Token]) -> PResult<NodeId> {
        let position = self.position_of(tokens, 0);
        let root = self.tree.node(Rule::Type, &position);
        let mut queue: Queue<'t> = Queue::new();
        queue.push_back((tokens, root));

        while let Some((item, node)) = queue.pop_front() {
            self.type_item(item, node, &mut queue)?;
        }
        Ok(root)
    }

    /// `&`* base (`<args>`)? `[]`*
    fn type_item<'t>(
        &mut self,
        tokens: &'t [Token],
        node: NodeId,
        queue: &mut Queue<'t>,
    ) -> PResult<()> {
        let mut i = 0;
        let mut pointers = 0;

        while let Some(token) = tokens.get(i) {
            let count = match token.kind {
                TokenKind::Ampersand => 1,
                TokenKind::And => 2,
                _ => break,
            };
            for _ in 0..count {
                let pointer = self.tree.with_value(Rule::Pointer, "&", &token.position);
                self.tree.push(node, pointer);
            }
            pointers += count;
            i += 1;
        }

        let Some(base) = tokens.get(i) else {
            return Err(self.error(tokens, i, &[Rule::Type]));
        };
        let is_nothing = base.kind == TokenKind::Nothing;

        if base.kind.is_primitive() {
            if is_nothing && pointers > 0 {
                return Err(self.error(tokens, i, &[Rule::Type]));
            }
            let primitive = self.tree.leaf(Rule::Primitive, base);
            self.tree.push(node, primitive);
            i += 1;
        } else if base.kind == TokenKind::Identifier {
            let name = self.tree.leaf(Rule::Identifier, base);
            self.tree.push(node, name);
            i += 1;

            if tokens.get(i).map(|t| t.kind) == Some(TokenKind::Less) {
                let close = matching_close(&tokens[i..], TokenKind::Less, TokenKind::Greater)
                    .ok_or_else(|| self.error(tokens, i, &[Rule::Type]))?
                    + i;
                let inner = &tokens[i + 1..close];

                if inner.is_empty() {
                    self.tree.append(name, Rule::InferredType, &tokens[i].position);
                } else {
                    let parts = split_by_separator(
                        inner,
                        TokenKind::Comma,
                        &[TokenKind::Less],
                        &[TokenKind::Greater],
                    )
                    .ok_or_else(|| self.error(tokens, i, &[Rule::Type]))?;
                    for part in parts {
                        let Some(first) = part.first() else {
                            return Err(self.error(tokens, close, &[Rule::Type]));
                        };
                        let argument = self.tree.append(name, Rule::Type, &first.position);
                        queue.push_back((part, argument));
                    }
                }
                i = close + 1;
            }
        } else {
            return Err(self.error(tokens, i, &[Rule::Type]));
        }

        while tokens.get(i).map(|t| t.kind) == Some(TokenKind::OpenBracket) {
            if tokens.get(i + 1).map(|t| t.kind) != Some(TokenKind::CloseBracket) {
                return Err(self.error(tokens, i + 1, &[Rule::ArrayType]));
            }
            if is_nothing {
                return Err(self.error(tokens, i, &[Rule::Type]));
            }
            self.tree.append(node, Rule::ArrayType, &tokens[i].position);
            i += 2;
        }

        // A second base or anything else trailing
        if i < tokens.len() {
            return Err(self.error(tokens, i, &[Rule::Type]));
        }
        Ok(())
    }

    // ==================== PARAMETERS ====================

    /// `name: Type, ...` between the parentheses opened by `open`
    pub(super) fn parameters(&mut self, inner: &[Token], open: &Token) -> PResult<NodeId> {
        enum State {
            Name,
            Colon,
            Type { from: usize, depth: usize },
        }

        let parameters = self.tree.node(Rule::Parameters, &open.position);
        let mut state = State::Name;
        let mut name = 0;

        for (i, token) in inner.iter().enumerate() {
            state = match state {
                State::Name if token.kind == TokenKind::Identifier => {
                    name = i;
                    State::Colon
                }
                State::Colon if token.kind == TokenKind::Colon => State::Type {
                    from: i + 1,
                    depth: 0,
                },
                State::Name | State::Colon => {
                    return Err(self.error(inner, i, &[Rule::Parameter]));
                }
                State::Type { from, depth } => match token.kind {
                    TokenKind::Comma if depth == 0 => {
                        self.parameter(parameters, inner, name, from, i)?;
                        State::Name
                    }
                    TokenKind::Less => State::Type {
                        from,
                        depth: depth + 1,
                    },
                    TokenKind::Greater => State::Type {
                        from,
                        depth: depth.saturating_sub(1),
                    },
                    _ => State::Type { from, depth },
                },
            };
        }

        match state {
            State::Type { from, .. } => {
                self.parameter(parameters, inner, name, from, inner.len())?;
            }
            State::Name if inner.is_empty() => {}
            _ => return Err(self.error(inner, inner.len(), &[Rule::Parameter])),
        }
        Ok(parameters)
    }

    /// `parameter [identifier, type]` from `inner[name]` and `inner[from..to]`
    fn parameter(
        &mut self,
        parameters: NodeId,
        inner: &[Token],
        name: usize,
        from: usize,
        to: usize,
    ) -> PResult<()> {
        if from >= to {
            return Err(self.error(inner, to, &[Rule::Type]));
        }
        let token = &inner[name];
        let parameter = self.tree.append(parameters, Rule::Parameter, &token.position);
        let identifier = self.tree.leaf(Rule::Identifier, token);
        self.tree.push(parameter, identifier);
        let ty = self.type_node(&inner[from..to])?;
        self.tree.push(parameter, ty);
        Ok(())
    }

    // ==================== TEMPLATES & GENERICS ====================

    /// Declaration-site `< T, U >`, delimiters included
    pub(super) fn templates(&mut self, tokens: &[Token]) -> PResult<NodeId> {
        let templates = self.tree.node(Rule::Templates, &tokens[0].position);
        let names = &tokens[1..tokens.len() - 1];
        if names.is_empty() {
            return Err(self.error(tokens, 1, &[Rule::Templates]));
        }

        for (i, token) in names.iter().enumerate() {
            let expected = if i % 2 == 0 {
                TokenKind::Identifier
            } else {
                TokenKind::Comma
            };
            if token.kind != expected {
                return Err(self.error(tokens, i + 1, &[Rule::Templates]));
            }
            if expected == TokenKind::Identifier {
                let name = self.tree.leaf(Rule::Identifier, token);
                self.tree.push(templates, name);
            }
        }

        // Must end on a name, not a comma
        if names.len() % 2 == 0 {
            return Err(self.error(tokens, tokens.len() - 1, &[Rule::Templates]));
        }
        Ok(templates)
    }

    /// Use-site type arguments between `open` (`<`) and its `>`
    pub(super) fn generics(&mut self, inner: &[Token], open: &Token) -> PResult<NodeId> {
        let generics = self.tree.node(Rule::Generics, &open.position);
        if inner.is_empty() {
            self.tree.append(generics, Rule::InferredType, &open.position);
            return Ok(generics);
        }

        let parts = split_by_separator(
            inner,
            TokenKind::Comma,
            &[TokenKind::Less],
            &[TokenKind::Greater],
        )
        .ok_or_else(|| self.error(inner, 0, &[Rule::Generics]))?;
        for part in parts {
            if part.is_empty() {
                return Err(self.error(inner, inner.len(), &[Rule::Type]));
            }
            let ty = self.type_node(part)?;
            self.tree.push(generics, ty);
        }
        Ok(generics)
    }
}
