//! Arena of parse nodes
//!
//! Sub-parsers create a parent before its children exist and append
//! children as deferred work completes, so sibling order always follows
//! source order. Finished trees are turned into owned [`Ast`] values
//! without recursing on depth.

use crate::ast::{Ast, Rule};
use crate::common::Position;
use crate::lexer::Token;
use id_arena::{Arena, Id};

pub type NodeId = Id<Node>;

#[derive(Debug, Clone)]
pub struct Node {
    pub rule: Rule,
    pub value: Option<String>,
    pub position: Position,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub struct Tree {
    arena: Arena<Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node without a value
    pub fn node(&mut self, rule: Rule, position: &Position) -> NodeId {
        self.arena.alloc(Node {
            rule,
            value: None,
            position: position.clone(),
            children: Vec::new(),
        })
    }

    /// Create a detached node carrying the token's text
    pub fn leaf(&mut self, rule: Rule, token: &Token) -> NodeId {
        self.with_value(rule, token.value.clone(), &token.position)
    }

    pub fn with_value(
        &mut self,
        rule: Rule,
        value: impl Into<String>,
        position: &Position,
    ) -> NodeId {
        self.arena.alloc(Node {
            rule,
            value: Some(value.into()),
            position: position.clone(),
            children: Vec::new(),
        })
    }

    pub fn push(&mut self, parent: NodeId, child: NodeId) {
        self.arena[parent].children.push(child);
    }

    /// Create a node and append it to `parent`
    pub fn append(&mut self, parent: NodeId, rule: Rule, position: &Position) -> NodeId {
        let child = self.node(rule, position);
        self.push(parent, child);
        child
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn rule(&self, id: NodeId) -> Rule {
        self.arena[id].rule
    }

    pub fn set_rule(&mut self, id: NodeId, rule: Rule) {
        self.arena[id].rule = rule;
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.arena[id].children
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    /// Build the owned tree rooted at `root`
    pub fn to_ast(&self, root: NodeId) -> Ast {
        // Post-order: children are finished before their parent pops them
        let mut stack = vec![(root, false)];
        let mut done: Vec<Ast> = Vec::new();

        while let Some((id, expanded)) = stack.pop() {
            let node = &self.arena[id];
            if !expanded {
                stack.push((id, true));
                stack.extend(node.children.iter().rev().map(|&c| (c, false)));
                continue;
            }

            let children = done.split_off(done.len() - node.children.len());
            done.push(Ast {
                rule: node.rule,
                value: node.value.clone(),
                children,
                position: node.position.clone(),
            });
        }

        // Exactly one value remains: the root
        done.pop().unwrap_or_else(|| Ast {
            rule: self.arena[root].rule,
            value: None,
            children: Vec::new(),
            position: self.arena[root].position.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;

    #[test]
    fn test_children_keep_append_order() {
        let pos = Position::start_of("t");
        let mut tree = Tree::new();
        assert!(tree.is_empty());
        let root = tree.node(Rule::Block, &pos);
        assert!(!tree.is_empty());
        let first = tree.append(root, Rule::Expression, &pos);
        let second = tree.append(root, Rule::Return, &pos);

        // Filling the first child after the second exists
        let tok = Token::new(TokenKind::Identifier, "x", pos.clone());
        let x = tree.leaf(Rule::Identifier, &tok);
        tree.push(first, x);

        let ast = tree.to_ast(root);
        assert_eq!(ast.children.len(), 2);
        assert_eq!(ast.children[0].rule, Rule::Expression);
        assert_eq!(ast.children[0].children[0].value(), Some("x"));
        assert_eq!(ast.children[1].rule, tree.rule(second));
    }

    #[test]
    fn test_deep_tree_does_not_overflow() {
        let pos = Position::start_of("t");
        let mut tree = Tree::new();
        let root = tree.node(Rule::Expression, &pos);
        let mut current = root;
        for _ in 0..200_000 {
            current = tree.append(current, Rule::Expression, &pos);
        }

        let ast = tree.to_ast(root);
        assert_eq!(ast.walk().count(), 200_001);
    }
}
