//! Abstract Syntax Tree for the Fluent language
//!
//! Every node has the same shape: a [`Rule`] tag, an optional textual
//! payload, ordered children and the position of the token it came from.

pub mod printer;

use crate::common::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    Program,
    Import,
    Function,
    Module,
    Public,
    Block,
    Templates,
    Generics,
    Parameters,
    Parameter,
    Type,
    Primitive,
    Pointer,
    ArrayType,
    InferredType,
    Declaration,
    IncompleteDeclaration,
    DeclarationType,
    Identifier,
    Expression,
    Assignment,
    BooleanExpression,
    BooleanOperator,
    ArithmeticExpression,
    ArithmeticSign,
    PropertyAccess,
    FunctionCall,
    ObjectCreation,
    Array,
    Dereference,
    StringLiteral,
    NumberLiteral,
    DecimalLiteral,
    BooleanLiteral,
    If,
    ElseIf,
    Else,
    While,
    For,
    Return,
    Break,
    Continue,
    Statement,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Program => "program",
            Rule::Import => "import",
            Rule::Function => "function",
            Rule::Module => "module",
            Rule::Public => "public",
            Rule::Block => "block",
            Rule::Templates => "templates",
            Rule::Generics => "generics",
            Rule::Parameters => "parameters",
            Rule::Parameter => "parameter",
            Rule::Type => "type",
            Rule::Primitive => "primitive",
            Rule::Pointer => "pointer",
            Rule::ArrayType => "array-type",
            Rule::InferredType => "inferred-type",
            Rule::Declaration => "declaration",
            Rule::IncompleteDeclaration => "incomplete-declaration",
            Rule::DeclarationType => "declaration-type",
            Rule::Identifier => "identifier",
            Rule::Expression => "expression",
            Rule::Assignment => "assignment",
            Rule::BooleanExpression => "boolean-expression",
            Rule::BooleanOperator => "boolean-operator",
            Rule::ArithmeticExpression => "arithmetic-expression",
            Rule::ArithmeticSign => "arithmetic-sign",
            Rule::PropertyAccess => "property-access",
            Rule::FunctionCall => "function-call",
            Rule::ObjectCreation => "object-creation",
            Rule::Array => "array",
            Rule::Dereference => "dereference",
            Rule::StringLiteral => "string-literal",
            Rule::NumberLiteral => "number-literal",
            Rule::DecimalLiteral => "decimal-literal",
            Rule::BooleanLiteral => "boolean-literal",
            Rule::If => "if",
            Rule::ElseIf => "else-if",
            Rule::Else => "else",
            Rule::While => "while",
            Rule::For => "for",
            Rule::Return => "return",
            Rule::Break => "break",
            Rule::Continue => "continue",
            Rule::Statement => "statement",
        }
    }

    /// Literal tags produced for single-token expressions
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Rule::StringLiteral | Rule::NumberLiteral | Rule::DecimalLiteral | Rule::BooleanLiteral
        )
    }

    /// Tags of operator nodes inside operator chains
    pub fn is_operator(&self) -> bool {
        matches!(self, Rule::BooleanOperator | Rule::ArithmeticSign)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A syntax tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ast {
    pub rule: Rule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Ast>,
    pub position: Position,
}

impl Ast {
    /// First direct child tagged `rule`
    pub fn child(&self, rule: Rule) -> Option<&Ast> {
        self.children.iter().find(|c| c.rule == rule)
    }

    /// All direct children tagged `rule`
    pub fn children_of(&self, rule: Rule) -> impl Iterator<Item = &Ast> {
        self.children.iter().filter(move |c| c.rule == rule)
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Pre-order traversal of this node and all its descendants
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Structural equality that ignores positions
    pub fn same_shape(&self, other: &Ast) -> bool {
        let mut pending = vec![(self, other)];

        while let Some((a, b)) = pending.pop() {
            if a.rule != b.rule || a.value != b.value || a.children.len() != b.children.len() {
                return false;
            }
            pending.extend(a.children.iter().zip(b.children.iter()));
        }

        true
    }

    /// Indented `rule value { ... }` rendering
    pub fn marshal(&self) -> String {
        enum Step<'a> {
            Open(&'a Ast, usize),
            Close(usize),
        }

        let mut out = String::new();
        let mut stack = vec![Step::Open(self, 0)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Open(node, depth) => {
                    if depth > 0 {
                        out.push('\n');
                        out.push_str(&"  ".repeat(depth));
                    }
                    out.push_str(node.rule.as_str());
                    if let Some(value) = &node.value {
                        out.push(' ');
                        out.push_str(&format!("{value:?}"));
                    }
                    if !node.children.is_empty() {
                        out.push_str(" {");
                        stack.push(Step::Close(depth));
                        stack.extend(
                            node.children
                                .iter()
                                .rev()
                                .map(|child| Step::Open(child, depth + 1)),
                        );
                    }
                }
                Step::Close(depth) => {
                    out.push('\n');
                    out.push_str(&"  ".repeat(depth));
                    out.push('}');
                }
            }
        }
        out
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl Drop for Ast {
    // Unlink descendants iteratively so dropping a deep tree stays off the stack
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Iterator returned by [`Ast::walk`]
pub struct Walk<'a> {
    stack: Vec<&'a Ast>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Ast;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
