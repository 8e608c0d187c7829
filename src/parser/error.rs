//! Structured parse errors

use crate::ast::Rule;
use crate::common::Position;
use thiserror::Error;

/// The first error met while parsing
///
/// `expected` lists the rules that would have been accepted at
/// `position`; it is never empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("expected {} at {position}", describe(.expected))]
pub struct ParseError {
    pub expected: Vec<Rule>,
    pub position: Position,
}

pub type PResult<T> = Result<T, ParseError>;

impl ParseError {
    pub fn new(expected: &[Rule], position: Position) -> Self {
        debug_assert!(!expected.is_empty());
        Self {
            expected: expected.to_vec(),
            position,
        }
    }

    /// Whether `rule` is one of the expected rules
    pub fn expects(&self, rule: Rule) -> bool {
        self.expected.contains(&rule)
    }

    /// Human readable list of the expected rules: `a, b or c`
    pub fn expected_list(&self) -> String {
        describe(&self.expected)
    }
}

fn describe(expected: &[Rule]) -> String {
    match expected {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => {
            let init: Vec<&str> = init.iter().map(Rule::as_str).collect();
            format!("{} or {}", init.join(", "), last)
        }
    }
}
