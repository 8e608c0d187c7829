//! Token slicing helpers shared by every sub-parser

use crate::lexer::{Token, TokenKind};

/// Boolean and comparison operators, `||` included
pub const BOOLEAN_OPERATORS: &[TokenKind] = &[
    TokenKind::And,
    TokenKind::Or,
    TokenKind::Equal,
    TokenKind::NotEqual,
    TokenKind::Greater,
    TokenKind::Less,
    TokenKind::GreaterEq,
    TokenKind::LessEq,
];

/// Boolean operators chained left to right below `||`
pub const BOOLEAN_SLICE: &[TokenKind] = &[
    TokenKind::And,
    TokenKind::Equal,
    TokenKind::NotEqual,
    TokenKind::Greater,
    TokenKind::Less,
    TokenKind::GreaterEq,
    TokenKind::LessEq,
];

pub const ARITHMETIC_OPERATORS: &[TokenKind] = &[
    TokenKind::Plus,
    TokenKind::Minus,
    TokenKind::Asterisk,
    TokenKind::Slash,
];

pub const PROPERTY_OPERATORS: &[TokenKind] = &[TokenKind::Dot];

/// Longest prefix of `tokens` ending right before the first delimiter met
/// outside nesting.
///
/// With `nesting = Some((open, close))` delimiters between `open` and its
/// matching `close` are skipped. Returns `None` when a `close` has no
/// matching `open`, when nesting is left open, or when `required` is set
/// and no delimiter was found.
pub fn extract_before<'t>(
    tokens: &'t [Token],
    delimiters: &[TokenKind],
    nesting: Option<(TokenKind, TokenKind)>,
    required: bool,
) -> Option<&'t [Token]> {
    let mut level = 0usize;

    for (i, token) in tokens.iter().enumerate() {
        if level == 0 && delimiters.contains(&token.kind) {
            return Some(&tokens[..i]);
        }

        if let Some((open, close)) = nesting {
            if token.kind == open {
                level += 1;
            } else if token.kind == close {
                level = level.checked_sub(1)?;
            }
        }
    }

    (!required && level == 0).then_some(tokens)
}

/// Index of the token closing the group opened by `tokens[0]`
pub fn matching_close(tokens: &[Token], open: TokenKind, close: TokenKind) -> Option<usize> {
    if tokens.first()?.kind != open {
        return None;
    }
    extract_before(&tokens[1..], &[close], Some((open, close)), true).map(|inner| inner.len() + 1)
}

/// Split on `sep` tokens met outside nesting
///
/// Every kind in `opens` increases the nesting level and every kind in
/// `closes` decreases it. Returns `None` on unbalanced nesting or when a
/// separator follows an empty segment. The final segment is always
/// present, so empty input yields one empty segment.
pub fn split_by_separator<'t>(
    tokens: &'t [Token],
    sep: TokenKind,
    opens: &[TokenKind],
    closes: &[TokenKind],
) -> Option<Vec<&'t [Token]>> {
    let mut segments = Vec::new();
    let mut level = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        if level == 0 && token.kind == sep {
            if i == start {
                return None;
            }
            segments.push(&tokens[start..i]);
            start = i + 1;
        } else if opens.contains(&token.kind) {
            level += 1;
        } else if closes.contains(&token.kind) {
            level = level.checked_sub(1)?;
        }
    }

    if level != 0 {
        return None;
    }
    segments.push(&tokens[start..]);
    Some(segments)
}

/// Split a comma separated argument or element list
///
/// Nests on `()` and `[]`, and skips the generic list of `new Name<...>`
/// so commas inside it do not split. Comparisons inside an argument are
/// left alone.
pub fn split_arguments(tokens: &[Token]) -> Option<Vec<&[Token]>> {
    let mut segments = Vec::new();
    let mut level = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::Comma if level == 0 => {
                if i == start {
                    return None;
                }
                segments.push(&tokens[start..i]);
                start = i + 1;
            }
            TokenKind::OpenParen | TokenKind::OpenBracket => level += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket => level = level.checked_sub(1)?,
            TokenKind::New => {
                if let Some(end) = creation_generics_end(tokens, i) {
                    i = end;
                }
            }
            _ => {}
        }
        i += 1;
    }

    if level != 0 {
        return None;
    }
    segments.push(&tokens[start..]);
    Some(segments)
}

pub fn contains_any(tokens: &[Token], kinds: &[TokenKind]) -> bool {
    tokens.iter().any(|t| kinds.contains(&t.kind))
}

/// Whether a token can end an operand, making a following operator binary
pub fn ends_operand(kind: TokenKind) -> bool {
    kind.is_literal()
        || matches!(
            kind,
            TokenKind::Identifier | TokenKind::CloseParen | TokenKind::CloseBracket
        )
}

/// Index of the first binary operator of `kinds` at or after `from`
///
/// Only operators outside `()`/`[]` nesting that directly follow an
/// operand count, so the prefix forms of `*`, `&` and `&&` are skipped.
/// The generic list of `new Name<...>` is skipped as well.
pub fn next_binary(tokens: &[Token], from: usize, kinds: &[TokenKind]) -> Option<usize> {
    let mut level = 0usize;
    let mut i = from;

    while i < tokens.len() {
        let kind = tokens[i].kind;
        match kind {
            TokenKind::OpenParen | TokenKind::OpenBracket => level += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket => level = level.saturating_sub(1),
            TokenKind::New => {
                if let Some(end) = creation_generics_end(tokens, i) {
                    i = end + 1;
                    continue;
                }
            }
            _ if level == 0 && kinds.contains(&kind) => {
                if i > 0 && ends_operand(tokens[i - 1].kind) {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Where each layer of an expression slice starts
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    /// First binary `||`
    pub or: Option<usize>,
    /// First binary operator of [`BOOLEAN_SLICE`]
    pub boolean: Option<usize>,
    /// First binary operator of [`ARITHMETIC_OPERATORS`]
    pub arithmetic: Option<usize>,
    /// First `(` or `[` and the index of its matching close
    pub group: Option<(usize, usize)>,
}

/// Tracks the first group of a slice the way [`matching_close`] does
#[derive(Default)]
struct FirstGroup {
    start: Option<(usize, TokenKind, TokenKind)>,
    depth: usize,
    found: Option<(usize, usize)>,
}

impl FirstGroup {
    fn feed(&mut self, i: usize, kind: TokenKind) {
        if self.found.is_some() {
            return;
        }
        match self.start {
            None => {
                let close = match kind {
                    TokenKind::OpenParen => TokenKind::CloseParen,
                    TokenKind::OpenBracket => TokenKind::CloseBracket,
                    _ => return,
                };
                self.start = Some((i, kind, close));
                self.depth = 1;
            }
            Some((start, open, close)) => {
                if kind == open {
                    self.depth += 1;
                } else if kind == close {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.found = Some((start, i));
                    }
                }
            }
        }
    }
}

/// One pass over an expression slice
///
/// Binary operators are found with the rules of [`next_binary`]. The
/// first group is matched on its own bracket kind only.
pub fn layers(tokens: &[Token]) -> Layers {
    let mut layers = Layers::default();
    let mut group = FirstGroup::default();
    let mut level = 0usize;
    let mut i = 0;

    while i < tokens.len() {
        let kind = tokens[i].kind;
        group.feed(i, kind);
        match kind {
            TokenKind::OpenParen | TokenKind::OpenBracket => level += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket => level = level.saturating_sub(1),
            TokenKind::New => {
                if let Some(end) = creation_generics_end(tokens, i) {
                    for (j, token) in tokens.iter().enumerate().take(end + 1).skip(i + 1) {
                        group.feed(j, token.kind);
                    }
                    i = end + 1;
                    continue;
                }
            }
            _ if level == 0 && i > 0 && ends_operand(tokens[i - 1].kind) => {
                if kind == TokenKind::Or {
                    layers.or = layers.or.or(Some(i));
                } else if BOOLEAN_SLICE.contains(&kind) {
                    layers.boolean = layers.boolean.or(Some(i));
                } else if ARITHMETIC_OPERATORS.contains(&kind) {
                    layers.arithmetic = layers.arithmetic.or(Some(i));
                }
            }
            _ => {}
        }
        i += 1;
    }

    layers.group = group.found;
    layers
}

/// Index of the close matching `tokens[at]`, reusing `group` from
/// [`layers`] when it starts there
pub fn close_at(
    tokens: &[Token],
    group: Option<(usize, usize)>,
    at: usize,
    open: TokenKind,
    close: TokenKind,
) -> Option<usize> {
    match group {
        Some((start, end)) if start == at && tokens.get(at).is_some_and(|t| t.kind == open) => {
            Some(end)
        }
        _ => matching_close(tokens.get(at..)?, open, close).map(|end| end + at),
    }
}

/// Index of the `>` closing `new Name<...>` when `tokens[at]` is `new`
fn creation_generics_end(tokens: &[Token], at: usize) -> Option<usize> {
    let name = tokens.get(at + 1)?;
    let open = tokens.get(at + 2)?;
    if name.kind != TokenKind::Identifier || open.kind != TokenKind::Less {
        return None;
    }
    matching_close(&tokens[at + 2..], TokenKind::Less, TokenKind::Greater).map(|end| at + 2 + end)
}
