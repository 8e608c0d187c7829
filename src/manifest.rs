//! Package manifest reader
//!
//! A manifest (`package.fluent`) is a list of `Key = "value";`
//! assignments parsed with the regular block parser.

use crate::ast::{Ast, Rule};
use crate::common::Position;
use crate::lexer::{LexError, lex};
use crate::parser::{ParseError, parse_block};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;
use thiserror::Error;

/// File name a package manifest is looked up under
pub const MANIFEST_FILE: &str = "package.fluent";

/// Keys a manifest may assign
pub const KEYS: [&str; 6] = ["Name", "Version", "Description", "Author", "License", "Entry"];

/// Package metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub license: String,
    pub entry: String,
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("only `Key = \"value\";` assignments are allowed, found {rule} at {position}")]
    NotAnAssignment { rule: Rule, position: Position },

    #[error("unknown manifest key `{key}` at {position}")]
    UnknownKey { key: String, position: Position },

    #[error("manifest key must be a plain name at {position}")]
    InvalidKey { position: Position },

    #[error("manifest value must be a string literal at {position}")]
    NotAString { position: Position },
}

impl ManifestError {
    /// Source position the error points at, if any
    pub fn position(&self) -> Option<&Position> {
        match self {
            ManifestError::Io { .. } => None,
            ManifestError::Lex(err) => Some(err.position()),
            ManifestError::Parse(err) => Some(&err.position),
            ManifestError::NotAnAssignment { position, .. }
            | ManifestError::UnknownKey { position, .. }
            | ManifestError::InvalidKey { position }
            | ManifestError::NotAString { position } => Some(position),
        }
    }
}

impl Package {
    /// Read and parse the manifest at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        parse_manifest(&source, &path.to_string_lossy())
    }

    /// Value assigned to `key`, if it is a manifest key
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "Name" => &self.name,
            "Version" => &self.version,
            "Description" => &self.description,
            "Author" => &self.author,
            "License" => &self.license,
            "Entry" => &self.entry,
            _ => return None,
        };
        Some(value)
    }

    fn slot(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "Name" => Some(&mut self.name),
            "Version" => Some(&mut self.version),
            "Description" => Some(&mut self.description),
            "Author" => Some(&mut self.author),
            "License" => Some(&mut self.license),
            "Entry" => Some(&mut self.entry),
            _ => None,
        }
    }

    /// Manifest source assigning every non-empty key
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for key in KEYS {
            let value = self.get(key).unwrap_or_default();
            if value.is_empty() {
                continue;
            }
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(out, "{key} = \"{escaped}\";");
        }
        out
    }
}

/// Parse manifest `source`, attributing positions to `file`
pub fn parse_manifest(source: &str, file: &str) -> Result<Package, ManifestError> {
    let tokens = lex(source, file)?;
    let block = parse_block(&tokens, file)?;
    let mut package = Package::default();
    let mut seen = FxHashSet::default();

    for statement in &block.children {
        if statement.rule != Rule::Assignment {
            return Err(ManifestError::NotAnAssignment {
                rule: statement.rule,
                position: statement.position.clone(),
            });
        }

        let (key, value) = match statement.children.as_slice() {
            [target, value] => (single(target), single(value)),
            _ => (None, None),
        };
        let key = key
            .filter(|k| k.rule == Rule::Identifier)
            .ok_or_else(|| ManifestError::InvalidKey {
                position: statement.position.clone(),
            })?;
        let value = value
            .filter(|v| v.rule == Rule::StringLiteral)
            .ok_or_else(|| ManifestError::NotAString {
                position: statement.children[1].position.clone(),
            })?;

        let name = key.value().unwrap_or_default();
        if !seen.insert(name) {
            tracing::warn!(key = name, position = %key.position, "manifest key assigned twice");
        }
        let slot = package
            .slot(name)
            .ok_or_else(|| ManifestError::UnknownKey {
                key: name.to_string(),
                position: key.position.clone(),
            })?;
        *slot = value.value().unwrap_or_default().to_string();
    }

    tracing::debug!(file, name = %package.name, "read package manifest");
    Ok(package)
}

/// The only child of an expression node
fn single(expression: &Ast) -> Option<&Ast> {
    match expression.children.as_slice() {
        [only] => Some(only),
        _ => None,
    }
}
