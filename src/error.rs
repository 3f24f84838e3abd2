//! Error kinds raised by the conversion pipeline.
//!
//! Functions across the crate return [anyhow::Result]; the types below are
//! the concrete errors behind it, so callers can tell a lexing failure from
//! a grammar failure with `downcast_ref`.

use std::fmt;

use thiserror::Error;

/// 1-based line and column of a byte offset in the source text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Resolves `offset` (a byte index into `source`) to a line and column.
    pub fn locate(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);

        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |pos| pos + 1);
        let column = before[line_start..].chars().count() + 1;

        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Input contains a character sequence no token matches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized input {text:?} at {position}")]
pub struct LexError {
    pub position: Position,
    pub text: String,
}

/// Token sequence doesn't fit the grammar at `position`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unexpected {found} at {position}, expected {expected}")]
pub struct SyntaxError {
    pub position: Position,
    /// Offending token, or `end of input`.
    pub found: String,
    pub expected: String,
}

/// Projected document can't be represented as JSON.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to serialize document: {0}")]
pub struct SerializationError(pub String);
