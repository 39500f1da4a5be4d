//! Stylesheet parsing error types

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::token::{Token, TokenKind, TokenType};

/// Stylesheet parsing result type
pub type ParseResult<T> = Result<T, ParseError>;

/// Position in the (newline-normalized) source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    #[serde(rename = "col")]
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Stylesheet parsing errors
///
/// Only `Syntax` is recoverable. The others signal a broken invariant in the
/// token stream or the parser and always end the parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{message}")]
    Syntax {
        message: String,
        position: Position,
    },

    #[error("Too much lookahead.")]
    Lookahead,

    #[error("Too much lookbehind.")]
    Lookbehind,

    #[error("Parser made no progress at {position}.")]
    NoProgress {
        position: Position,
    },

    #[error("Values nested too deeply at {position}.")]
    TooDeep {
        position: Position,
    },
}

impl ParseError {
    /// Get the source position of this error, if it has one
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Syntax { position, .. } => Some(*position),
            Self::NoProgress { position } | Self::TooDeep { position } => Some(*position),
            Self::Lookahead | Self::Lookbehind => None,
        }
    }

    /// Whether the parser may recover from this error
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::Syntax { message: message.into(), position }
    }

    /// A required token type was not found
    pub fn expected<K: TokenType>(kind: K, position: Position) -> Self {
        Self::syntax(format!("Expected {} at {}.", kind.name(), position), position)
    }

    /// The token cannot appear where it was found
    pub fn unexpected<K: TokenType>(token: &Token<K>) -> Self {
        let message = if token.kind == K::EOF {
            format!("Unexpected end of input at {}.", token.start)
        } else {
            format!("Unexpected token '{}' at {}.", token.value, token.start)
        };
        Self::syntax(message, token.start)
    }

    /// An at-rule appeared after the point where the grammar allows it
    pub fn not_allowed(kind: TokenKind, position: Position) -> Self {
        let keyword = match kind {
            TokenKind::CharsetSym => "@charset",
            TokenKind::ImportSym => "@import",
            TokenKind::NamespaceSym => "@namespace",
            other => other.name(),
        };
        Self::syntax(format!("{} not allowed here.", keyword), position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        let pos = Position::new(10, 5);
        assert_eq!(format!("{}", pos), "line 10, col 5");
    }

    #[test]
    fn test_expected_message() {
        let err = ParseError::expected(TokenKind::Rbrace, Position::new(1, 15));
        assert_eq!(err.to_string(), "Expected RBRACE at line 1, col 15.");
        assert_eq!(err.position(), Some(Position::new(1, 15)));
        assert!(err.is_syntax());
    }

    #[test]
    fn test_unexpected_message() {
        let token = Token::new(TokenKind::Rbrace, "}", Position::new(2, 1), Position::new(2, 2));
        let err = ParseError::unexpected(&token);
        assert_eq!(err.to_string(), "Unexpected token '}' at line 2, col 1.");
    }

    #[test]
    fn test_not_allowed_message() {
        let err = ParseError::not_allowed(TokenKind::ImportSym, Position::new(3, 1));
        assert_eq!(err.to_string(), "@import not allowed here.");
    }

    #[test]
    fn test_internal_errors_have_no_position() {
        assert_eq!(ParseError::Lookahead.position(), None);
        assert!(!ParseError::Lookbehind.is_syntax());
        assert_eq!(ParseError::Lookahead.to_string(), "Too much lookahead.");
    }

    #[test]
    fn test_too_deep_is_fatal() {
        let err = ParseError::TooDeep { position: Position::new(1, 7) };
        assert!(!err.is_syntax());
        assert_eq!(err.position(), Some(Position::new(1, 7)));
        assert_eq!(err.to_string(), "Values nested too deeply at line 1, col 7.");
    }
}
