//! Formula parse error types

use thiserror::Error;

/// Result type for formula parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors produced while parsing a formula expression
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A character that cannot start any token
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar {
        /// The offending character
        ch: char,
        /// Byte offset into the expression text
        offset: usize,
    },

    /// The expression ended where an operand or operator was required
    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    /// A token that is not valid at this point in the expression
    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),

    /// Unbalanced parentheses
    #[error("Expected ')'")]
    UnclosedParen,

    /// A numeric literal that does not fit in an f64 or is malformed
    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),

    /// A cell reference whose row or column cannot be represented
    #[error("Invalid cell reference '{0}'")]
    InvalidReference(String),
}
