//! Error types for slate-sheets

use crate::position::Position;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors surfaced by edit operations.
///
/// Evaluation failures are *not* represented here: a formula that divides by
/// zero or reads non-numeric text produces a [`crate::CellError`] value, not
/// an `Err`. Only edit-time errors (bad coordinates, malformed formulas,
/// cycles) abort an operation, and they leave the sheet unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// Cell address text could not be parsed (e.g. "1A", "A01", "a1")
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Coordinate outside the fixed grid bounds
    #[error("Position out of bounds: row {row}, col {col}")]
    InvalidPosition {
        /// Row index (0-based)
        row: u32,
        /// Column index (0-based)
        col: u32,
    },

    /// The `=`-prefixed text is not a well-formed formula
    #[error("Formula parse error: {0}")]
    FormulaParse(String),

    /// The proposed edit would make the cell graph cyclic
    #[error("Circular dependency involving cell {0}")]
    CircularDependency(Position),
}

impl Error {
    /// Create an [`Error::InvalidPosition`] from a position
    pub fn invalid_position(pos: Position) -> Self {
        Error::InvalidPosition {
            row: pos.row,
            col: pos.col,
        }
    }
}
