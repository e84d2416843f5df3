//! # slate-sheets-core
//!
//! Core data structures for the slate-sheets spreadsheet engine.
//!
//! This crate provides the fundamental types used throughout slate-sheets:
//! - [`Position`] - A cell's grid coordinate with A1-notation parsing
//! - [`CellValue`] - The result of reading a cell (number, text, or error)
//! - [`CellError`] - Evaluation error values (`#REF!`, `#VALUE!`, `#ARITHM!`)
//! - [`Error`] - Structural errors surfaced by edit operations
//!
//! ## Example
//!
//! ```rust
//! use slate_sheets_core::Position;
//!
//! let pos = Position::parse("AA27").unwrap();
//! assert_eq!(pos, Position::new(26, 26));
//! assert_eq!(pos.to_a1_string(), "AA27");
//! ```

pub mod error;
pub mod position;
pub mod value;

pub use error::{Error, Result};
pub use position::Position;
pub use value::{CellError, CellValue, EvalResult};

/// Maximum number of rows in a sheet
pub const MAX_ROWS: u32 = 16_384;

/// Maximum number of columns in a sheet
pub const MAX_COLS: u32 = 16_384;
