//! # slate-sheets
//!
//! An in-memory spreadsheet engine: a sparse two-dimensional grid of cells
//! where each cell holds nothing, literal text, or a formula evaluated
//! lazily over the grid.
//!
//! The engine maintains a bidirectional dependency graph between cells,
//! rejects circular references before they can take effect, and invalidates
//! cached formula values exactly where needed.
//!
//! ## Features
//!
//! - Lazy, cached formula evaluation with exact invalidation
//! - Edit-time circular-reference rejection (rejected edits change nothing)
//! - Implicit empty placeholders for referenced-but-unset cells
//! - A1 addressing and tab-separated text/value dumps
//!
//! ## Example
//!
//! ```rust
//! use slate_sheets::prelude::*;
//!
//! let mut sheet = Sheet::new();
//! let a1 = Position::parse("A1").unwrap();
//! let a2 = Position::parse("A2").unwrap();
//!
//! sheet.set(a1, "10").unwrap();
//! sheet.set(a2, "=A1*2").unwrap();
//! assert_eq!(sheet.value(a2).unwrap(), CellValue::Number(20.0));
//!
//! // Editing A1 invalidates A2's cached value
//! sheet.set(a1, "7").unwrap();
//! assert_eq!(sheet.value(a2).unwrap(), CellValue::Number(14.0));
//!
//! // Cycles are rejected before any state changes
//! assert!(sheet.set(a1, "=A2").is_err());
//! ```

pub mod cell;
pub mod prelude;
pub mod sheet;

mod dependency;

pub use cell::{Cell, CellKind, ESCAPE_SIGN, FORMULA_SIGN};
pub use sheet::Sheet;

// Re-export core types
pub use slate_sheets_core::{
    CellError, CellValue, Error, EvalResult, Position, Result, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use slate_sheets_formula::{parse_formula, Formula, ParseError, Resolver};
