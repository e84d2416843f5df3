//! Prelude module - common imports for slate-sheets users
//!
//! ```rust
//! use slate_sheets::prelude::*;
//! ```

pub use crate::{
    // Cell types
    Cell,
    CellError,
    CellKind,
    CellValue,
    // Error types
    Error,
    // Formula types
    Formula,
    Position,
    Result,
    // Main type
    Sheet,
    // Constants
    MAX_COLS,
    MAX_ROWS,
};
