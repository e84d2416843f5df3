//! Cell value and evaluation error types

use std::fmt;

/// Result of evaluating a formula: a finite number or an error category
pub type EvalResult = std::result::Result<f64, CellError>;

/// Evaluation error values (#REF!, #VALUE!, #ARITHM!)
///
/// These are ordinary cell *values*, not control-flow errors: a formula that
/// fails to evaluate stores and displays its error category, and dependent
/// formulas propagate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #REF! - Reference outside the grid bounds
    Ref,
    /// #VALUE! - Non-numeric text where a number was required
    Value,
    /// #ARITHM! - Division by zero or other non-finite result
    Arithmetic,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Ref => "#REF!",
            CellError::Value => "#VALUE!",
            CellError::Arithmetic => "#ARITHM!",
        }
    }

    /// Parse an error display string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "#REF!" => Some(CellError::Ref),
            "#VALUE!" => Some(CellError::Value),
            "#ARITHM!" => Some(CellError::Arithmetic),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The value produced by reading a cell
///
/// Empty cells read as `Number(0.0)`; text cells read as `Text` with the
/// leading escape apostrophe stripped; formula cells read as `Number` or,
/// when evaluation fails, as `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Numeric value
    Number(f64),
    /// Text value
    Text(String),
    /// Evaluation error value
    Error(CellError),
}

impl CellValue {
    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the error category, if this is an error value
    pub fn as_error(&self) -> Option<CellError> {
        match self {
            CellValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Check if this is an error value
    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Number(0.0)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

impl From<EvalResult> for CellValue {
    fn from(res: EvalResult) -> Self {
        match res {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}
