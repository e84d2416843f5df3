//! Cell position type
//!
//! Positions are 0-based `(row, col)` pairs with a textual A1 form: column
//! letters in bijective base-26 (`A=0, …, Z=25, AA=26, …`) followed by a
//! 1-based row number.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A grid coordinate (e.g. "A1", "AA27")
///
/// The numeric form is 0-based in both axes; the textual form uses 1-based
/// rows. Ordering is row-major, which gives deterministic iteration when
/// positions are used as ordered-map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ...)
    pub col: u32,
}

impl Position {
    /// Create a new position
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Check that both coordinates are inside the fixed grid bounds
    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse a position from A1-style notation
    ///
    /// Accepts one or more uppercase letters followed by one or more decimal
    /// digits. Leading zeros in the row part are rejected, as are lowercase
    /// letters and `$` markers.
    ///
    /// # Examples
    /// ```
    /// use slate_sheets_core::Position;
    ///
    /// assert_eq!(Position::parse("A1").unwrap(), Position::new(0, 0));
    /// assert_eq!(Position::parse("B3").unwrap(), Position::new(2, 1));
    /// assert!(Position::parse("a1").is_err());
    /// assert!(Position::parse("A01").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();

        let letters_end = bytes
            .iter()
            .position(|b| !b.is_ascii_uppercase())
            .unwrap_or(bytes.len());
        if letters_end == 0 {
            return Err(Error::InvalidAddress(format!("no column letters in '{s}'")));
        }

        let digits = &s[letters_end..];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!("no row number in '{s}'")));
        }
        if digits.starts_with('0') {
            return Err(Error::InvalidAddress(format!(
                "leading zero in row number in '{s}'"
            )));
        }

        let col = Self::letters_to_column(&s[..letters_end])?;
        let row: u64 = digits
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("row number too large in '{s}'")))?;
        // Text rows are 1-based; row "0" is already excluded by the
        // leading-zero rule.
        let row = row - 1;

        if row >= MAX_ROWS as u64 || col >= MAX_COLS as u64 {
            return Err(Error::InvalidPosition {
                row: row.min(u32::MAX as u64) as u32,
                col: col.min(u32::MAX as u64) as u32,
            });
        }

        Ok(Self {
            row: row as u32,
            col: col as u32,
        })
    }

    /// Convert column letters to an index (A = 0, Z = 25, AA = 26, ...)
    pub fn letters_to_column(letters: &str) -> Result<u64> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(Error::InvalidAddress(format!(
                "invalid column letters '{letters}'"
            )));
        }

        let mut col: u64 = 0;
        for b in letters.bytes() {
            col = col * 26 + (b - b'A') as u64 + 1;
            if col > u32::MAX as u64 {
                return Err(Error::InvalidAddress(format!(
                    "column letters out of range: '{letters}'"
                )));
            }
        }

        Ok(col - 1)
    }

    /// Convert a column index to letters (0 = A, 25 = Z, 26 = AA, ...)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col as u64 + 1;

        while n > 0 {
            n -= 1;
            result.insert(0, ((n % 26) as u8 + b'A') as char);
            n /= 26;
        }

        result
    }

    /// Format as an A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row as u64 + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
