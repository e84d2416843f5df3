//! Cell content model
//!
//! A [`Cell`] owns one [`CellKind`] (empty / text / formula), the memoized
//! value of its formula, and the two adjacency sets that make up the cell
//! graph. All cross-cell links are stored as [`Position`] values and
//! resolved through the [`Sheet`], which is the single owner of every cell.

use std::cell::RefCell;
use std::collections::BTreeSet;

use slate_sheets_core::{CellValue, Error, EvalResult, Position, Result};
use slate_sheets_formula::{parse_formula, Formula};

use crate::sheet::Sheet;

/// Prefix marking a formula cell ("=A1+2")
pub const FORMULA_SIGN: char = '=';

/// Prefix escaping text that would otherwise classify as a formula ("'=x")
pub const ESCAPE_SIGN: char = '\'';

/// The content stored in a cell
#[derive(Debug, Clone)]
pub enum CellKind {
    /// No content; reads as the number zero
    Empty,
    /// Literal text, stored verbatim (including any leading escape)
    Text(String),
    /// A parsed formula
    Formula(Formula),
}

impl CellKind {
    /// Classify raw input text into a cell kind.
    ///
    /// The empty string is `Empty`. Text starting with `=` and at least two
    /// characters long is parsed as a formula; a parse failure is
    /// [`Error::FormulaParse`]. Everything else, including a lone `"="`, is
    /// `Text`.
    pub fn from_input(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(CellKind::Empty);
        }
        if let Some(expression) = text.strip_prefix(FORMULA_SIGN) {
            if !expression.is_empty() {
                let formula =
                    parse_formula(expression).map_err(|e| Error::FormulaParse(e.to_string()))?;
                return Ok(CellKind::Formula(formula));
            }
        }
        Ok(CellKind::Text(text.to_string()))
    }

    /// The positions this kind's formula reads (empty for Empty/Text)
    pub fn referenced(&self) -> &[Position] {
        match self {
            CellKind::Formula(f) => f.referenced_cells(),
            _ => &[],
        }
    }

    /// Check if this is the empty kind
    pub fn is_empty(&self) -> bool {
        matches!(self, CellKind::Empty)
    }

    /// Check if this kind holds a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellKind::Formula(_))
    }
}

/// A single cell: content, formula-value cache, and graph adjacency.
///
/// `refs_out` mirrors the formula's referenced positions; `refs_in` holds
/// the positions whose formulas read this cell. The sheet keeps the two
/// directions symmetric across every edit.
#[derive(Debug, Clone)]
pub struct Cell {
    kind: CellKind,
    /// Memoized formula result; `None` = not yet computed or invalidated.
    /// Interior mutability lets a read-only evaluation pass fill it in.
    cache: RefCell<Option<EvalResult>>,
    pub(crate) refs_out: BTreeSet<Position>,
    pub(crate) refs_in: BTreeSet<Position>,
}

impl Cell {
    /// Create a cell with the given content and no dependents
    pub(crate) fn new(kind: CellKind) -> Self {
        let refs_out = kind.referenced().iter().copied().collect();
        Self {
            kind,
            cache: RefCell::new(None),
            refs_out,
            refs_in: BTreeSet::new(),
        }
    }

    /// Replace the cell's content, dropping its cache and rebuilding
    /// `refs_out`. Dependents (`refs_in`) are preserved; reverse-edge
    /// bookkeeping is the sheet's job.
    pub(crate) fn replace_kind(&mut self, kind: CellKind) {
        self.refs_out = kind.referenced().iter().copied().collect();
        self.kind = kind;
        self.cache.replace(None);
    }

    /// The cell's content
    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    /// The cell's text: `""` for empty, the stored string for text
    /// (escape preserved), and `'='` + the canonical expression for
    /// formulas.
    pub fn text(&self) -> String {
        match &self.kind {
            CellKind::Empty => String::new(),
            CellKind::Text(s) => s.clone(),
            CellKind::Formula(f) => format!("{}{}", FORMULA_SIGN, f.expression()),
        }
    }

    /// The cell's value.
    ///
    /// Empty reads as `0.0`; text reads with a single leading escape
    /// apostrophe stripped; a formula reads its cached result, evaluating
    /// (and caching) through the sheet on a miss.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        match &self.kind {
            CellKind::Empty => CellValue::Number(0.0),
            CellKind::Text(s) => CellValue::Text(
                s.strip_prefix(ESCAPE_SIGN).unwrap_or(s).to_string(),
            ),
            CellKind::Formula(f) => self.evaluate(f, sheet).into(),
        }
    }

    /// Cached-or-computed formula result. Callers guarantee `formula` is
    /// this cell's own kind; split out so the sheet resolver can read a
    /// formula cell without going through [`CellValue`].
    pub(crate) fn evaluate(&self, formula: &Formula, sheet: &Sheet) -> EvalResult {
        if let Some(res) = *self.cache.borrow() {
            return res;
        }
        // The borrow is released before evaluation: the resolver may
        // re-enter other cells' caches, never this one (the graph is
        // acyclic).
        let res = formula.evaluate(&sheet.resolver());
        self.cache.replace(Some(res));
        res
    }

    /// The positions this cell's formula reads, deduplicated, in row-major
    /// order
    pub fn referenced(&self) -> impl Iterator<Item = Position> + '_ {
        self.refs_out.iter().copied()
    }

    /// The positions whose formulas read this cell, in row-major order
    pub fn dependents(&self) -> impl Iterator<Item = Position> + '_ {
        self.refs_in.iter().copied()
    }

    /// Drop the memoized value; a no-op for non-formula cells (they have
    /// nothing cached)
    pub fn invalidate_cache(&self) {
        self.cache.replace(None);
    }

    /// Check whether a formula result is currently memoized
    pub fn is_cached(&self) -> bool {
        self.cache.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_empty() {
        assert!(CellKind::from_input("").unwrap().is_empty());
    }

    #[test]
    fn test_classify_text() {
        assert!(matches!(
            CellKind::from_input("hello").unwrap(),
            CellKind::Text(_)
        ));
        assert!(matches!(
            CellKind::from_input("'=A1").unwrap(),
            CellKind::Text(_)
        ));
        // A lone '=' is text, not a formula
        assert!(matches!(CellKind::from_input("=").unwrap(), CellKind::Text(_)));
    }

    #[test]
    fn test_classify_formula() {
        let kind = CellKind::from_input("=A1+2").unwrap();
        assert!(kind.is_formula());
        assert_eq!(kind.referenced(), &[Position::new(0, 0)]);
    }

    #[test]
    fn test_classify_bad_formula() {
        assert!(matches!(
            CellKind::from_input("=1+"),
            Err(Error::FormulaParse(_))
        ));
        assert!(matches!(
            CellKind::from_input("=hello"),
            Err(Error::FormulaParse(_))
        ));
    }

    #[test]
    fn test_text_forms() {
        let cell = Cell::new(CellKind::from_input("").unwrap());
        assert_eq!(cell.text(), "");

        let cell = Cell::new(CellKind::from_input("'123").unwrap());
        assert_eq!(cell.text(), "'123");

        // Formula text is canonical, not the original input
        let cell = Cell::new(CellKind::from_input("= 1 + (2*A1) ").unwrap());
        assert_eq!(cell.text(), "=1+2*A1");
    }

    #[test]
    fn test_refs_out_follows_kind() {
        let mut cell = Cell::new(CellKind::from_input("=A1+B2").unwrap());
        assert_eq!(cell.refs_out.len(), 2);

        cell.replace_kind(CellKind::from_input("plain").unwrap());
        assert!(cell.refs_out.is_empty());
    }

    #[test]
    fn test_invalidate_cache() {
        let cell = Cell::new(CellKind::from_input("=1+1").unwrap());
        assert!(!cell.is_cached());
        cell.invalidate_cache();
        assert!(!cell.is_cached());
    }
}
