//! Sheet: sparse cell storage and the write transaction
//!
//! The [`Sheet`] owns every cell, keyed by [`Position`]. Edits run as an
//! atomic transaction: parse, cycle-check, edge diff, content swap,
//! dependent invalidation. A rejected edit (bad formula, cycle) leaves the
//! sheet byte-for-byte unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use slate_sheets_core::{CellError, CellValue, Error, EvalResult, Position, Result};
use slate_sheets_formula::Resolver;

use crate::cell::{Cell, CellKind, ESCAPE_SIGN};
use crate::dependency;

/// Sparse row-based storage for cells
///
/// `BTreeMap<row, BTreeMap<col, Cell>>`: row-major, ordered iteration,
/// only populated cells stored, empty row maps pruned on removal.
#[derive(Debug, Clone, Default)]
pub(crate) struct CellStore {
    rows: BTreeMap<u32, BTreeMap<u32, Cell>>,
}

impl CellStore {
    pub(crate) fn get(&self, pos: Position) -> Option<&Cell> {
        self.rows.get(&pos.row).and_then(|r| r.get(&pos.col))
    }

    pub(crate) fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.rows.get_mut(&pos.row).and_then(|r| r.get_mut(&pos.col))
    }

    /// Get the cell at `pos`, creating an empty one if absent
    pub(crate) fn ensure(&mut self, pos: Position) -> &mut Cell {
        self.rows
            .entry(pos.row)
            .or_default()
            .entry(pos.col)
            .or_insert_with(|| Cell::new(CellKind::Empty))
    }

    pub(crate) fn remove(&mut self, pos: Position) -> Option<Cell> {
        let row = self.rows.get_mut(&pos.row)?;
        let cell = row.remove(&pos.col);
        if row.is_empty() {
            self.rows.remove(&pos.row);
        }
        cell
    }

    /// Iterate populated cells in row-major order
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> {
        self.rows.iter().flat_map(|(&row, cols)| {
            cols.iter().map(move |(&col, cell)| (Position::new(row, col), cell))
        })
    }

    pub(crate) fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }
}

/// An in-memory spreadsheet: a sparse grid of cells with lazily evaluated,
/// cached formulas and edit-time cycle rejection.
///
/// # Example
///
/// ```rust
/// use slate_sheets::prelude::*;
///
/// let mut sheet = Sheet::new();
/// sheet.set(Position::parse("A1").unwrap(), "10").unwrap();
/// sheet.set(Position::parse("A2").unwrap(), "=A1*2").unwrap();
///
/// let value = sheet.value(Position::parse("A2").unwrap()).unwrap();
/// assert_eq!(value, CellValue::Number(20.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    cells: CellStore,
}

impl Sheet {
    /// Create an empty sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `text` into the cell at `pos`.
    ///
    /// Runs the full edit transaction: classify the text, reject malformed
    /// formulas ([`Error::FormulaParse`]) and edits that would make the cell
    /// graph cyclic ([`Error::CircularDependency`]), then rewire reverse
    /// edges, swap the content in, and drop the caches of every transitive
    /// dependent. Both rejections leave the sheet unchanged.
    ///
    /// Cells referenced by a formula spring into existence as empty
    /// placeholders. Setting a cell to its own canonical text is a no-op.
    pub fn set(&mut self, pos: Position, text: &str) -> Result<()> {
        if !pos.is_valid() {
            return Err(Error::invalid_position(pos));
        }

        // Canonical text is a fixed point: rewriting it cannot change
        // content, edges, or any dependent's value.
        if let Some(cell) = self.cells.get(pos) {
            if cell.text() == text {
                return Ok(());
            }
        }

        let kind = CellKind::from_input(text)?;
        let new_refs: BTreeSet<Position> = kind.referenced().iter().copied().collect();

        if dependency::creates_cycle(&self.cells, pos, &new_refs) {
            tracing::debug!("edit of {pos} rejected: would create a cycle");
            return Err(Error::CircularDependency(pos));
        }

        // Committed from here on. Rewire reverse edges by set difference.
        let old_refs = self
            .cells
            .get(pos)
            .map(|cell| cell.refs_out.clone())
            .unwrap_or_default();

        for &dropped in old_refs.difference(&new_refs) {
            if let Some(cell) = self.cells.get_mut(dropped) {
                cell.refs_in.remove(&pos);
            }
        }
        for &added in new_refs.difference(&old_refs) {
            self.cells.ensure(added).refs_in.insert(pos);
        }

        self.cells.ensure(pos).replace_kind(kind);

        let invalidated = dependency::invalidate_dependents(&self.cells, pos);
        tracing::trace!("set {pos}: {invalidated} dependent cache(s) dropped");
        Ok(())
    }

    /// Get the cell at `pos`, or `None` if nothing exists there.
    ///
    /// Cells referenced by a formula exist as empty placeholders.
    pub fn get(&self, pos: Position) -> Result<Option<&Cell>> {
        if !pos.is_valid() {
            return Err(Error::invalid_position(pos));
        }
        Ok(self.cells.get(pos))
    }

    /// Read the value at `pos`. Absent cells read as the number zero.
    pub fn value(&self, pos: Position) -> Result<CellValue> {
        Ok(match self.get(pos)? {
            Some(cell) => cell.value(self),
            None => CellValue::Number(0.0),
        })
    }

    /// Read the text at `pos`. Absent cells read as the empty string.
    pub fn text(&self, pos: Position) -> Result<String> {
        Ok(self.get(pos)?.map(|cell| cell.text()).unwrap_or_default())
    }

    /// Clear the cell at `pos`.
    ///
    /// The cell's outgoing edges are removed from its referents. The cell
    /// itself is destroyed when nothing references it; otherwise it is
    /// demoted to an empty placeholder that keeps its dependents. Dependent
    /// caches are dropped either way. Clearing an absent cell is a no-op.
    pub fn clear(&mut self, pos: Position) -> Result<()> {
        if !pos.is_valid() {
            return Err(Error::invalid_position(pos));
        }

        let Some(cell) = self.cells.get(pos) else {
            return Ok(());
        };
        let old_refs = cell.refs_out.clone();
        let keep_placeholder = !cell.refs_in.is_empty();

        for &referent in &old_refs {
            if let Some(cell) = self.cells.get_mut(referent) {
                cell.refs_in.remove(&pos);
            }
        }

        if keep_placeholder {
            if let Some(cell) = self.cells.get_mut(pos) {
                cell.replace_kind(CellKind::Empty);
            }
        } else {
            self.cells.remove(pos);
        }

        let invalidated = dependency::invalidate_dependents(&self.cells, pos);
        tracing::trace!("clear {pos}: {invalidated} dependent cache(s) dropped");
        Ok(())
    }

    /// The smallest rectangle anchored at (0,0) containing every cell whose
    /// text is non-empty. Empty placeholders do not extend it.
    pub fn printable_size(&self) -> (u32, u32) {
        let mut rows = 0;
        let mut cols = 0;
        for (pos, cell) in self.cells.iter() {
            if !cell.kind().is_empty() {
                rows = rows.max(pos.row + 1);
                cols = cols.max(pos.col + 1);
            }
        }
        (rows, cols)
    }

    /// Write the printable rectangle's values: one line per row, cells
    /// separated by tabs, empty cells as empty fields.
    pub fn print_values<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.value(self).to_string())
    }

    /// Write the printable rectangle's texts, same shape as
    /// [`print_values`](Self::print_values).
    pub fn print_texts<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |cell| cell.text())
    }

    fn print_with<W: io::Write>(
        &self,
        out: &mut W,
        render: impl Fn(&Cell) -> String,
    ) -> io::Result<()> {
        let (rows, cols) = self.printable_size();
        for row in 0..rows {
            for col in 0..cols {
                if col > 0 {
                    out.write_all(b"\t")?;
                }
                if let Some(cell) = self.cells.get(Position::new(row, col)) {
                    if !cell.kind().is_empty() {
                        out.write_all(render(cell).as_bytes())?;
                    }
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// The number of cells held, placeholders included
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Iterate populated cells in row-major order, placeholders included
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> {
        self.cells.iter()
    }

    pub(crate) fn resolver(&self) -> SheetResolver<'_> {
        SheetResolver { sheet: self }
    }
}

/// Resolves referenced cells to numbers during formula evaluation.
///
/// Absent or empty cells read as zero; text must be a plain non-negative
/// decimal (digits, at most one `.`) or the read fails with `#VALUE!`;
/// formula cells supply their own (cached) result, propagating errors.
pub(crate) struct SheetResolver<'a> {
    sheet: &'a Sheet,
}

impl Resolver for SheetResolver<'_> {
    fn resolve(&self, pos: Position) -> EvalResult {
        let Some(cell) = self.sheet.cells.get(pos) else {
            return Ok(0.0);
        };
        match cell.kind() {
            CellKind::Empty => Ok(0.0),
            CellKind::Text(s) => text_as_number(s.strip_prefix(ESCAPE_SIGN).unwrap_or(s)),
            CellKind::Formula(f) => cell.evaluate(f, self.sheet),
        }
    }
}

/// Parse text as a plain decimal number: ASCII digits with at most one
/// `.`, finite. Anything else is a `#VALUE!` read.
fn text_as_number(s: &str) -> EvalResult {
    let plain_decimal = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && s.bytes().filter(|&b| b == b'.').count() <= 1;
    if plain_decimal {
        if let Ok(n) = s.parse::<f64>() {
            if n.is_finite() {
                return Ok(n);
            }
        }
    }
    Err(CellError::Value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(s: &str) -> Position {
        Position::parse(s).unwrap()
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "hello").unwrap();

        let cell = sheet.get(pos("A1")).unwrap().unwrap();
        assert_eq!(cell.text(), "hello");
        assert_eq!(cell.value(&sheet), CellValue::Text("hello".into()));
    }

    #[test]
    fn test_get_absent() {
        let sheet = Sheet::new();
        assert!(sheet.get(pos("B2")).unwrap().is_none());
        assert_eq!(sheet.value(pos("B2")).unwrap(), CellValue::Number(0.0));
        assert_eq!(sheet.text(pos("B2")).unwrap(), "");
    }

    #[test]
    fn test_invalid_position_everywhere() {
        let mut sheet = Sheet::new();
        let bad = Position::new(20_000, 0);
        assert!(matches!(sheet.set(bad, "1"), Err(Error::InvalidPosition { .. })));
        assert!(matches!(sheet.get(bad), Err(Error::InvalidPosition { .. })));
        assert!(matches!(sheet.clear(bad), Err(Error::InvalidPosition { .. })));
    }

    #[test]
    fn test_formula_evaluates_through_references() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "10").unwrap();
        sheet.set(pos("A2"), "=A1*2").unwrap();

        assert_eq!(sheet.value(pos("A2")).unwrap(), CellValue::Number(20.0));
    }

    #[test]
    fn test_formula_cache_fills_on_read() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "=1+2").unwrap();

        let cell = sheet.get(pos("A1")).unwrap().unwrap();
        assert!(!cell.is_cached());
        assert_eq!(cell.value(&sheet), CellValue::Number(3.0));
        assert!(cell.is_cached());
    }

    #[test]
    fn test_edit_invalidates_dependents() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "10").unwrap();
        sheet.set(pos("A2"), "=A1*2").unwrap();
        sheet.set(pos("A3"), "=A2+A1").unwrap();

        assert_eq!(sheet.value(pos("A3")).unwrap(), CellValue::Number(30.0));
        assert!(sheet.get(pos("A2")).unwrap().unwrap().is_cached());

        sheet.set(pos("A1"), "4").unwrap();
        assert!(!sheet.get(pos("A2")).unwrap().unwrap().is_cached());
        assert!(!sheet.get(pos("A3")).unwrap().unwrap().is_cached());

        assert_eq!(sheet.value(pos("A2")).unwrap(), CellValue::Number(8.0));
        assert_eq!(sheet.value(pos("A3")).unwrap(), CellValue::Number(12.0));
    }

    #[test]
    fn test_placeholder_created_by_reference() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "=B2").unwrap();

        let placeholder = sheet.get(pos("B2")).unwrap().unwrap();
        assert!(placeholder.kind().is_empty());
        assert_eq!(placeholder.dependents().collect::<Vec<_>>(), vec![pos("A1")]);
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(0.0));
    }

    #[test]
    fn test_rewire_on_formula_change() {
        let mut sheet = Sheet::new();
        sheet.set(pos("C1"), "=A1").unwrap();
        assert_eq!(
            sheet.get(pos("A1")).unwrap().unwrap().dependents().count(),
            1
        );

        sheet.set(pos("C1"), "=B1").unwrap();
        assert_eq!(
            sheet.get(pos("A1")).unwrap().unwrap().dependents().count(),
            0
        );
        assert_eq!(
            sheet.get(pos("B1")).unwrap().unwrap().dependents().collect::<Vec<_>>(),
            vec![pos("C1")]
        );
    }

    #[test]
    fn test_cycle_rejected_without_side_effects() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "=B1").unwrap();
        sheet.set(pos("B1"), "=C1").unwrap();

        // Prime the caches
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(0.0));
        assert!(sheet.get(pos("A1")).unwrap().unwrap().is_cached());

        let err = sheet.set(pos("C1"), "=A1").unwrap_err();
        assert!(matches!(err, Error::CircularDependency(p) if p == pos("C1")));

        // C1 is still the empty placeholder and nothing was invalidated
        assert!(sheet.get(pos("C1")).unwrap().unwrap().kind().is_empty());
        assert!(sheet.get(pos("A1")).unwrap().unwrap().is_cached());
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(0.0));
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut sheet = Sheet::new();
        let err = sheet.set(pos("A1"), "=A1").unwrap_err();
        assert!(matches!(err, Error::CircularDependency(_)));
        assert!(sheet.get(pos("A1")).unwrap().is_none());
    }

    #[test]
    fn test_rejected_edit_keeps_old_content() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "=B1+1").unwrap();
        sheet.set(pos("B1"), "7").unwrap();
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(8.0));

        // Malformed formula
        assert!(matches!(
            sheet.set(pos("A1"), "=1+"),
            Err(Error::FormulaParse(_))
        ));
        assert_eq!(sheet.text(pos("A1")).unwrap(), "=B1+1");
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(8.0));

        // Cycle
        assert!(matches!(
            sheet.set(pos("B1"), "=A1"),
            Err(Error::CircularDependency(_))
        ));
        assert_eq!(sheet.text(pos("B1")).unwrap(), "7");
        assert_eq!(sheet.value(pos("A1")).unwrap(), CellValue::Number(8.0));
    }

    #[test]
    fn test_set_canonical_text_is_noop() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "=1 + 2*B1").unwrap();
        let canonical = sheet.text(pos("A1")).unwrap();
        assert_eq!(canonical, "=1+2*B1");

        // Prime the cache, rewrite the canonical text, cache survives
        sheet.value(pos("A1")).unwrap();
        assert!(sheet.get(pos("A1")).unwrap().unwrap().is_cached());
        sheet.set(pos("A1"), &canonical).unwrap();
        assert!(sheet.get(pos("A1")).unwrap().unwrap().is_cached());
    }

    #[test]
    fn test_clear_removes_unreferenced_cell() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "42").unwrap();
        sheet.clear(pos("A1")).unwrap();
        assert!(sheet.get(pos("A1")).unwrap().is_none());
        assert_eq!(sheet.cell_count(), 0);
    }

    #[test]
    fn test_clear_referenced_cell_leaves_placeholder() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "5").unwrap();
        sheet.set(pos("B1"), "=A1").unwrap();
        assert_eq!(sheet.value(pos("B1")).unwrap(), CellValue::Number(5.0));

        sheet.clear(pos("A1")).unwrap();
        let cell = sheet.get(pos("A1")).unwrap().unwrap();
        assert!(cell.kind().is_empty());
        assert_eq!(cell.dependents().collect::<Vec<_>>(), vec![pos("B1")]);

        // Dependent was invalidated and now reads zero
        assert!(!sheet.get(pos("B1")).unwrap().unwrap().is_cached());
        assert_eq!(sheet.value(pos("B1")).unwrap(), CellValue::Number(0.0));
    }

    #[test]
    fn test_clear_formula_shrinks_referents() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "1").unwrap();
        sheet.set(pos("B1"), "=A1").unwrap();

        sheet.clear(pos("B1")).unwrap();
        assert!(sheet.get(pos("B1")).unwrap().is_none());
        assert_eq!(
            sheet.get(pos("A1")).unwrap().unwrap().dependents().count(),
            0
        );
    }

    #[test]
    fn test_clear_absent_is_noop() {
        let mut sheet = Sheet::new();
        sheet.clear(pos("Z99")).unwrap();
        assert_eq!(sheet.cell_count(), 0);
    }

    #[test]
    fn test_text_as_number() {
        assert_eq!(text_as_number("123"), Ok(123.0));
        assert_eq!(text_as_number("3.5"), Ok(3.5));
        assert_eq!(text_as_number(".5"), Ok(0.5));
        assert_eq!(text_as_number("123."), Ok(123.0));
        assert_eq!(text_as_number(""), Err(CellError::Value));
        assert_eq!(text_as_number("."), Err(CellError::Value));
        assert_eq!(text_as_number("1.2.3"), Err(CellError::Value));
        assert_eq!(text_as_number("-5"), Err(CellError::Value));
        assert_eq!(text_as_number(" 1"), Err(CellError::Value));
        assert_eq!(text_as_number("1e3"), Err(CellError::Value));
        assert_eq!(text_as_number("abc"), Err(CellError::Value));
    }

    #[test]
    fn test_text_number_resolves_in_formula() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "3.5").unwrap();
        sheet.set(pos("B1"), "=A1*2").unwrap();
        assert_eq!(sheet.value(pos("B1")).unwrap(), CellValue::Number(7.0));

        // Escaped digits resolve through the escape-stripped value
        sheet.set(pos("A2"), "'41").unwrap();
        sheet.set(pos("B2"), "=A2+1").unwrap();
        assert_eq!(sheet.value(pos("B2")).unwrap(), CellValue::Number(42.0));
    }

    #[test]
    fn test_non_numeric_text_reads_as_value_error() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "hello").unwrap();
        sheet.set(pos("B1"), "=A1+1").unwrap();
        assert_eq!(
            sheet.value(pos("B1")).unwrap(),
            CellValue::Error(CellError::Value)
        );
    }

    #[test]
    fn test_printable_size_ignores_placeholders() {
        let mut sheet = Sheet::new();
        assert_eq!(sheet.printable_size(), (0, 0));

        sheet.set(pos("B2"), "x").unwrap();
        assert_eq!(sheet.printable_size(), (2, 2));

        // D4 exists only as a placeholder
        sheet.set(pos("A1"), "=D4").unwrap();
        assert_eq!(sheet.printable_size(), (2, 2));

        sheet.clear(pos("B2")).unwrap();
        assert_eq!(sheet.printable_size(), (1, 1));
    }

    #[test]
    fn test_print_texts() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "'123").unwrap();
        sheet.set(pos("C1"), "=1+2").unwrap();
        sheet.set(pos("B2"), "text").unwrap();

        let mut out = Vec::new();
        sheet.print_texts(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "'123\t\t=1+2\n\ttext\t\n");
    }

    #[test]
    fn test_print_values() {
        let mut sheet = Sheet::new();
        sheet.set(pos("A1"), "'123").unwrap();
        sheet.set(pos("C1"), "=1+2").unwrap();
        sheet.set(pos("B2"), "text").unwrap();

        let mut out = Vec::new();
        sheet.print_values(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "123\t\t3\n\ttext\t\n");
    }

    #[test]
    fn test_print_empty_sheet() {
        let sheet = Sheet::new();
        let mut out = Vec::new();
        sheet.print_texts(&mut out).unwrap();
        assert!(out.is_empty());
    }
}
