//! Dependency graph algorithms
//!
//! The cell graph is stored on the cells themselves (`refs_out` /
//! `refs_in`, always kept symmetric); this module provides the traversals
//! that ride on it: cycle detection for a prospective edit, and cache
//! invalidation across transitive dependents.
//!
//! # Edge Direction
//!
//! ```text
//! A ∈ refs_out(B)  means  "B's formula reads A"
//! B ∈ refs_in(A)   means  the same edge, reversed
//! ```
//!
//! Both traversals carry an explicit visited set: the graph is a DAG, and
//! re-convergent fan-in would otherwise make them exponential.

use std::collections::BTreeSet;

use ahash::AHashSet;
use slate_sheets_core::Position;

use crate::sheet::CellStore;

/// Check whether giving `target` the out-edges `new_refs` would create a
/// cycle.
///
/// True iff `target` appears in `new_refs` (self-reference) or is reachable
/// from any member of `new_refs` along existing `refs_out` edges. Positions
/// without a cell contribute no edges and are not created; placeholder
/// creation happens only after the check passes.
pub(crate) fn creates_cycle(
    cells: &CellStore,
    target: Position,
    new_refs: &BTreeSet<Position>,
) -> bool {
    let mut visited: AHashSet<Position> = AHashSet::default();
    let mut stack: Vec<Position> = new_refs.iter().copied().collect();

    while let Some(pos) = stack.pop() {
        if pos == target {
            return true;
        }
        if !visited.insert(pos) {
            continue;
        }
        if let Some(cell) = cells.get(pos) {
            stack.extend(cell.referenced());
        }
    }

    false
}

/// Drop the cached value of every transitive dependent of `start`.
///
/// `start` itself is not touched; the write transaction clears its cache
/// when swapping content. Returns the number of cells visited.
pub(crate) fn invalidate_dependents(cells: &CellStore, start: Position) -> usize {
    let mut visited: AHashSet<Position> = AHashSet::default();
    visited.insert(start);

    let mut stack: Vec<Position> = match cells.get(start) {
        Some(cell) => cell.dependents().collect(),
        None => return 0,
    };

    let mut count = 0;
    while let Some(pos) = stack.pop() {
        if !visited.insert(pos) {
            continue;
        }
        if let Some(cell) = cells.get(pos) {
            cell.invalidate_cache();
            count += 1;
            stack.extend(cell.dependents());
        }
    }

    count
}
