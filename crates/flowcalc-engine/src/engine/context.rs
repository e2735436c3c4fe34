//! The read-only cell access capability used by the evaluator.

use std::collections::HashMap;

use super::cell_ref::{CellRange, CellRef};
use super::value::Value;

/// Read access to current cell values, implemented by the grid layer.
///
/// The evaluator borrows a context only for the duration of one call and
/// never mutates it.
pub trait FormulaContext {
    /// Current value at `(row, col)`, or None for a cell that holds nothing.
    fn get_cell_value(&self, row: usize, col: usize) -> Option<Value>;

    /// Values of the normalized rectangle between two corners, row-major.
    fn get_cell_range(&self, r1: usize, c1: usize, r2: usize, c2: usize) -> Vec<Option<Value>> {
        CellRange::new(CellRef::new(r1, c1), CellRef::new(r2, c2))
            .cells()
            .into_iter()
            .map(|cell| self.get_cell_value(cell.row, cell.col))
            .collect()
    }
}

impl FormulaContext for HashMap<CellRef, Value> {
    fn get_cell_value(&self, row: usize, col: usize) -> Option<Value> {
        self.get(&CellRef::new(row, col)).cloned()
    }
}
