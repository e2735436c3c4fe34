//! A sheet document: cells, the reverse dependency map and recalculation.
//!
//! The engine evaluates one formula at a time against a read-only
//! [`FormulaContext`]. `Sheet` is that context plus the bookkeeping the
//! engine leaves to its caller: which cells read which, what is stale, and
//! the order stale formulas must be recomputed in.

mod cell;
mod cycle;
mod ops;

pub use cell::{Cell, CellType, Grid};

use std::collections::{HashMap, HashSet};

use flowcalc_engine::engine::{CellRef, DEFAULT_DECIMALS, FormulaContext, Value, format_value_with};

pub struct Sheet {
    pub grid: Grid,
    /// Reverse dependency map: cell -> formula cells that read it.
    pub dependents: HashMap<CellRef, HashSet<CellRef>>,
    /// Fractional digits for non-integer numbers in [`Sheet::display`].
    pub decimals: usize,
}

impl Sheet {
    pub fn new() -> Self {
        Self::with_decimals(DEFAULT_DECIMALS)
    }

    pub fn with_decimals(decimals: usize) -> Self {
        Sheet {
            grid: Grid::new(),
            dependents: HashMap::new(),
            decimals,
        }
    }

    /// Current value of a cell; [`Value::Empty`] for cells that hold nothing.
    pub fn value(&self, cell: &CellRef) -> Value {
        self.grid
            .get(cell)
            .and_then(|entry| entry.current_value())
            .unwrap_or(Value::Empty)
    }

    /// Display text of a cell.
    pub fn display(&self, cell: &CellRef) -> String {
        format_value_with(&self.value(cell), self.decimals)
    }

    /// What was typed into a cell.
    pub fn input(&self, cell: &CellRef) -> String {
        self.grid
            .get(cell)
            .map(|entry| entry.to_input_string())
            .unwrap_or_default()
    }

    /// Formula cells that read `cell` directly, sorted.
    pub fn dependents_of(&self, cell: &CellRef) -> Vec<CellRef> {
        let mut out: Vec<CellRef> = self
            .dependents
            .get(cell)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Rebuild the reverse dependency map from the grid.
    pub(crate) fn rebuild_dependents(&mut self) {
        self.dependents.clear();
        for entry in self.grid.iter() {
            for dep in &entry.depends_on {
                self.dependents.entry(*dep).or_default().insert(*entry.key());
            }
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaContext for Sheet {
    fn get_cell_value(&self, row: usize, col: usize) -> Option<Value> {
        self.grid
            .get(&CellRef::new(row, col))
            .and_then(|entry| entry.current_value())
    }
}
