use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use super::Sheet;
use super::cell::{Cell, CellType};
use super::cycle::find_cycle;
use crate::error::{Result, SheetError};
use flowcalc_engine::engine::{CellRef, evaluate_formula};

impl Sheet {
    /// Store `input` at `cell` and recompute everything that depends on it.
    ///
    /// A formula that would close a dependency loop is rejected and the
    /// sheet is left exactly as it was.
    pub fn set_cell(&mut self, cell: CellRef, input: &str) -> Result<()> {
        let new_cell = Cell::from_input(input);
        if new_cell.contents == CellType::Empty {
            self.clear_cell(&cell);
            return Ok(());
        }

        if new_cell.formula().is_some()
            && let Some(path) = find_cycle(cell, &new_cell.depends_on, &self.grid)
        {
            return Err(SheetError::CircularDependency {
                cell: cell.to_string(),
                path: path.iter().map(CellRef::to_string).collect(),
            });
        }

        self.grid.insert(cell, new_cell);
        self.rebuild_dependents();
        self.mark_dependents_dirty(&cell);
        self.recalculate();
        Ok(())
    }

    /// [`Sheet::set_cell`] addressed by name, e.g. `"B2"`.
    pub fn set_cell_by_name(&mut self, name: &str, input: &str) -> Result<()> {
        let cell = CellRef::from_str(name.trim())
            .ok_or_else(|| SheetError::InvalidReference(name.to_string()))?;
        self.set_cell(cell, input)
    }

    /// Remove a cell; formulas that read it see an empty cell from now on.
    pub fn clear_cell(&mut self, cell: &CellRef) {
        if self.grid.remove(cell).is_some() {
            self.rebuild_dependents();
            self.mark_dependents_dirty(cell);
            self.recalculate();
        }
    }

    /// Evaluate every dirty formula cell, dependencies first. Returns the
    /// number of cells evaluated.
    pub fn recalculate(&mut self) -> usize {
        let order = self.evaluation_order();
        for cell in &order {
            let Some(formula) = self
                .grid
                .get(cell)
                .and_then(|entry| entry.formula().map(str::to_string))
            else {
                continue;
            };

            let value = evaluate_formula(&formula, &*self, cell.row, cell.col);
            debug!(cell = %cell, value = %value, "recalculated");
            if let Some(mut entry) = self.grid.get_mut(cell) {
                entry.value = Some(value);
                entry.dirty = false;
            }
        }
        order.len()
    }

    /// Dirty formula cells in an order where every cell comes after the
    /// dirty cells it reads. Ties are broken by position.
    pub fn evaluation_order(&self) -> Vec<CellRef> {
        let dirty: BTreeSet<CellRef> = self
            .grid
            .iter()
            .filter(|entry| entry.dirty && entry.formula().is_some())
            .map(|entry| *entry.key())
            .collect();

        let mut waiting_on: HashMap<CellRef, usize> = HashMap::new();
        for cell in &dirty {
            let count = self
                .grid
                .get(cell)
                .map(|entry| entry.depends_on.iter().filter(|d| dirty.contains(*d)).count())
                .unwrap_or(0);
            waiting_on.insert(*cell, count);
        }

        let mut ready: BTreeSet<CellRef> = waiting_on
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(cell, _)| *cell)
            .collect();
        let mut order = Vec::with_capacity(dirty.len());

        while let Some(cell) = ready.pop_first() {
            waiting_on.remove(&cell);
            order.push(cell);
            for dependent in self.dependents_of(&cell) {
                if let Some(count) = waiting_on.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        // Only reachable if a loop slipped past set_cell; evaluate the rest
        // anyway so nothing stays dirty forever.
        let mut rest: Vec<CellRef> = waiting_on.into_keys().collect();
        rest.sort();
        order.extend(rest);
        order
    }

    /// Mark every formula that reads `changed`, directly or transitively.
    fn mark_dependents_dirty(&mut self, changed: &CellRef) {
        let mut to_process = vec![*changed];
        let mut visited = HashSet::new();
        while let Some(cell) = to_process.pop() {
            if !visited.insert(cell) {
                continue;
            }
            for dependent in self.dependents_of(&cell) {
                if let Some(mut entry) = self.grid.get_mut(&dependent) {
                    entry.dirty = true;
                    entry.value = None;
                }
                to_process.push(dependent);
            }
        }
    }
}
