//! Circular dependency detection for formula edits.
//!
//! Run before a formula is stored: walk what the new formula reads and see
//! whether any path leads back to the cell being edited.

use std::collections::HashSet;

use super::cell::Grid;
use flowcalc_engine::engine::CellRef;

/// The loop `cell -> ... -> cell` that storing a formula with `depends_on`
/// at `cell` would close, if any.
pub(crate) fn find_cycle(cell: CellRef, depends_on: &[CellRef], grid: &Grid) -> Option<Vec<CellRef>> {
    let mut cleared = HashSet::new();
    let mut path = vec![cell];

    for dep in depends_on {
        if reaches(*dep, cell, grid, &mut cleared, &mut path) {
            return Some(path);
        }
    }
    None
}

fn reaches(
    current: CellRef,
    target: CellRef,
    grid: &Grid,
    cleared: &mut HashSet<CellRef>,
    path: &mut Vec<CellRef>,
) -> bool {
    path.push(current);
    if current == target {
        return true;
    }

    // Cells already explored without finding the target can be skipped.
    if cleared.insert(current) {
        let deps = grid
            .get(&current)
            .map(|entry| entry.depends_on.clone())
            .unwrap_or_default();
        for dep in deps {
            if reaches(dep, target, grid, cleared, path) {
                return true;
            }
        }
    }

    path.pop();
    false
}
