//! Grid formula engine API.
//!
//! - [`split_arguments`], [`parse_call`] - Top-level argument splitting shared
//!   with the DataFlow compiler
//! - [`CellRef`], [`CellRange`] - A1 notation <-> zero-based row/col
//! - [`extract_dependencies`] - Cells a formula reads, for recalculation order
//! - [`FormulaContext`] - Read-only cell access supplied by the grid layer
//! - [`evaluate_formula`] - Compute a cell's value from its formula
//! - [`format_value`] - Format values for display

mod args;
mod arith;
mod cell_ref;
mod condition;
mod context;
mod deps;
mod eval;
mod format;
mod value;

pub use args::{Call, parse_call, split_arguments, unquote};
pub use arith::{MAX_NESTING_DEPTH, evaluate_arithmetic};
pub use cell_ref::{
    CellRange, CellRef, MAX_RANGE_CELLS, cell_reference_to_string, cells_in_range,
    parse_cell_range, parse_cell_reference,
};
pub use condition::evaluate_condition;
pub use context::FormulaContext;
pub use deps::{extract_dependencies, extract_dependency_refs};
pub use eval::{evaluate, evaluate_formula};
pub use format::{
    DEFAULT_DECIMALS, ERROR_PREFIX, format_number, format_number_with, format_value,
    format_value_with,
};
pub use value::{Value, plain_number};
