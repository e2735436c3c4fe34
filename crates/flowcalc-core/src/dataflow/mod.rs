//! DataFlow formulas: a small spreadsheet-flavoured function language that
//! compiles to SQL expressions.
//!
//! - [`get_functions`], [`get_function`] - The function table and its docs
//! - [`parse`] - Compile one formula into SQL plus an aggregate flag
//! - [`has_aggregate_functions`] - Shortcut for the aggregate flag

mod parser;
mod registry;

pub use parser::{ParsedExpression, has_aggregate_functions, parse};
pub use registry::{FUNCTIONS, FunctionDefinition};

/// Every registered DataFlow function.
pub fn get_functions() -> &'static [FunctionDefinition] {
    FUNCTIONS
}

/// Look up one function by name, ignoring case.
pub fn get_function(name: &str) -> Option<&'static FunctionDefinition> {
    registry::lookup(name)
}

pub(crate) use registry::known_names;
