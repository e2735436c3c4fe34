//! Error types for flowcalc-core.

use thiserror::Error;

use crate::query::ExecutorError;

/// Errors raised while compiling a DataFlow formula.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataFlowError {
    #[error("Unknown function '{name}'. Available functions: {}", .known.join(", "))]
    UnknownFunction {
        name: String,
        known: Vec<&'static str>,
    },
}

/// Errors raised while assembling or running a query.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Formula(#[from] DataFlowError),

    #[error(
        "aggregate fields ({}) mixed with non-aggregate fields ({}) without GROUP BY",
        .aggregate.join(", "),
        .plain.join(", ")
    )]
    MixedAggregates {
        aggregate: Vec<String>,
        plain: Vec<String>,
    },

    #[error("query execution failed: {0}")]
    Execution(#[source] ExecutorError),
}

/// Errors raised by sheet edits. A rejected edit leaves the sheet unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    #[error("Circular dependency detected at {cell}: {}", .path.join(" -> "))]
    CircularDependency { cell: String, path: Vec<String> },

    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),
}

pub type Result<T> = std::result::Result<T, SheetError>;
