//! Error types for grid formula evaluation.

use thiserror::Error;

/// Errors raised while evaluating a grid formula.
///
/// These never escape [`evaluate_formula`](crate::engine::evaluate_formula);
/// they are rendered into a cell-local error marker instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("empty expression")]
    EmptyExpression,

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{0} cannot be used inside an arithmetic expression")]
    NestedFunction(String),

    #[error("{name} expects {expected} argument(s), got {got}")]
    WrongArgumentCount {
        name: String,
        expected: &'static str,
        got: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("result is not a finite number")]
    NotANumber,
}

pub type Result<T> = std::result::Result<T, EvalError>;
