//! Condition evaluation for `IF`.
//!
//! Operators are located by substring search in a fixed order and the first
//! hit splits the condition in two. `>=` must be tried before `>` and `=`,
//! otherwise `A1>=1` would split on the wrong operator. Compound conditions
//! (`AND`/`OR`) are not supported.
//!
//! A side that holds no number, such as a quoted text literal, compares as
//! NaN: only `<>` holds against it.

use super::args::unquote;
use super::context::FormulaContext;
use super::eval::evaluate_numeric;
use crate::error::{EvalError, Result};

const OPERATORS: [&str; 7] = [">=", "<=", "<>", "!=", ">", "<", "="];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Comparison {
    Ge,
    Le,
    Ne,
    Gt,
    Lt,
    Eq,
}

impl Comparison {
    fn from_operator(op: &str) -> Comparison {
        match op {
            ">=" => Comparison::Ge,
            "<=" => Comparison::Le,
            "<>" | "!=" => Comparison::Ne,
            ">" => Comparison::Gt,
            "<" => Comparison::Lt,
            _ => Comparison::Eq,
        }
    }

    fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Ge => lhs >= rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Ne => !Comparison::Eq.holds(lhs, rhs),
            Comparison::Gt => lhs > rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Eq => (lhs - rhs).abs() < f64::EPSILON,
        }
    }
}

/// Evaluate an `IF` condition. Both sides of the comparison are evaluated
/// as numeric grid expressions. Without an operator the condition holds when
/// it evaluates to a non-zero number.
pub fn evaluate_condition(condition: &str, ctx: &dyn FormulaContext) -> Result<bool> {
    for op in OPERATORS {
        if let Some(idx) = condition.find(op) {
            let lhs = side_value(&condition[..idx], ctx)?;
            let rhs = side_value(&condition[idx + op.len()..], ctx)?;
            return Ok(Comparison::from_operator(op).holds(lhs, rhs));
        }
    }
    Ok(evaluate_numeric(condition, ctx)? != 0.0)
}

fn side_value(side: &str, ctx: &dyn FormulaContext) -> Result<f64> {
    let side = side.trim();
    if let Some(text) = unquote(side) {
        return Ok(text.trim().parse().unwrap_or(f64::NAN));
    }
    match evaluate_numeric(side, ctx) {
        Err(EvalError::EmptyExpression) => Ok(f64::NAN),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellRef, Value};
    use std::collections::HashMap;

    fn ctx(a1: f64) -> HashMap<CellRef, Value> {
        let mut grid = HashMap::new();
        grid.insert(CellRef::new(0, 0), Value::Number(a1));
        grid
    }

    #[test]
    fn test_each_operator() {
        let grid = ctx(2.0);
        assert!(evaluate_condition("A1>1", &grid).unwrap());
        assert!(evaluate_condition("A1>=2", &grid).unwrap());
        assert!(evaluate_condition("A1<=2", &grid).unwrap());
        assert!(evaluate_condition("A1<3", &grid).unwrap());
        assert!(evaluate_condition("A1=2", &grid).unwrap());
        assert!(evaluate_condition("A1<>3", &grid).unwrap());
        assert!(evaluate_condition("A1!=3", &grid).unwrap());
        assert!(!evaluate_condition("A1<>2", &grid).unwrap());
        assert!(!evaluate_condition("A1>2", &grid).unwrap());
    }

    #[test]
    fn test_sides_are_expressions() {
        let grid = ctx(2.0);
        assert!(evaluate_condition("A1 * 2 >= 3 + 1", &grid).unwrap());
        assert!(evaluate_condition("SUM(A1:A1) = 2", &grid).unwrap());
    }

    #[test]
    fn test_condition_without_operator_is_truthiness() {
        assert!(evaluate_condition("A1", &ctx(5.0)).unwrap());
        assert!(!evaluate_condition("A1", &ctx(0.0)).unwrap());
    }

    #[test]
    fn test_text_sides_compare_as_nan() {
        let grid = ctx(1.0);
        assert!(!evaluate_condition(r#"A1="x""#, &grid).unwrap());
        assert!(evaluate_condition(r#"A1<>"x""#, &grid).unwrap());
        assert!(!evaluate_condition(r#"A1>"x""#, &grid).unwrap());
        assert!(!evaluate_condition(r#""x"<=A1"#, &grid).unwrap());
        assert!(evaluate_condition(r#"A1="1""#, &grid).unwrap());
        assert!(!evaluate_condition("A1>", &grid).unwrap());
    }

    #[test]
    fn test_malformed_side_is_an_error() {
        assert!(evaluate_condition("A1 + > 1", &ctx(1.0)).is_err());
    }
}
