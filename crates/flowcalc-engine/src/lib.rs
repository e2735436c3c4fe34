//! flowcalc_engine - formula primitives and grid formula evaluation.
//!
//! Everything here is synchronous and side-effect free: each call works only
//! on the formula text it is given and the [`engine::FormulaContext`]
//! snapshot supplied by the caller.

pub(crate) mod builtins;
pub mod engine;
pub mod error;

pub use error::{EvalError, Result};

#[cfg(test)]
mod tests {
    use crate::engine::*;
    use std::collections::HashMap;

    fn ctx(cells: &[(&str, f64)]) -> HashMap<CellRef, Value> {
        cells
            .iter()
            .map(|(name, n)| (CellRef::from_str(name).unwrap(), Value::Number(*n)))
            .collect()
    }

    #[test]
    fn test_from_str_single_letter_columns() {
        let a1 = CellRef::from_str("A1").unwrap();
        assert_eq!(a1.row, 0);
        assert_eq!(a1.col, 0);

        let b1 = CellRef::from_str("B1").unwrap();
        assert_eq!(b1.row, 0);
        assert_eq!(b1.col, 1);

        let z1 = CellRef::from_str("Z1").unwrap();
        assert_eq!(z1.col, 25);
    }

    #[test]
    fn test_from_str_multi_letter_columns() {
        assert_eq!(CellRef::from_str("AA1").unwrap().col, 26);
        assert_eq!(CellRef::from_str("AB1").unwrap().col, 27);
        assert_eq!(CellRef::from_str("AZ1").unwrap().col, 51);
        assert_eq!(CellRef::from_str("BA1").unwrap().col, 52);
    }

    #[test]
    fn test_from_str_case_insensitive() {
        let lower = CellRef::from_str("a1").unwrap();
        assert_eq!(lower, CellRef::new(0, 0));

        let mixed = CellRef::from_str("aA10").unwrap();
        assert_eq!(mixed, CellRef::new(9, 26));
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!(CellRef::from_str("").is_none());
        assert!(CellRef::from_str("123").is_none());
        assert!(CellRef::from_str("ABC").is_none());
        assert!(CellRef::from_str("A0").is_none());
        assert!(CellRef::from_str("1A").is_none());
        assert!(CellRef::from_str("A 1").is_none());
    }

    #[test]
    fn test_split_nested_if_arguments() {
        let call = parse_call("IF(A1>1,SUM(A1:A2),0)").unwrap();
        let args = call.arguments();
        assert_eq!(args.len(), 3);
        assert_eq!(args[1], "SUM(A1:A2)");
    }

    #[test]
    fn test_evaluate_cell_arithmetic() {
        let grid = ctx(&[("A1", 2.0), ("B1", 3.0)]);
        assert_eq!(evaluate_formula("=A1+B1", &grid, 0, 2), Value::Number(5.0));
        assert_eq!(evaluate_formula("=A1+B1*2", &grid, 0, 2), Value::Number(8.0));
        assert_eq!(evaluate_formula("=(A1+B1)*2", &grid, 0, 2), Value::Number(10.0));
    }

    #[test]
    fn test_evaluate_range_aggregates() {
        let grid = ctx(&[("A1", 1.0), ("A2", 2.0), ("A3", 3.0)]);
        assert_eq!(evaluate_formula("=SUM(A1:A3)", &grid, 0, 0), Value::Number(6.0));
        assert_eq!(evaluate_formula("=AVERAGE(A1:A3)", &grid, 0, 0), Value::Number(2.0));
    }

    #[test]
    fn test_evaluate_if_picks_branch() {
        let formula = r#"=IF(A1>1,"Big","Small")"#;
        assert_eq!(
            evaluate_formula(formula, &ctx(&[("A1", 2.0)]), 0, 1),
            Value::from("Big")
        );
        assert_eq!(
            evaluate_formula(formula, &ctx(&[("A1", 0.0)]), 0, 1),
            Value::from("Small")
        );
    }

    #[test]
    fn test_division_by_zero_yields_error_marker() {
        let value = evaluate_formula("=A1/0", &ctx(&[("A1", 1.0)]), 0, 1);
        assert!(value.is_error());
        assert!(value.to_string().starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_dependencies_feed_evaluation() {
        let formula = "=SUM(A1:A3)+B2";
        let mut deps = extract_dependencies(formula);
        deps.sort();
        assert_eq!(deps, vec!["A1", "A2", "A3", "B2"]);

        let grid = ctx(&[("A1", 1.0), ("A2", 1.0), ("A3", 1.0), ("B2", 1.0)]);
        assert_eq!(evaluate_formula(formula, &grid, 4, 4), Value::Number(4.0));
    }
}
