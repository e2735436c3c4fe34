//! flowcalc-core - DataFlow-to-SQL compilation, query assembly and the
//! sheet document model built on `flowcalc-engine`.

pub mod dataflow;
pub mod error;
pub mod query;
pub mod sheet;

pub use dataflow::{
    FunctionDefinition, ParsedExpression, get_function, get_functions, has_aggregate_functions,
    parse,
};
pub use error::{DataFlowError, QueryError, Result, SheetError};
pub use query::{ExecutorError, NamedFormula, QueryBuilder, QueryExecutor, QueryOptions, Row};
pub use sheet::Sheet;

pub use flowcalc_engine::engine::{CellRef, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divide_family_is_always_guarded() {
        assert!(parse("DIVIDE(profit, revenue)").unwrap().sql.contains("NULLIF(revenue, 0)"));
        assert!(parse("PERCENT_OF(a, b)").unwrap().sql.contains("NULLIF(b, 0)"));
        assert!(parse("GROWTH(a, b)").unwrap().sql.contains("NULLIF(b, 0)"));
    }

    #[test]
    fn test_nested_if_compiles_inner_aggregate() {
        let parsed = parse("IF(a>1,TOTAL(x),0)").unwrap();
        assert_eq!(parsed.sql, "CASE WHEN a>1 THEN SUM(x) ELSE 0 END");
        assert!(parsed.is_aggregate);
    }

    #[test]
    fn test_every_function_is_documented_and_reachable() {
        for def in get_functions() {
            assert!(!def.syntax.is_empty() && !def.description.is_empty());
            assert!(def.syntax.starts_with(def.name));
            let found = get_function(&def.name.to_lowercase()).unwrap();
            assert_eq!(found.name, def.name);
            // Examples must compile.
            parse(def.example).unwrap();
        }
    }

    #[test]
    fn test_compiled_formula_feeds_query() {
        let sql = QueryBuilder::new()
            .build_query(&QueryOptions::new("orders", "ROUND(MEAN(total), 1)").group_by(["status"]))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT status, ROUND(AVG(total), 1) AS result FROM orders GROUP BY status"
        );
    }

    #[test]
    fn test_sheet_is_a_formula_context() {
        let mut sheet = Sheet::new();
        sheet.set_cell_by_name("A1", "1").unwrap();
        sheet.set_cell_by_name("A2", "2").unwrap();
        sheet.set_cell_by_name("A3", "3").unwrap();
        sheet.set_cell_by_name("B1", "=AVERAGE(A1:A3)").unwrap();
        sheet.set_cell_by_name("B2", "=IF(B1>1,\"Big\",\"Small\")").unwrap();
        assert_eq!(sheet.value(&CellRef::new(0, 1)), Value::Number(2.0));
        assert_eq!(sheet.display(&CellRef::new(1, 1)), "Big");
    }
}
