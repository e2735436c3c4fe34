//! Grid formula evaluation.
//!
//! A formula is text starting with `=`. The body is routed by its leading
//! function name when the whole body is one call:
//!
//! - `SUM|AVERAGE|AVG|COUNT|MAX|MIN(A1:B5)` - range aggregates
//! - `IF(condition, then, else)`
//! - `CONCATENATE|CONCAT(args...)`
//! - `NOW()`, `TODAY()`
//!
//! Anything else is arithmetic: embedded range aggregates and cell
//! references are replaced by their numeric values, characters outside
//! `[0-9+\-*/().\s]` are dropped and the remainder goes through the
//! recursive-descent evaluator in [`super::arith`].

use chrono::Local;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

use super::args::{Call, parse_call, unquote};
use super::arith::{MAX_NESTING_DEPTH, TOO_DEEP, evaluate_arithmetic};
use super::cell_ref::{CellRange, CellRef, MAX_RANGE_CELLS};
use super::condition::evaluate_condition;
use super::context::FormulaContext;
use super::value::{Value, plain_number};
use crate::builtins::{RangeBuiltin, is_scalar_builtin, range_builtin, range_fn_re};
use crate::error::{EvalError, Result};

/// Evaluate the formula of the cell at `(row, col)`.
///
/// Text that does not start with `=` is a literal and comes back unchanged.
/// Evaluation failures never propagate: they become [`Value::Error`], which
/// displays as `#ERROR: <message>`, so one bad cell cannot stop its siblings
/// from being computed.
pub fn evaluate_formula(formula: &str, ctx: &dyn FormulaContext, row: usize, col: usize) -> Value {
    let Some(body) = formula.strip_prefix('=') else {
        return Value::Text(formula.to_string());
    };

    match evaluate(body, ctx) {
        Ok(value) => value,
        Err(err) => {
            debug!(cell = %CellRef::new(row, col), error = %err, "formula evaluation failed");
            Value::Error(err.to_string())
        }
    }
}

/// Evaluate a formula body (without the leading `=`).
pub fn evaluate(body: &str, ctx: &dyn FormulaContext) -> Result<Value> {
    evaluate_nested(body, ctx, 0)
}

fn evaluate_nested(body: &str, ctx: &dyn FormulaContext, depth: usize) -> Result<Value> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(EvalError::Syntax {
            position: 0,
            message: TOO_DEEP.to_string(),
        });
    }
    let body = body.trim();
    if body.is_empty() {
        return Err(EvalError::EmptyExpression);
    }

    if let Some(call) = parse_call(body).filter(Call::is_balanced) {
        let name = call.name.to_ascii_uppercase();
        if let Some(builtin) = range_builtin(&name) {
            return eval_range_call(builtin, &call.arguments(), ctx).map(Value::Number);
        }
        match name.as_str() {
            "IF" => return eval_if(&call.arguments(), ctx, depth),
            "CONCATENATE" | "CONCAT" => return eval_concat(&call.arguments(), ctx, depth),
            "NOW" => {
                expect_no_arguments("NOW", &call)?;
                return Ok(Value::DateTime(Local::now().naive_local()));
            }
            "TODAY" => {
                expect_no_arguments("TODAY", &call)?;
                return Ok(Value::Date(Local::now().date_naive()));
            }
            _ => {}
        }
    }

    evaluate_numeric(body, ctx).map(Value::Number)
}

/// Evaluate an arithmetic grid expression to a number.
pub(crate) fn evaluate_numeric(expr: &str, ctx: &dyn FormulaContext) -> Result<f64> {
    let with_aggregates = substitute_range_calls(expr, ctx)?;
    reject_function_calls(&with_aggregates)?;
    let substituted = substitute_cell_refs(&with_aggregates, ctx)?;
    let sanitized: String = substituted
        .chars()
        .filter(|c| is_arithmetic_char(*c))
        .collect();
    evaluate_arithmetic(&sanitized)
}

fn is_arithmetic_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.')
}

fn expect_no_arguments(name: &str, call: &Call<'_>) -> Result<()> {
    if call.args.trim().is_empty() {
        Ok(())
    } else {
        Err(EvalError::WrongArgumentCount {
            name: name.to_string(),
            expected: "0",
            got: call.arguments().len(),
        })
    }
}

fn eval_range_call(builtin: &RangeBuiltin, args: &[String], ctx: &dyn FormulaContext) -> Result<f64> {
    let [arg] = args else {
        return Err(EvalError::WrongArgumentCount {
            name: builtin.sheet_name.to_string(),
            expected: "1",
            got: args.len(),
        });
    };
    let range = CellRange::parse(arg).ok_or_else(|| EvalError::InvalidRange(arg.clone()))?;
    if range.cell_count().is_none_or(|count| count > MAX_RANGE_CELLS) {
        return Err(EvalError::InvalidRange(format!("{} is too large", arg)));
    }

    let (top_left, bottom_right) = range.bounds();
    let values = ctx.get_cell_range(top_left.row, top_left.col, bottom_right.row, bottom_right.col);
    let result = builtin.aggregate.apply(&values);
    if !result.is_finite() {
        return Err(EvalError::NotANumber);
    }
    Ok(result)
}

fn eval_if(args: &[String], ctx: &dyn FormulaContext, depth: usize) -> Result<Value> {
    if !(2..=3).contains(&args.len()) {
        return Err(EvalError::WrongArgumentCount {
            name: "IF".to_string(),
            expected: "2 or 3",
            got: args.len(),
        });
    }

    let branch = if evaluate_condition(&args[0], ctx)? {
        Some(&args[1])
    } else {
        args.get(2)
    };
    match branch {
        Some(arg) => eval_operand(arg, ctx, depth),
        None => Ok(Value::Bool(false)),
    }
}

fn eval_concat(args: &[String], ctx: &dyn FormulaContext, depth: usize) -> Result<Value> {
    let mut out = String::new();
    for arg in args {
        out.push_str(&eval_operand(arg, ctx, depth)?.to_plain_string());
    }
    Ok(Value::Text(out))
}

/// An `IF` branch or `CONCAT` argument: a quoted literal, a single cell
/// (returned with its own type), or a nested grid expression.
fn eval_operand(arg: &str, ctx: &dyn FormulaContext, depth: usize) -> Result<Value> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Ok(Value::Empty);
    }
    if let Some(text) = unquote(arg) {
        return Ok(Value::Text(text.replace("\\\"", "\"").replace("\\'", "'")));
    }
    if let Some(cell) = CellRef::from_str(arg) {
        return Ok(ctx.get_cell_value(cell.row, cell.col).unwrap_or(Value::Empty));
    }
    evaluate_nested(arg, ctx, depth + 1)
}

fn substitute_range_calls(expr: &str, ctx: &dyn FormulaContext) -> Result<String> {
    let mut failure = None;
    let replaced = range_fn_re()
        .replace_all(expr, |caps: &Captures| {
            let Some(builtin) = range_builtin(&caps[1]) else {
                return caps[0].to_string();
            };
            let arg = format!("{}:{}", &caps[2], &caps[3]);
            match eval_range_call(builtin, &[arg], ctx) {
                Ok(n) => number_literal(n),
                Err(err) => {
                    failure.get_or_insert(err);
                    "0".to_string()
                }
            }
        })
        .into_owned();

    match failure {
        Some(err) => Err(err),
        None => Ok(replaced),
    }
}

fn substitute_cell_refs(expr: &str, ctx: &dyn FormulaContext) -> Result<String> {
    let mut failure = None;
    let replaced = cell_ref_re()
        .replace_all(expr, |caps: &Captures| match CellRef::from_str(&caps[1]) {
            Some(cell) => number_literal(
                ctx.get_cell_value(cell.row, cell.col)
                    .and_then(|v| v.as_number())
                    .unwrap_or(0.0),
            ),
            None => {
                failure.get_or_insert(EvalError::InvalidReference(caps[1].to_string()));
                "0".to_string()
            }
        })
        .into_owned();

    match failure {
        Some(err) => Err(err),
        None => Ok(replaced),
    }
}

fn reject_function_calls(expr: &str) -> Result<()> {
    let Some(caps) = function_call_re().captures(expr) else {
        return Ok(());
    };
    let name = caps[1].to_ascii_uppercase();
    if is_scalar_builtin(&name) || range_builtin(&name).is_some() {
        Err(EvalError::NestedFunction(name))
    } else {
        Err(EvalError::UnknownFunction(name))
    }
}

/// Render a number so it survives being spliced back into an expression.
fn number_literal(n: f64) -> String {
    if n < 0.0 {
        format!("({})", plain_number(n))
    } else {
        plain_number(n)
    }
}

fn cell_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+[0-9]+)\b").expect("cell reference regex must compile")
    })
}

fn function_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("function call regex must compile")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn grid(cells: &[(&str, Value)]) -> HashMap<CellRef, Value> {
        cells
            .iter()
            .map(|(name, value)| (CellRef::from_str(name).unwrap(), value.clone()))
            .collect()
    }

    #[test]
    fn test_literal_passes_through() {
        let ctx = grid(&[]);
        assert_eq!(evaluate_formula("hello", &ctx, 0, 0), Value::from("hello"));
        assert_eq!(evaluate_formula("42", &ctx, 0, 0), Value::from("42"));
    }

    #[test]
    fn test_negative_cell_values_substitute_safely() {
        let ctx = grid(&[("A1", Value::Number(2.0)), ("B1", Value::Number(-3.0))]);
        assert_eq!(evaluate_formula("=A1-B1", &ctx, 0, 2), Value::Number(5.0));
        assert_eq!(evaluate_formula("=A1*B1", &ctx, 0, 2), Value::Number(-6.0));
    }

    #[test]
    fn test_non_numeric_and_missing_cells_are_zero() {
        let ctx = grid(&[("A1", Value::from("n/a")), ("B1", Value::from("4"))]);
        assert_eq!(evaluate_formula("=A1+B1+C1", &ctx, 0, 3), Value::Number(4.0));
    }

    #[test]
    fn test_aggregate_inside_arithmetic() {
        let ctx = grid(&[
            ("A1", Value::Number(1.0)),
            ("A2", Value::Number(2.0)),
            ("A3", Value::Number(3.0)),
            ("B2", Value::Number(10.0)),
        ]);
        assert_eq!(evaluate_formula("=SUM(A1:A3)+B2", &ctx, 5, 5), Value::Number(16.0));
        assert_eq!(evaluate_formula("=max(A1:A3) * 2", &ctx, 5, 5), Value::Number(6.0));
    }

    #[test]
    fn test_count_min_max_whole_formula() {
        let ctx = grid(&[
            ("A1", Value::Number(4.0)),
            ("A2", Value::from("x")),
            ("A4", Value::Number(-1.0)),
        ]);
        assert_eq!(evaluate_formula("=COUNT(A1:A4)", &ctx, 9, 9), Value::Number(3.0));
        assert_eq!(evaluate_formula("=MIN(A1:A4)", &ctx, 9, 9), Value::Number(-1.0));
        assert_eq!(evaluate_formula("=MAX(A4:A1)", &ctx, 9, 9), Value::Number(4.0));
        assert_eq!(evaluate_formula("=AVG(A1:A4)", &ctx, 9, 9), Value::Number(1.5));
    }

    #[test]
    fn test_if_branches_keep_cell_types_and_nest() {
        let ctx = grid(&[("A1", Value::Number(2.0)), ("B1", Value::from("label"))]);
        assert_eq!(evaluate_formula("=IF(A1>1,B1,0)", &ctx, 3, 3), Value::from("label"));
        assert_eq!(
            evaluate_formula("=IF(A1<1,0,SUM(A1:A1)*10)", &ctx, 3, 3),
            Value::Number(20.0)
        );
        assert_eq!(evaluate_formula("=IF(A1>5,1)", &ctx, 3, 3), Value::Bool(false));
    }

    #[test]
    fn test_concat_mixes_literals_and_cells() {
        let ctx = grid(&[("A1", Value::Number(2.5)), ("B1", Value::from("kg"))]);
        assert_eq!(
            evaluate_formula(r#"=CONCATENATE("Weight: ", A1, " ", B1)"#, &ctx, 0, 2),
            Value::from("Weight: 2.5 kg")
        );
        assert_eq!(
            evaluate_formula(r#"=concat("a,b", C9, A1*2)"#, &ctx, 0, 2),
            Value::from("a,b5")
        );
    }

    #[test]
    fn test_now_and_today() {
        let ctx = grid(&[]);
        assert!(matches!(evaluate_formula("=NOW()", &ctx, 0, 0), Value::DateTime(_)));
        assert!(matches!(evaluate_formula("=TODAY()", &ctx, 0, 0), Value::Date(_)));
        assert!(evaluate_formula("=TODAY(1)", &ctx, 0, 0).is_error());
    }

    #[test]
    fn test_errors_become_markers() {
        let ctx = grid(&[("A1", Value::Number(1.0))]);
        for formula in [
            "=A1/0",
            "=SUM(A1)",
            "=SUM(A1:A2, B1:B2)",
            "=FOO(A1)",
            "=1 + IF(A1>0,1,2)",
            "=",
            "=A1 +",
        ] {
            let value = evaluate_formula(formula, &ctx, 0, 1);
            assert!(value.is_error(), "{} should be an error, got {:?}", formula, value);
            assert!(value.to_string().starts_with("#ERROR:"));
        }
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        let ctx = grid(&[("A1", Value::Number(1.0))]);
        let parens = format!("={}1{}", "(".repeat(10_000), ")".repeat(10_000));
        let value = evaluate_formula(&parens, &ctx, 0, 1);
        assert!(value.is_error());
        assert!(value.to_string().contains(TOO_DEEP), "{}", value);

        let ifs = format!("={}1{}", "IF(A1,".repeat(10_000), ",0)".repeat(10_000));
        let value = evaluate_formula(&ifs, &ctx, 0, 1);
        assert!(value.to_string().contains(TOO_DEEP), "{}", value);

        let nested = format!("={}1{}", "IF(A1,".repeat(20), ",0)".repeat(20));
        assert_eq!(evaluate_formula(&nested, &ctx, 0, 1), Value::Number(1.0));
    }

    #[test]
    fn test_overflowing_aggregate_is_not_a_number() {
        let ctx = grid(&[("A1", Value::Number(1e308)), ("A2", Value::Number(1e308))]);
        assert_eq!(evaluate("SUM(A1:A2)", &ctx), Err(EvalError::NotANumber));
        assert_eq!(evaluate("SUM(A1:A2)+1", &ctx), Err(EvalError::NotANumber));
        assert!(evaluate_formula("=SUM(A1:A2)+1", &ctx, 0, 1).is_error());
    }

    #[test]
    fn test_evaluate_returns_tagged_errors() {
        let ctx = grid(&[]);
        assert_eq!(evaluate("1/0", &ctx), Err(EvalError::DivisionByZero));
        assert_eq!(
            evaluate("FOO(1)", &ctx),
            Err(EvalError::UnknownFunction("FOO".to_string()))
        );
        assert_eq!(
            evaluate("SUM(A1)", &ctx),
            Err(EvalError::InvalidRange("A1".to_string()))
        );
    }
}
