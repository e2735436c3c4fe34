//! Compile a DataFlow formula into a SQL expression.
//!
//! A formula whose whole text is `NAME(args)` is treated as a function call;
//! anything else is raw SQL and passes through untouched. Arguments that are
//! themselves registered calls are compiled first, so `ROUND(MEAN(price), 1)`
//! becomes `ROUND(AVG(price), 1)`. Unregistered calls inside arguments are
//! left alone for the database to resolve, as are registered calls nested
//! deeper than [`MAX_NESTING_DEPTH`].

use flowcalc_engine::engine::{Call, MAX_NESTING_DEPTH, parse_call};
use serde::Serialize;
use tracing::debug;

use super::known_names;
use super::registry::{FunctionDefinition, lookup};
use crate::error::DataFlowError;

/// The SQL for one formula and whether it summarizes rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedExpression {
    pub sql: String,
    pub is_aggregate: bool,
}

impl ParsedExpression {
    fn raw(sql: &str) -> Self {
        ParsedExpression {
            sql: sql.to_string(),
            is_aggregate: false,
        }
    }
}

/// Compile `formula`.
///
/// Fails only when the top-level call names a function that is not
/// registered.
pub fn parse(formula: &str) -> Result<ParsedExpression, DataFlowError> {
    let formula = formula.trim();
    let Some(call) = parse_call(formula).filter(Call::is_balanced) else {
        return Ok(ParsedExpression::raw(formula));
    };

    let Some(def) = lookup(call.name) else {
        debug!(name = call.name, "unknown DataFlow function");
        return Err(DataFlowError::UnknownFunction {
            name: call.name.to_string(),
            known: known_names(),
        });
    };

    let parsed = compile_call(def, &call, 0);
    debug!(formula, sql = %parsed.sql, is_aggregate = parsed.is_aggregate, "compiled formula");
    Ok(parsed)
}

/// True when `formula` compiles and its result is an aggregate.
pub fn has_aggregate_functions(formula: &str) -> bool {
    parse(formula).map(|p| p.is_aggregate).unwrap_or(false)
}

fn compile_call(def: &FunctionDefinition, call: &Call<'_>, depth: usize) -> ParsedExpression {
    let mut is_aggregate = def.is_aggregate;
    let args: Vec<String> = call
        .arguments()
        .into_iter()
        .map(|arg| match compile_argument(&arg, depth + 1) {
            Some(inner) => {
                is_aggregate |= inner.is_aggregate;
                inner.sql
            }
            None => arg,
        })
        .collect();

    ParsedExpression {
        sql: (def.generate)(&args),
        is_aggregate,
    }
}

fn compile_argument(arg: &str, depth: usize) -> Option<ParsedExpression> {
    if depth >= MAX_NESTING_DEPTH {
        return None;
    }
    let call = parse_call(arg).filter(Call::is_balanced)?;
    let def = lookup(call.name)?;
    Some(compile_call(def, &call, depth))
}
