//! Built-in grid functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVERAGE`);
//!   formulas may use any case.
//! - Range aggregates take exactly one `A1:B5` argument. If you add one,
//!   extend `RANGE_BUILTINS`; `range_fn_re` picks it up automatically.

use regex::Regex;
use std::sync::OnceLock;

use crate::engine::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RangeAggregate {
    Sum,
    Average,
    Count,
    Max,
    Min,
}

pub struct RangeBuiltin {
    pub sheet_name: &'static str,
    pub aggregate: RangeAggregate,
}

pub const RANGE_BUILTINS: &[RangeBuiltin] = &[
    RangeBuiltin {
        sheet_name: "SUM",
        aggregate: RangeAggregate::Sum,
    },
    RangeBuiltin {
        sheet_name: "AVERAGE",
        aggregate: RangeAggregate::Average,
    },
    RangeBuiltin {
        sheet_name: "AVG",
        aggregate: RangeAggregate::Average,
    },
    RangeBuiltin {
        sheet_name: "COUNT",
        aggregate: RangeAggregate::Count,
    },
    RangeBuiltin {
        sheet_name: "MAX",
        aggregate: RangeAggregate::Max,
    },
    RangeBuiltin {
        sheet_name: "MIN",
        aggregate: RangeAggregate::Min,
    },
];

/// Scalar built-ins that are only valid as the whole formula.
pub const SCALAR_BUILTINS: &[&str] = &["IF", "CONCATENATE", "CONCAT", "NOW", "TODAY"];

/// Regex that matches built-in range calls like `SUM(A1:B5)`, any case.
///
/// Captures:
/// - group 1: function name (e.g. `SUM`)
/// - group 2: start cell ref (e.g. `A1`)
/// - group 3: end cell ref (e.g. `B5`)
pub fn range_fn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = RANGE_BUILTINS
            .iter()
            .map(|b| b.sheet_name)
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(
            r"(?i)\b({})\(\s*([A-Za-z]+[0-9]+)\s*:\s*([A-Za-z]+[0-9]+)\s*\)",
            names
        ))
        .expect("built-in range regex must compile")
    })
}

/// Look up a range built-in by name, ignoring case.
pub fn range_builtin(name: &str) -> Option<&'static RangeBuiltin> {
    RANGE_BUILTINS
        .iter()
        .find(|b| b.sheet_name.eq_ignore_ascii_case(name))
}

pub fn is_scalar_builtin(name: &str) -> bool {
    SCALAR_BUILTINS.iter().any(|b| b.eq_ignore_ascii_case(name))
}

impl RangeAggregate {
    /// Reduce the values of a range. Empty inputs yield 0.
    pub fn apply(&self, values: &[Option<Value>]) -> f64 {
        let numeric = || values.iter().flatten().filter_map(Value::as_number);
        match self {
            RangeAggregate::Sum => values
                .iter()
                .map(|v| v.as_ref().and_then(Value::as_number).unwrap_or(0.0))
                .sum(),
            RangeAggregate::Average => {
                let (total, count) = numeric().fold((0.0, 0usize), |(t, c), n| (t + n, c + 1));
                if count == 0 { 0.0 } else { total / count as f64 }
            }
            RangeAggregate::Count => values
                .iter()
                .flatten()
                .filter(|v| !v.is_blank())
                .count() as f64,
            RangeAggregate::Max => numeric().reduce(f64::max).unwrap_or(0.0),
            RangeAggregate::Min => numeric().reduce(f64::min).unwrap_or(0.0),
        }
    }
}
