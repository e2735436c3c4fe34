//! The DataFlow function table.
//!
//! Every function is a static entry with documentation for editors and a
//! `generate` rule that turns already-split, trimmed arguments into one SQL
//! expression. Generators never validate arity: a missing argument renders
//! as `NULL` and surplus arguments are carried into the generated SQL, where
//! the database rejects them, instead of being dropped.

use flowcalc_engine::engine::unquote;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// A named DataFlow function.
pub struct FunctionDefinition {
    pub name: &'static str,
    pub syntax: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    /// True when the generated SQL summarizes many rows.
    pub is_aggregate: bool,
    pub generate: fn(&[String]) -> String,
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("syntax", &self.syntax)
            .field("is_aggregate", &self.is_aggregate)
            .finish_non_exhaustive()
    }
}

pub const FUNCTIONS: &[FunctionDefinition] = &[
    // Aggregates
    FunctionDefinition {
        name: "TOTAL",
        syntax: "TOTAL(column)",
        description: "Sum of all values",
        example: "TOTAL(amount)",
        is_aggregate: true,
        generate: gen_total,
    },
    FunctionDefinition {
        name: "MEAN",
        syntax: "MEAN(column)",
        description: "Average of all values",
        example: "MEAN(price)",
        is_aggregate: true,
        generate: gen_mean,
    },
    FunctionDefinition {
        name: "COUNT",
        syntax: "COUNT(column)",
        description: "Number of non-null values",
        example: "COUNT(order_id)",
        is_aggregate: true,
        generate: gen_count,
    },
    FunctionDefinition {
        name: "COUNT_UNIQUE",
        syntax: "COUNT_UNIQUE(column)",
        description: "Number of distinct non-null values",
        example: "COUNT_UNIQUE(customer_id)",
        is_aggregate: true,
        generate: gen_count_unique,
    },
    FunctionDefinition {
        name: "MAXIMUM",
        syntax: "MAXIMUM(column)",
        description: "Largest value",
        example: "MAXIMUM(amount)",
        is_aggregate: true,
        generate: gen_maximum,
    },
    FunctionDefinition {
        name: "MINIMUM",
        syntax: "MINIMUM(column)",
        description: "Smallest value",
        example: "MINIMUM(amount)",
        is_aggregate: true,
        generate: gen_minimum,
    },
    // Arithmetic
    FunctionDefinition {
        name: "ADD",
        syntax: "ADD(a, b, ...)",
        description: "Sum of the arguments",
        example: "ADD(subtotal, tax)",
        is_aggregate: false,
        generate: gen_add,
    },
    FunctionDefinition {
        name: "SUBTRACT",
        syntax: "SUBTRACT(a, b)",
        description: "a minus b",
        example: "SUBTRACT(revenue, cost)",
        is_aggregate: false,
        generate: gen_subtract,
    },
    FunctionDefinition {
        name: "MULTIPLY",
        syntax: "MULTIPLY(a, b, ...)",
        description: "Product of the arguments",
        example: "MULTIPLY(quantity, unit_price)",
        is_aggregate: false,
        generate: gen_multiply,
    },
    FunctionDefinition {
        name: "DIVIDE",
        syntax: "DIVIDE(a, b)",
        description: "a divided by b; NULL when b is 0",
        example: "DIVIDE(profit, revenue)",
        is_aggregate: false,
        generate: gen_divide,
    },
    // Percentages
    FunctionDefinition {
        name: "PERCENT_OF",
        syntax: "PERCENT_OF(part, whole)",
        description: "part as a percentage of whole; NULL when whole is 0",
        example: "PERCENT_OF(returns, orders)",
        is_aggregate: false,
        generate: gen_percent_of,
    },
    FunctionDefinition {
        name: "GROWTH",
        syntax: "GROWTH(current, previous)",
        description: "Percentage change from previous to current; NULL when previous is 0",
        example: "GROWTH(revenue_2024, revenue_2023)",
        is_aggregate: false,
        generate: gen_growth,
    },
    // Conditional and period aggregates
    FunctionDefinition {
        name: "IF_SUM",
        syntax: "IF_SUM(column, condition)",
        description: "Sum of values on rows matching the condition",
        example: "IF_SUM(amount, status = 'paid')",
        is_aggregate: true,
        generate: gen_if_sum,
    },
    FunctionDefinition {
        name: "IF_MEAN",
        syntax: "IF_MEAN(column, condition)",
        description: "Average of values on rows matching the condition",
        example: "IF_MEAN(amount, region = 'EU')",
        is_aggregate: true,
        generate: gen_if_mean,
    },
    FunctionDefinition {
        name: "PERIOD_TOTAL",
        syntax: "PERIOD_TOTAL(column, date_column, start, end)",
        description: "Sum of values with start <= date_column < end",
        example: "PERIOD_TOTAL(amount, created_at, '2024-01-01', '2024-04-01')",
        is_aggregate: true,
        generate: gen_period_total,
    },
    // Scalar helpers
    FunctionDefinition {
        name: "ROUND",
        syntax: "ROUND(value, decimals)",
        description: "Round to a number of decimals (default 2)",
        example: "ROUND(MEAN(price), 1)",
        is_aggregate: false,
        generate: gen_round,
    },
    FunctionDefinition {
        name: "ABS",
        syntax: "ABS(value)",
        description: "Absolute value",
        example: "ABS(balance)",
        is_aggregate: false,
        generate: gen_abs,
    },
    FunctionDefinition {
        name: "COALESCE",
        syntax: "COALESCE(a, b, ...)",
        description: "First non-null argument",
        example: "COALESCE(discount, 0)",
        is_aggregate: false,
        generate: gen_coalesce,
    },
    FunctionDefinition {
        name: "CONCAT",
        syntax: "CONCAT(a, b, ...)",
        description: "Join text; quoted arguments are literals, bare ones are columns",
        example: "CONCAT(first_name, ' ', last_name)",
        is_aggregate: false,
        generate: gen_concat,
    },
    FunctionDefinition {
        name: "UPPER",
        syntax: "UPPER(text)",
        description: "Upper-case text",
        example: "UPPER(country_code)",
        is_aggregate: false,
        generate: gen_upper,
    },
    FunctionDefinition {
        name: "LOWER",
        syntax: "LOWER(text)",
        description: "Lower-case text",
        example: "LOWER(email)",
        is_aggregate: false,
        generate: gen_lower,
    },
    FunctionDefinition {
        name: "IF",
        syntax: "IF(condition, then, else)",
        description: "Pick a value per row",
        example: "IF(amount > 1000, 'large', 'small')",
        is_aggregate: false,
        generate: gen_if,
    },
];

fn registry() -> &'static HashMap<&'static str, &'static FunctionDefinition> {
    static REGISTRY: OnceLock<HashMap<&'static str, &'static FunctionDefinition>> = OnceLock::new();
    REGISTRY.get_or_init(|| FUNCTIONS.iter().map(|def| (def.name, def)).collect())
}

/// Look up a function by name, ignoring case.
pub fn lookup(name: &str) -> Option<&'static FunctionDefinition> {
    registry().get(name.to_ascii_uppercase().as_str()).copied()
}

/// Registered names in table order.
pub fn known_names() -> Vec<&'static str> {
    FUNCTIONS.iter().map(|def| def.name).collect()
}

fn arg(args: &[String], index: usize) -> &str {
    match args.get(index).map(|a| a.trim()) {
        Some(a) if !a.is_empty() => a,
        _ => "NULL",
    }
}

fn args_or_null(args: &[String]) -> Vec<&str> {
    if args.is_empty() {
        return vec!["NULL"];
    }
    (0..args.len()).map(|i| arg(args, i)).collect()
}

/// A quoted argument becomes a single-quoted SQL string literal; anything
/// else (a column or expression) passes through unchanged.
fn sql_operand(raw: &str) -> String {
    match unquote(raw) {
        Some(text) => {
            let text = text.replace("\\\"", "\"").replace("\\'", "'");
            format!("'{}'", text.replace('\'', "''"))
        }
        None => raw.to_string(),
    }
}

/// Arguments from `from` onwards as `, a, b`, or nothing.
fn surplus(args: &[String], from: usize) -> String {
    (from..args.len())
        .map(|i| format!(", {}", arg(args, i)))
        .collect()
}

fn infix(args: &[String], op: &str) -> String {
    format!("({})", args_or_null(args).join(op))
}

fn gen_total(args: &[String]) -> String {
    format!("SUM({}{})", arg(args, 0), surplus(args, 1))
}

fn gen_mean(args: &[String]) -> String {
    format!("AVG({}{})", arg(args, 0), surplus(args, 1))
}

fn gen_count(args: &[String]) -> String {
    if args.len() <= 1 && args.first().is_none_or(|a| a.trim().is_empty()) {
        return "COUNT(*)".to_string();
    }
    format!("COUNT({}{})", arg(args, 0), surplus(args, 1))
}

fn gen_count_unique(args: &[String]) -> String {
    format!("COUNT(DISTINCT {}{})", arg(args, 0), surplus(args, 1))
}

fn gen_maximum(args: &[String]) -> String {
    format!("MAX({}{})", arg(args, 0), surplus(args, 1))
}

fn gen_minimum(args: &[String]) -> String {
    format!("MIN({}{})", arg(args, 0), surplus(args, 1))
}

fn gen_add(args: &[String]) -> String {
    infix(args, " + ")
}

fn gen_subtract(args: &[String]) -> String {
    if args.len() < 2 {
        return format!("({} - {})", arg(args, 0), arg(args, 1));
    }
    infix(args, " - ")
}

fn gen_multiply(args: &[String]) -> String {
    infix(args, " * ")
}

fn gen_divide(args: &[String]) -> String {
    let mut sql = format!("({} / NULLIF({}, 0)", arg(args, 0), arg(args, 1));
    for i in 2..args.len() {
        sql.push_str(&format!(" / NULLIF({}, 0)", arg(args, i)));
    }
    sql.push(')');
    sql
}

fn gen_percent_of(args: &[String]) -> String {
    format!(
        "({} * 100.0 / NULLIF({}, 0{}))",
        arg(args, 0),
        arg(args, 1),
        surplus(args, 2)
    )
}

fn gen_growth(args: &[String]) -> String {
    let current = arg(args, 0);
    let previous = arg(args, 1);
    format!(
        "(({} - {}) * 100.0 / NULLIF({}, 0{}))",
        current,
        previous,
        previous,
        surplus(args, 2)
    )
}

fn gen_if_sum(args: &[String]) -> String {
    format!(
        "SUM(CASE WHEN {} THEN {} ELSE 0 END{})",
        arg(args, 1),
        arg(args, 0),
        surplus(args, 2)
    )
}

fn gen_if_mean(args: &[String]) -> String {
    format!(
        "AVG(CASE WHEN {} THEN {} END{})",
        arg(args, 1),
        arg(args, 0),
        surplus(args, 2)
    )
}

fn gen_period_total(args: &[String]) -> String {
    let date_column = arg(args, 1);
    format!(
        "SUM(CASE WHEN {} >= {} AND {} < {} THEN {} ELSE 0 END{})",
        date_column,
        sql_operand(arg(args, 2)),
        date_column,
        sql_operand(arg(args, 3)),
        arg(args, 0),
        surplus(args, 4)
    )
}

fn gen_round(args: &[String]) -> String {
    let decimals = match args.get(1).map(|a| a.trim()) {
        Some(d) if !d.is_empty() => d,
        _ => "2",
    };
    format!("ROUND({}, {}{})", arg(args, 0), decimals, surplus(args, 2))
}

fn gen_abs(args: &[String]) -> String {
    format!("ABS({}{})", arg(args, 0), surplus(args, 1))
}

fn gen_coalesce(args: &[String]) -> String {
    format!("COALESCE({})", args_or_null(args).join(", "))
}

fn gen_concat(args: &[String]) -> String {
    if args.is_empty() {
        return "''".to_string();
    }
    let parts: Vec<String> = args_or_null(args).into_iter().map(sql_operand).collect();
    format!("({})", parts.join(" || "))
}

fn gen_upper(args: &[String]) -> String {
    format!("UPPER({}{})", sql_operand(arg(args, 0)), surplus(args, 1))
}

fn gen_lower(args: &[String]) -> String {
    format!("LOWER({}{})", sql_operand(arg(args, 0)), surplus(args, 1))
}

fn gen_if(args: &[String]) -> String {
    format!(
        "CASE WHEN {} THEN {} ELSE {}{} END",
        arg(args, 0),
        sql_operand(arg(args, 1)),
        sql_operand(arg(args, 2)),
        surplus(args, 3)
    )
}
