use super::value::Value;

/// Prefix of the cell-local error marker.
pub const ERROR_PREFIX: &str = "#ERROR:";

/// Fractional digits used when no display configuration is supplied.
pub const DEFAULT_DECIMALS: usize = 2;

/// Format a value for display.
pub fn format_value(value: &Value) -> String {
    format_value_with(value, DEFAULT_DECIMALS)
}

/// Format a value for display with a fixed number of fractional digits.
pub fn format_value_with(value: &Value, decimals: usize) -> String {
    match value {
        Value::Empty => String::new(),
        Value::Number(n) => format_number_with(*n, decimals),
        Value::Text(s) => s.clone(),
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::Error(message) => format!("{} {}", ERROR_PREFIX, message),
    }
}

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    format_number_with(n, DEFAULT_DECIMALS)
}

pub fn format_number_with(n: f64, decimals: usize) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        "#INF!".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e10 {
        format!("{:.0}", n)
    } else {
        format!("{:.*}", decimals, n)
    }
}
