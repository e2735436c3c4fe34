//! Values produced by grid formula evaluation.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

use super::format::format_value;

/// A computed cell value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    /// Cell-local evaluation failure; displayed with the `#ERROR:` marker.
    Error(String),
}

impl Value {
    /// Numeric view of the value. Numbers are returned as-is and text is
    /// parsed after trimming; everything else, and any non-finite
    /// result, is non-numeric.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        n.filter(|n| n.is_finite())
    }

    /// Empty cells and empty strings.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Text used when a value is spliced into a string (CONCAT).
    /// Numbers are printed without padding zeros.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => plain_number(*n),
            Value::Text(s) => s.clone(),
            other => format_value(other),
        }
    }
}

/// Shortest faithful rendering of a number (`2`, `2.5`, `-0.125`).
pub fn plain_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_value(self))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
