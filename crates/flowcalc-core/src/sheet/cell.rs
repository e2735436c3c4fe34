//! Cell storage for the sheet document.

use dashmap::DashMap;

use flowcalc_engine::engine::{CellRef, Value, extract_dependency_refs, plain_number};

/// What the user typed into a cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellType {
    Empty,
    Text(String),
    Number(f64),
    /// Formula text including the leading `=`.
    Formula(String),
}

/// A cell with its input, the cells it reads and its last computed value.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub contents: CellType,
    pub depends_on: Vec<CellRef>,
    pub dirty: bool,
    /// Result of the last evaluation; only formula cells carry one.
    pub value: Option<Value>,
}

impl Cell {
    pub fn new_empty() -> Cell {
        Cell::plain(CellType::Empty)
    }

    pub fn new_text(text: &str) -> Cell {
        Cell::plain(CellType::Text(text.to_string()))
    }

    pub fn new_number(n: f64) -> Cell {
        Cell::plain(CellType::Number(n))
    }

    /// A formula cell. `formula` must start with `=`; its references become
    /// `depends_on`.
    pub fn new_formula(formula: &str) -> Cell {
        Cell {
            depends_on: extract_dependency_refs(formula),
            contents: CellType::Formula(formula.to_string()),
            dirty: true,
            value: None,
        }
    }

    fn plain(contents: CellType) -> Cell {
        Cell {
            contents,
            depends_on: vec![],
            dirty: false,
            value: None,
        }
    }

    /// Classify raw input.
    /// - blank -> Empty
    /// - `=...` -> Formula
    /// - `"quoted"` -> Text without the quotes
    /// - a number -> Number
    /// - anything else -> Text
    pub fn from_input(input: &str) -> Cell {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Cell::new_empty();
        }
        if trimmed.starts_with('=') {
            return Cell::new_formula(trimmed);
        }
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            return Cell::new_text(&trimmed[1..trimmed.len() - 1]);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return Cell::new_number(n);
        }
        Cell::new_text(trimmed)
    }

    /// Text that reproduces this cell through [`Cell::from_input`].
    pub fn to_input_string(&self) -> String {
        match &self.contents {
            CellType::Empty => String::new(),
            CellType::Text(s) if s.parse::<f64>().is_ok() || s.starts_with('=') => {
                format!("\"{}\"", s)
            }
            CellType::Text(s) => s.clone(),
            CellType::Number(n) => plain_number(*n),
            CellType::Formula(f) => f.clone(),
        }
    }

    pub fn formula(&self) -> Option<&str> {
        match &self.contents {
            CellType::Formula(f) => Some(f),
            _ => None,
        }
    }

    /// The value other formulas see when they read this cell.
    pub fn current_value(&self) -> Option<Value> {
        match &self.contents {
            CellType::Empty => None,
            CellType::Text(s) => Some(Value::Text(s.clone())),
            CellType::Number(n) => Some(Value::Number(*n)),
            CellType::Formula(_) => self.value.clone(),
        }
    }
}

/// Sparse cell storage.
pub type Grid = DashMap<CellRef, Cell>;
