//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates, plus
//! `A1:B10` range parsing and enumeration.
//!
//! Column letters are bijective base-26: there is no zero digit, so `Z` is 26
//! and `AA` is 27.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::from_str("B3").unwrap();
//! assert_eq!(cell.row, 2);  // 0-indexed
//! assert_eq!(cell.col, 1);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Ranges larger than this are never enumerated.
pub const MAX_RANGE_CELLS: usize = 1_000_000;

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "B2", "AA10").
    /// Returns None if the input is invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let mut col_acc = 0usize;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;

        let row = numbers.parse::<usize>().ok()?.checked_sub(1)?;

        Some(CellRef::new(row, col))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn a1_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("cell reference regex must compile")
    })
}

impl std::str::FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

/// A rectangular span of cells such as `A1:B10`.
///
/// `start` and `end` keep the order they were written in; enumeration always
/// normalizes to the top-left/bottom-right rectangle.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellRef,
    pub end: CellRef,
}

impl CellRange {
    pub fn new(start: CellRef, end: CellRef) -> CellRange {
        CellRange { start, end }
    }

    /// Parse `"A1:B10"`. Exactly two references separated by one `:`.
    pub fn parse(text: &str) -> Option<CellRange> {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() != 2 {
            return None;
        }
        let start = CellRef::from_str(parts[0].trim())?;
        let end = CellRef::from_str(parts[1].trim())?;
        Some(CellRange { start, end })
    }

    /// Top-left and bottom-right corners.
    pub fn bounds(&self) -> (CellRef, CellRef) {
        (
            CellRef::new(
                self.start.row.min(self.end.row),
                self.start.col.min(self.end.col),
            ),
            CellRef::new(
                self.start.row.max(self.end.row),
                self.start.col.max(self.end.col),
            ),
        )
    }

    /// Number of cells covered, or None if it overflows `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        let (top_left, bottom_right) = self.bounds();
        let rows = bottom_right.row - top_left.row + 1;
        let cols = bottom_right.col - top_left.col + 1;
        rows.checked_mul(cols)
    }

    /// Every cell in the range, row-major.
    pub fn cells(&self) -> Vec<CellRef> {
        let (top_left, bottom_right) = self.bounds();
        let mut out = Vec::with_capacity(self.cell_count().unwrap_or(0));
        for row in top_left.row..=bottom_right.row {
            for col in top_left.col..=bottom_right.col {
                out.push(CellRef::new(row, col));
            }
        }
        out
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Parse `"AA10"` into zero-based coordinates. Case-insensitive, never panics.
pub fn parse_cell_reference(text: &str) -> Option<CellRef> {
    CellRef::from_str(text)
}

/// Inverse of [`parse_cell_reference`]: `(9, 26)` -> `"AA10"`.
pub fn cell_reference_to_string(row: usize, col: usize) -> String {
    CellRef::new(row, col).to_string()
}

/// Parse `"A1:B10"` into its two corners.
pub fn parse_cell_range(text: &str) -> Option<CellRange> {
    CellRange::parse(text)
}

/// Enumerate the normalized rectangle between two corners, row-major.
pub fn cells_in_range(r1: usize, c1: usize, r2: usize, c2: usize) -> Vec<CellRef> {
    CellRange::new(CellRef::new(r1, c1), CellRef::new(r2, c2)).cells()
}
