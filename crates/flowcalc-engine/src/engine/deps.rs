//! Dependency extraction from grid formula strings.
//!
//! Scans formula text for cell references (e.g., `A1`) and ranges (e.g.,
//! `B2:C5`) without evaluating anything. The result feeds the caller's
//! recalculation graph.
//!
//! Handles:
//! - Simple cell references: `A1`, `b2` (reported uppercased)
//! - Ranges anywhere in the formula: `SUM(A1:B5)` (every covered cell)
//! - Ignores references inside `"` or `'` literals and function names such as
//!   `LOG10(`

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::cell_ref::{CellRange, CellRef, MAX_RANGE_CELLS};

/// Extract the unique cells a formula reads, as uppercase reference strings.
///
/// A leading `=` is ignored. Malformed text never causes an error; it simply
/// contributes no references.
pub fn extract_dependencies(formula: &str) -> Vec<String> {
    let formula = formula.strip_prefix('=').unwrap_or(formula);
    let script = strip_string_literals(formula);

    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    let mut push = |name: String| {
        if seen.insert(name.clone()) {
            deps.push(name);
        }
    };

    for caps in reference_re().captures_iter(&script) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if script[whole.end()..].starts_with('(') {
            continue;
        }

        match caps.get(2) {
            Some(end) => {
                let Some(range) = CellRange::parse(&format!("{}:{}", &caps[1], end.as_str()))
                else {
                    continue;
                };
                match range.cell_count() {
                    Some(count) if count <= MAX_RANGE_CELLS => {
                        for cell in range.cells() {
                            push(cell.to_string());
                        }
                    }
                    _ => continue,
                }
            }
            None => {
                let text = &caps[1];
                if CellRef::from_str(text).is_some() {
                    push(text.to_ascii_uppercase());
                }
            }
        }
    }

    deps
}

/// Same as [`extract_dependencies`] but as parsed coordinates.
pub fn extract_dependency_refs(formula: &str) -> Vec<CellRef> {
    extract_dependencies(formula)
        .iter()
        .filter_map(|name| CellRef::from_str(name))
        .collect()
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b([A-Za-z]+[0-9]+)(?::([A-Za-z]+[0-9]+))?\b")
            .expect("dependency reference regex must compile")
    })
}

/// Blank out the contents of `"..."` and `'...'` literals, keeping the quotes.
fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in script.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.push(' ');
                } else if ch == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if ch == q {
                    quote = None;
                    out.push(ch);
                } else {
                    out.push(' ');
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }

    out
}
