//! Function-call recognition and top-level argument splitting.
//!
//! Both formula languages share the same call shape, `NAME(arg, arg, ...)`,
//! where arguments may themselves contain nested calls and quoted literals.
//! Only commas at parenthesis depth zero and outside quotes separate
//! arguments:
//!
//! ```ignore
//! let args = split_arguments("A1>1,SUM(A1:A2),0");
//! assert_eq!(args, vec!["A1>1", "SUM(A1:A2)", "0"]);
//! ```

use regex::Regex;
use std::sync::OnceLock;

/// A `NAME(args)` call recognised at the top level of a formula.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Call<'a> {
    /// Function name exactly as written.
    pub name: &'a str,
    /// Raw text between the outer parentheses.
    pub args: &'a str,
}

impl<'a> Call<'a> {
    /// Returns true when the opening parenthesis after the name is closed by
    /// the final character, i.e. `SUM(A1:A3)` but not `SUM(A1:A3)+SUM(B1:B3)`.
    pub fn is_balanced(&self) -> bool {
        let mut depth: i32 = 0;
        for (ch, escaped) in unquoted_chars(self.args) {
            if escaped {
                continue;
            }
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }

    /// Split the argument text into top-level arguments.
    pub fn arguments(&self) -> Vec<String> {
        split_arguments(self.args)
    }
}

fn call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^(\w+)\((.*)\)$").expect("function call regex must compile")
    })
}

/// Match `text` against the `NAME(...)` shape.
///
/// The caller is expected to have trimmed the text. No balance check is done
/// here; see [`Call::is_balanced`].
pub fn parse_call(text: &str) -> Option<Call<'_>> {
    let caps = call_re().captures(text)?;
    Some(Call {
        name: caps.get(1)?.as_str(),
        args: caps.get(2)?.as_str(),
    })
}

/// Split an argument list on top-level commas.
///
/// Tracks parenthesis depth and the active quote character (`"` or `'`). A
/// quote toggles the quote state only when it is not preceded by `\`. Quote
/// characters are kept in the output so callers can tell literals from
/// references. Every argument is trimmed; a trailing argument is only kept
/// when it is non-empty.
pub fn split_arguments(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;

    for ch in args.chars() {
        let escaped = prev == Some('\\');
        match quote {
            Some(q) => {
                if ch == q && !escaped {
                    quote = None;
                }
                current.push(ch);
            }
            None => match ch {
                '"' | '\'' if !escaped => {
                    quote = Some(ch);
                    current.push(ch);
                }
                '(' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' => {
                    depth -= 1;
                    current.push(ch);
                }
                ',' if depth == 0 => {
                    out.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(ch),
            },
        }
        prev = Some(ch);
    }

    let tail = current.trim();
    if !tail.is_empty() {
        out.push(tail.to_string());
    }
    out
}

/// Strip matching outer quotes from a literal argument (`"x"` or `'x'`).
/// Returns None for anything that is not a quoted literal.
pub fn unquote(arg: &str) -> Option<&str> {
    let arg = arg.trim();
    let first = arg.chars().next()?;
    if arg.len() < 2 || !(first == '"' || first == '\'') || !arg.ends_with(first) {
        return None;
    }
    Some(&arg[1..arg.len() - 1])
}

/// Iterate over characters outside quoted literals, flagging escaped ones.
fn unquoted_chars(text: &str) -> impl Iterator<Item = (char, bool)> + '_ {
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    text.chars().filter_map(move |ch| {
        let escaped = prev == Some('\\');
        prev = Some(ch);
        match quote {
            Some(q) => {
                if ch == q && !escaped {
                    quote = None;
                }
                None
            }
            None if (ch == '"' || ch == '\'') && !escaped => {
                quote = Some(ch);
                None
            }
            None => Some((ch, escaped)),
        }
    })
}
