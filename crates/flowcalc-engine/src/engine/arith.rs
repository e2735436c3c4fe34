//! Numeric expression evaluation.
//!
//! A small recursive-descent evaluator over numbers, `+ - * /` and
//! parentheses, with the usual precedence (`*` and `/` bind tighter than
//! `+` and `-`, both left-associative) and unary signs.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | NUMBER | '(' expr ')'
//! ```
//!
//! Parentheses and unary signs may nest at most [`MAX_NESTING_DEPTH`] levels.

use crate::error::{EvalError, Result};

/// Deepest nesting of parentheses, signs or function calls a formula may use.
pub const MAX_NESTING_DEPTH: usize = 256;

pub(crate) const TOO_DEEP: &str = "expression nested too deeply";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let token = match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let n = literal.parse::<f64>().map_err(|_| EvalError::Syntax {
                    position: start,
                    message: format!("invalid number '{}'", literal),
                })?;
                tokens.push((start, Token::Number(n)));
                continue;
            }
            other => {
                return Err(EvalError::Syntax {
                    position: i,
                    message: format!("unexpected character '{}'", other),
                });
            }
        };
        tokens.push((i, token));
        i += 1;
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(_, t)| *t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|(p, _)| *p).unwrap_or(self.end)
    }

    fn syntax(&self, message: &str) -> EvalError {
        EvalError::Syntax {
            position: self.position(),
            message: message.to_string(),
        }
    }

    fn parse_expr(&mut self) -> Result<f64> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.parse_factor()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.parse_factor()?;
                    if divisor == 0.0 {
                        return Err(EvalError::DivisionByZero);
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> Result<f64> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.syntax(TOO_DEEP));
        }
        self.depth += 1;
        let value = self.parse_primary();
        self.depth -= 1;
        value
    }

    fn parse_primary(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.parse_factor()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_factor()
            }
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(n)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.parse_expr()?;
                if self.peek() != Some(Token::RParen) {
                    return Err(self.syntax("expected ')'"));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(_) => Err(self.syntax("expected a number or '('")),
            None => Err(self.syntax("unexpected end of expression")),
        }
    }
}

/// Evaluate a purely numeric expression such as `2 + 3 * (4 - 1)`.
pub fn evaluate_arithmetic(src: &str) -> Result<f64> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(EvalError::EmptyExpression);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: src.chars().count(),
        depth: 0,
    };
    let value = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.syntax("unexpected trailing input"));
    }
    if !value.is_finite() {
        return Err(EvalError::NotANumber);
    }
    Ok(value)
}
