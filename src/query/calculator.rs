//! Closed-form arithmetic for conversational calculation queries.
//!
//! Spoken operators ("plus", "divided by", "15% of 200") are rewritten to
//! symbols, then a small recursive-descent parser evaluates the result.
//! Precedence: parentheses, unary sign, `^` (right associative),
//! `* / %`, then `+ -`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Evaluation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("malformed expression: {0}")]
    Syntax(String),

    #[error("result is not a finite number")]
    NotFinite,
}

/// A calculation request found in a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    /// Symbolic form, e.g. `12 * (3 + 4)`
    pub expression: String,
    pub value: Result<f64, CalcError>,
}

impl Calculation {
    /// Conversational reply for this calculation.
    pub fn answer(&self) -> String {
        match &self.value {
            Ok(v) => format!("{} = {}", self.expression, format_number(*v)),
            Err(CalcError::DivisionByZero) => format!(
                "{} can't be calculated because it divides by zero. Want to try different numbers?",
                self.expression
            ),
            Err(e) => format!("I couldn't work out {}: {}.", self.expression, e),
        }
    }
}

/// Recognize and evaluate a calculation query.
///
/// Returns `None` unless the remainder after stripping the question frame
/// is purely arithmetic with at least one operator.
pub fn detect(query: &str) -> Option<Calculation> {
    let expression = to_symbolic(query)?;
    let value = evaluate(&expression);
    Some(Calculation { expression, value })
}

/// Rewrite a spoken calculation into symbolic form.
fn to_symbolic(query: &str) -> Option<String> {
    let framed = QUESTION_FRAME_PATTERN.replace(query.trim(), "");
    let mut text = framed
        .trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '!' | '=' | '.') || c.is_whitespace())
        .to_lowercase();

    if ISO_DATE_PATTERN.is_match(&text) {
        return None;
    }

    text = PERCENT_OF_PATTERN.replace_all(&text, "($1 / 100) * ").into_owned();
    for (pattern, symbol) in SPOKEN_OPERATORS.iter() {
        text = pattern.replace_all(&text, *symbol).into_owned();
    }
    loop {
        let next = TIMES_SIGN_PATTERN.replace_all(&text, "$1 * $2").into_owned();
        if next == text {
            break;
        }
        text = next;
    }
    text = text.replace('÷', "/").replace(',', "");

    let symbolic = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let is_arithmetic = !symbolic.is_empty()
        && symbolic
            .chars()
            .all(|c| c.is_ascii_digit() || " .+-*/^%()".contains(c));
    let has_digit = symbolic.chars().any(|c| c.is_ascii_digit());
    let has_operator = OPERATOR_PATTERN.is_match(&symbolic);

    (is_arithmetic && has_digit && has_operator).then_some(symbolic)
}

/// Evaluate a symbolic arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(CalcError::Syntax(format!(
            "unexpected token at position {}",
            parser.pos
        )));
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

/// Integers print without a fraction; others with up to ten decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{:.10}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(expression: &str) -> Result<Vec<Token>, CalcError> {
    let mut tokens = Vec::new();
    let mut chars = expression.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        match c {
            ' ' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut end = i;
                while let Some(&(j, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = j + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &expression[i..end];
                let n = literal
                    .parse()
                    .map_err(|_| CalcError::Syntax(format!("bad number '{literal}'")))?;
                tokens.push(Token::Num(n));
            }
            '+' | '-' | '*' | '/' | '^' | '%' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '(' => {
                tokens.push(Token::Open);
                chars.next();
            }
            ')' => {
                tokens.push(Token::Close);
                chars.next();
            }
            other => return Err(CalcError::Syntax(format!("unexpected '{other}'"))),
        }
    }

    Ok(tokens)
}

/// Deepest nesting of parentheses, signs and exponents accepted.
const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next_op_in(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(c)) if ops.contains(&c) => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op) = self.next_op_in(&['+', '-']) {
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(op) = self.next_op_in(&['*', '/', '%']) {
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    // Every recursive path passes through here.
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::Syntax("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let value = match self.next_op_in(&['+', '-']) {
            Some('-') => self.unary().map(|v| -v),
            Some(_) => self.unary(),
            None => self.power(),
        };
        self.depth -= 1;
        value
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.next_op_in(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Num(n)) => {
                self.pos += 1;
                Ok(n)
            }
            Some(Token::Open) => {
                self.pos += 1;
                let value = self.expr()?;
                match self.peek() {
                    Some(Token::Close) => {
                        self.pos += 1;
                        Ok(value)
                    }
                    _ => Err(CalcError::Syntax("missing ')'".to_string())),
                }
            }
            Some(token) => Err(CalcError::Syntax(format!("unexpected {token:?}"))),
            None => Err(CalcError::Syntax("unexpected end of expression".to_string())),
        }
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

static QUESTION_FRAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:hey|ok|okay|so)[,\s]+)?(?:please\s+)?(?:what\s+is|what's|whats|what\s+are|how\s+much\s+is|calculate|compute|evaluate|solve|work\s+out|can\s+you\s+calculate|could\s+you\s+calculate|tell\s+me)?\s*",
    )
    .expect("Invalid regex")
});

static PERCENT_OF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:%|percent)\s+of\s+").expect("Invalid regex")
});

static SPOKEN_OPERATORS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bmultiplied\s+by\b", " * "),
        (r"\bdivided\s+by\b", " / "),
        (r"\bto\s+the\s+power\s+of\b", " ^ "),
        (r"\braised\s+to(?:\s+the\s+power\s+of)?\b", " ^ "),
        (r"\bsquared\b", " ^ 2 "),
        (r"\bcubed\b", " ^ 3 "),
        (r"\bplus\b", " + "),
        (r"\bminus\b", " - "),
        (r"\btimes\b", " * "),
        (r"\bover\b", " / "),
        (r"\bmod(?:ulo)?\b", " % "),
        (r"\band\b", " + "),
    ]
    .into_iter()
    .map(|(p, s)| (Regex::new(p).expect("Invalid regex"), s))
    .collect()
});

static TIMES_SIGN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d)])\s*[x×]\s*([\d(.])").expect("Invalid regex"));

static OPERATOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\s*[+\-*/^%]|[+\-*/^%]\s*[\d(]").expect("Invalid regex"));

static ISO_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("Invalid regex"));
