//! Restricted arithmetic transform evaluator.
//!
//! Sensor configs may carry a transform expression such as `value / 1000`
//! to convert raw readings (e.g. millidegrees to degrees). Config files are
//! less trusted than code, so expressions never reach anything capable of
//! executing arbitrary logic: a recursive-descent parser produces an
//! expression tree over a closed grammar, and a pure evaluator walks it.
//!
//! Admissible: numeric literals, the single variable `value`, binary
//! `+ - * / // % **`, unary `+ -`, and parentheses. Nothing else parses.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    /// Malformed expression: unbalanced parentheses, dangling operators,
    /// trailing tokens.
    #[error("invalid transform syntax: {0}")]
    Syntax(String),

    /// An identifier other than `value`.
    #[error("unknown variable '{0}' (only 'value' is available)")]
    UnknownVariable(String),

    /// A construct outside the closed grammar: function calls, strings,
    /// comparisons, attribute access, subscripts.
    #[error("disallowed construct in transform: {0}")]
    Disallowed(String),
}

/// Applies an optional transform expression to a reading.
///
/// `None` or a blank expression is the identity. Division by zero follows
/// IEEE float semantics rather than erroring.
pub fn apply(value: f64, expr: Option<&str>) -> Result<f64, TransformError> {
    match expr {
        None => Ok(value),
        Some(e) if e.trim().is_empty() => Ok(value),
        Some(e) => Ok(parse(e)?.eval(value)),
    }
}

/// Parses an expression without evaluating it. Used by config checking to
/// reject typos before any collection runs.
pub fn parse(expr: &str) -> Result<Expr, TransformError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser { tokens, pos: 0 };
    let tree = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(TransformError::Syntax(format!(
            "unexpected trailing input in '{}'",
            expr
        )));
    }
    Ok(tree)
}

/// Parsed expression tree. Evaluation is pure arithmetic over one bound
/// variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Value,
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl Expr {
    pub fn eval(&self, value: f64) -> f64 {
        match self {
            Expr::Number(n) => *n,
            Expr::Value => value,
            Expr::Unary(op, operand) => {
                let v = operand.eval(value);
                match op {
                    UnaryOp::Plus => v,
                    UnaryOp::Minus => -v,
                }
            }
            Expr::Binary(op, left, right) => {
                let l = left.eval(value);
                let r = right.eval(value);
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    // Floored semantics, matching the transforms users
                    // already wrote against the previous collector.
                    BinaryOp::FloorDiv => (l / r).floor(),
                    BinaryOp::Mod => l - r * (l / r).floor(),
                    BinaryOp::Pow => l.powf(r),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, TransformError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut lit = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        lit.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Exponent suffix: 1e3, 2.5E-2
                if let Some(&e) = chars.peek() {
                    if e == 'e' || e == 'E' {
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        let mut suffix = String::from(e);
                        if let Some(&sign) = lookahead.peek() {
                            if sign == '+' || sign == '-' {
                                suffix.push(sign);
                                lookahead.next();
                            }
                        }
                        if lookahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                            while let Some(&d) = lookahead.peek() {
                                if d.is_ascii_digit() {
                                    suffix.push(d);
                                    lookahead.next();
                                } else {
                                    break;
                                }
                            }
                            lit.push_str(&suffix);
                            chars = lookahead;
                        }
                    }
                }
                if lit == "." {
                    // A lone dot is attribute access, not a literal.
                    return Err(TransformError::Disallowed("attribute access".into()));
                }
                let parsed = lit
                    .parse::<f64>()
                    .map_err(|_| TransformError::Syntax(format!("bad numeric literal '{}'", lit)))?;
                tokens.push(Token::Number(parsed));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::DoubleStar);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    tokens.push(Token::DoubleSlash);
                } else {
                    tokens.push(Token::Slash);
                }
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' | '\'' => return Err(TransformError::Disallowed("string literal".into())),
            '<' | '>' | '=' | '!' => {
                return Err(TransformError::Disallowed(format!(
                    "comparison operator '{}'",
                    c
                )))
            }
            '[' | ']' => return Err(TransformError::Disallowed("subscript access".into())),
            other => {
                return Err(TransformError::Disallowed(format!(
                    "character '{}'",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<Expr, TransformError> {
        let mut left = self.term()?;
        while let Some(tok) = self.peek() {
            let op = match tok {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // term := unary (('*' | '/' | '//' | '%') unary)*
    fn term(&mut self) -> Result<Expr, TransformError> {
        let mut left = self.unary()?;
        while let Some(tok) = self.peek() {
            let op = match tok {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::DoubleSlash => BinaryOp::FloorDiv,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    // unary := ('+' | '-') unary | power
    //
    // Unary minus binds looser than '**', so -2**2 is -(2**2).
    fn unary(&mut self) -> Result<Expr, TransformError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Plus, Box::new(self.unary()?)))
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Minus, Box::new(self.unary()?)))
            }
            _ => self.power(),
        }
    }

    // power := atom ['**' unary]
    //
    // The right operand re-enters unary so 2**-3 parses.
    fn power(&mut self) -> Result<Expr, TransformError> {
        let base = self.atom()?;
        if self.peek() == Some(&Token::DoubleStar) {
            self.advance();
            let exponent = self.unary()?;
            return Ok(Expr::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    // atom := NUMBER | 'value' | '(' expression ')'
    fn atom(&mut self) -> Result<Expr, TransformError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(ident)) => {
                if self.peek() == Some(&Token::LParen) {
                    return Err(TransformError::Disallowed(format!(
                        "function call '{}(...)'",
                        ident
                    )));
                }
                if ident == "value" {
                    Ok(Expr::Value)
                } else {
                    Err(TransformError::UnknownVariable(ident))
                }
            }
            Some(Token::LParen) => {
                let inner = self.expression()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(TransformError::Syntax("missing closing parenthesis".into())),
                }
            }
            Some(tok) => Err(TransformError::Syntax(format!(
                "unexpected token {:?}",
                tok
            ))),
            None => Err(TransformError::Syntax("unexpected end of expression".into())),
        }
    }
}
