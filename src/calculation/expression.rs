//! Arithmetic expressions for custom formulas.
//!
//! Formula text is operator-entered configuration, so it is parsed by a small
//! recursive-descent parser into an [`Expr`] tree and evaluated against a
//! variable map. Nothing else is executed.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | IDENT | '(' expr ')'
//! ```

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Longest expression text accepted.
pub const MAX_EXPRESSION_LENGTH: usize = 1024;

/// Deepest nesting of unary operators and parentheses accepted.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// The expression was empty or whitespace.
    #[error("expression is empty")]
    Empty,

    /// The expression exceeded [`MAX_EXPRESSION_LENGTH`].
    #[error("expression is longer than {max} characters")]
    TooLong {
        /// The limit.
        max: usize,
    },

    /// The expression nested deeper than [`MAX_NESTING_DEPTH`].
    #[error("expression nests deeper than {max} levels")]
    TooDeep {
        /// The limit.
        max: usize,
    },

    /// A character outside the language was found.
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedCharacter {
        /// The offending character.
        found: char,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A numeric literal could not be read.
    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber {
        /// The literal text.
        literal: String,
        /// Byte offset in the expression.
        position: usize,
    },

    /// A token appeared where it is not allowed.
    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken {
        /// The token text.
        found: String,
        /// Byte offset in the expression.
        position: usize,
    },

    /// The expression ended where an operand or ')' was required.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A variable was not present in the evaluation context.
    #[error("unknown variable '{name}'")]
    UnknownVariable {
        /// The variable name.
        name: String,
    },

    /// A division had a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// An intermediate value was not representable.
    #[error("arithmetic overflow")]
    Overflow,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
}

/// A parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A numeric literal.
    Number(Decimal),
    /// A variable reference.
    Variable(String),
    /// Unary minus.
    Negate(Box<Expr>),
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
}

impl Expr {
    /// Evaluates the tree against `variables`.
    pub fn evaluate(&self, variables: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
        match self {
            Expr::Number(value) => Ok(*value),
            Expr::Variable(name) => {
                variables
                    .get(name)
                    .copied()
                    .ok_or_else(|| FormulaError::UnknownVariable { name: name.clone() })
            }
            Expr::Negate(inner) => Ok(-inner.evaluate(variables)?),
            Expr::Binary { op, left, right } => {
                let lhs = left.evaluate(variables)?;
                let rhs = right.evaluate(variables)?;
                match op {
                    BinaryOp::Add => lhs.checked_add(rhs).ok_or(FormulaError::Overflow),
                    BinaryOp::Subtract => lhs.checked_sub(rhs).ok_or(FormulaError::Overflow),
                    BinaryOp::Multiply => lhs.checked_mul(rhs).ok_or(FormulaError::Overflow),
                    BinaryOp::Divide => {
                        if rhs.is_zero() {
                            return Err(FormulaError::DivisionByZero);
                        }
                        lhs.checked_div(rhs).ok_or(FormulaError::Overflow)
                    }
                }
            }
        }
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                names.insert(name);
            }
            Expr::Negate(inner) => inner.collect_variables(names),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
        }
    }
}

/// A parsed formula expression.
///
/// # Examples
///
/// ```
/// use incentive_engine::calculation::Expression;
/// use rust_decimal::Decimal;
/// use std::collections::HashMap;
///
/// let expr = Expression::parse("(actual_km - target_km) * 0.5").unwrap();
///
/// let mut vars = HashMap::new();
/// vars.insert("actual_km".to_string(), Decimal::new(3200, 0));
/// vars.insert("target_km".to_string(), Decimal::new(3000, 0));
///
/// assert_eq!(expr.evaluate(&vars).unwrap(), Decimal::new(100, 0));
/// assert_eq!(expr.variables(), vec!["actual_km", "target_km"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parses expression text.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        if source.len() > MAX_EXPRESSION_LENGTH {
            return Err(FormulaError::TooLong {
                max: MAX_EXPRESSION_LENGTH,
            });
        }
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.parse_expr()?;
        if let Some(token) = parser.peek() {
            return Err(token.unexpected());
        }

        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Returns the original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the parsed tree.
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Evaluates the expression against `variables`.
    pub fn evaluate(&self, variables: &HashMap<String, Decimal>) -> Result<Decimal, FormulaError> {
        self.root.evaluate(variables)
    }

    /// Returns the distinct variable names referenced, sorted.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = BTreeSet::new();
        self.root.collect_variables(&mut names);
        names.into_iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(Decimal),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

impl Token {
    fn unexpected(&self) -> FormulaError {
        let found = match &self.kind {
            TokenKind::Number(value) => value.to_string(),
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Plus => "+".to_string(),
            TokenKind::Minus => "-".to_string(),
            TokenKind::Star => "*".to_string(),
            TokenKind::Slash => "/".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
        };
        FormulaError::UnexpectedToken {
            found,
            position: self.position,
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(position, ch)) = chars.peek() {
        let kind = match ch {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = position;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &source[position..end];
                let value = Decimal::from_str(literal).map_err(|_| FormulaError::InvalidNumber {
                    literal: literal.to_string(),
                    position,
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = position;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(source[position..end].to_string()),
                    position,
                });
                continue;
            }
            found => return Err(FormulaError::UnexpectedCharacter { found, position }),
        };
        chars.next();
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::TooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_term()?;
        while let Some(op) = self.peek().and_then(|t| match t.kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }) {
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, FormulaError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.peek().and_then(|t| match t.kind {
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            _ => None,
        }) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Minus) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(Expr::Negate(Box::new(inner)))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.parse_unary()?;
                self.depth -= 1;
                Ok(inner)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self.next().cloned().ok_or(FormulaError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::Ident(name) => Ok(Expr::Variable(name)),
            TokenKind::LParen => {
                self.descend()?;
                let inner = self.parse_expr()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(other.unexpected()),
                    None => Err(FormulaError::UnexpectedEnd),
                }
            }
            _ => Err(token.unexpected()),
        }
    }
}
