//! Definition expressions: attribute filters attached to a dataset.
//!
//! A dataset may be restricted to a subset of its features by a small
//! SQL-like `WHERE` clause, evaluated on every query:
//!
//! ```text
//! FLD_ZONE IN ('AE', 'VE') AND STATE = 'FL' AND SFHA_TF IS NOT NULL
//! ```
//!
//! Supported clauses are `=`, `<>` (or `!=`), `IN (...)`, `IS NULL` and
//! `IS NOT NULL`, joined with `AND`. Literals are single-quoted strings
//! (`''` escapes a quote) or numbers. Keywords are case-insensitive.
//! Comparisons against a null or missing attribute are false.

use std::fmt;

use thiserror::Error;

use crate::feature::{AttributeValue, Attributes};

/// Errors produced while parsing a definition expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// A token appeared where it is not allowed
    #[error("unexpected '{found}' at offset {offset}, expected {expected}")]
    UnexpectedToken {
        offset: usize,
        found: String,
        expected: &'static str,
    },

    /// The expression ended in the middle of a clause
    #[error("unexpected end of expression, expected {0}")]
    UnexpectedEnd(&'static str),

    /// A quoted string was never closed
    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    /// A character outside the expression grammar
    #[error("invalid character '{found}' at offset {offset}")]
    InvalidCharacter { offset: usize, found: char },
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Text(String),
    Number(f64),
}

impl Literal {
    fn matches(&self, value: &AttributeValue) -> bool {
        match self {
            Literal::Text(text) => value.as_str() == Some(text.as_str()),
            Literal::Number(n) => value.as_f64() == Some(*n),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            Literal::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Equals(String, Literal),
    NotEquals(String, Literal),
    In(String, Vec<Literal>),
    IsNull(String),
    IsNotNull(String),
}

impl Clause {
    fn evaluate(&self, attributes: &Attributes) -> bool {
        let present = |field: &str| attributes.get(field).filter(|v| !v.is_null());
        match self {
            Clause::Equals(field, lit) => present(field).is_some_and(|v| lit.matches(v)),
            Clause::NotEquals(field, lit) => present(field).is_some_and(|v| !lit.matches(v)),
            Clause::In(field, lits) => {
                present(field).is_some_and(|v| lits.iter().any(|lit| lit.matches(v)))
            }
            Clause::IsNull(field) => present(field).is_none(),
            Clause::IsNotNull(field) => present(field).is_some(),
        }
    }
}

/// A parsed attribute filter.
///
/// The empty expression matches every feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefinitionExpression {
    clauses: Vec<Clause>,
}

impl DefinitionExpression {
    /// Parse an expression; blank input yields the match-all expression.
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        let tokens = tokenize(input)?;
        Parser { tokens, pos: 0 }.parse()
    }

    /// Whether the expression is the match-all expression.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate against a feature's attributes.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        self.clauses.iter().all(|clause| clause.evaluate(attributes))
    }
}

impl fmt::Display for DefinitionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            match clause {
                Clause::Equals(field, lit) => write!(f, "{} = {}", field, lit)?,
                Clause::NotEquals(field, lit) => write!(f, "{} <> {}", field, lit)?,
                Clause::In(field, lits) => {
                    let items: Vec<String> = lits.iter().map(ToString::to_string).collect();
                    write!(f, "{} IN ({})", field, items.join(", "))?
                }
                Clause::IsNull(field) => write!(f, "{} IS NULL", field)?,
                Clause::IsNotNull(field) => write!(f, "{} IS NOT NULL", field)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Text(String),
    Number(f64),
    Equals,
    NotEquals,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

impl Token {
    fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s) => s.clone(),
            TokenKind::Text(s) => format!("'{}'", s),
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Equals => "=".to_string(),
            TokenKind::NotEquals => "<>".to_string(),
            TokenKind::LParen => "(".to_string(),
            TokenKind::RParen => ")".to_string(),
            TokenKind::Comma => ",".to_string(),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s.eq_ignore_ascii_case(keyword))
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '=' => {
                tokens.push(Token { kind: TokenKind::Equals, offset });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, offset });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, offset });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, offset });
                i += 1;
            }
            '<' | '!' => {
                let next = chars.get(i + 1).map(|&(_, c)| c);
                let valid = (c == '<' && next == Some('>')) || (c == '!' && next == Some('='));
                if !valid {
                    return Err(ExpressionError::InvalidCharacter { offset, found: c });
                }
                tokens.push(Token { kind: TokenKind::NotEquals, offset });
                i += 2;
            }
            '\'' => {
                let mut text = String::new();
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => return Err(ExpressionError::UnterminatedString(offset)),
                        Some(&(_, '\'')) if chars.get(j + 1).map(|&(_, c)| c) == Some('\'') => {
                            text.push('\'');
                            j += 2;
                        }
                        Some(&(_, '\'')) => break,
                        Some(&(_, c)) => {
                            text.push(c);
                            j += 1;
                        }
                    }
                }
                tokens.push(Token { kind: TokenKind::Text(text), offset });
                i = j + 1;
            }
            c if c.is_ascii_digit() || c == '-' || c == '.' => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].1.is_ascii_digit() || chars[j].1 == '.') {
                    j += 1;
                }
                let end = chars.get(j).map_or(input.len(), |&(o, _)| o);
                let literal = &input[offset..end];
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::InvalidCharacter { offset, found: c })?;
                tokens.push(Token { kind: TokenKind::Number(number), offset });
                i = j;
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].1.is_alphanumeric() || chars[j].1 == '_') {
                    j += 1;
                }
                let end = chars.get(j).map_or(input.len(), |&(o, _)| o);
                tokens.push(Token {
                    kind: TokenKind::Ident(input[offset..end].to_string()),
                    offset,
                });
                i = j;
            }
            other => return Err(ExpressionError::InvalidCharacter { offset, found: other }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn parse(mut self) -> Result<DefinitionExpression, ExpressionError> {
        let mut clauses = Vec::new();
        if self.tokens.is_empty() {
            return Ok(DefinitionExpression { clauses });
        }
        loop {
            clauses.push(self.clause()?);
            match self.next() {
                None => break,
                Some(tok) if tok.is_keyword("AND") => continue,
                Some(tok) => return Err(unexpected(&tok, "AND or end of expression")),
            }
        }
        Ok(DefinitionExpression { clauses })
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_next(&mut self, expected: &'static str) -> Result<Token, ExpressionError> {
        self.next().ok_or(ExpressionError::UnexpectedEnd(expected))
    }

    fn clause(&mut self) -> Result<Clause, ExpressionError> {
        let field_tok = self.expect_next("field name")?;
        let field = match &field_tok.kind {
            TokenKind::Ident(name) if !is_reserved(name) => name.clone(),
            _ => return Err(unexpected(&field_tok, "field name")),
        };

        let op = self.expect_next("operator")?;
        match &op.kind {
            TokenKind::Equals => Ok(Clause::Equals(field, self.literal()?)),
            TokenKind::NotEquals => Ok(Clause::NotEquals(field, self.literal()?)),
            _ if op.is_keyword("IN") => Ok(Clause::In(field, self.literal_list()?)),
            _ if op.is_keyword("IS") => {
                let tok = self.expect_next("NULL or NOT NULL")?;
                if tok.is_keyword("NULL") {
                    return Ok(Clause::IsNull(field));
                }
                if !tok.is_keyword("NOT") {
                    return Err(unexpected(&tok, "NULL or NOT NULL"));
                }
                let tok = self.expect_next("NULL")?;
                if tok.is_keyword("NULL") {
                    Ok(Clause::IsNotNull(field))
                } else {
                    Err(unexpected(&tok, "NULL"))
                }
            }
            _ => Err(unexpected(&op, "=, <>, IN or IS")),
        }
    }

    fn literal(&mut self) -> Result<Literal, ExpressionError> {
        let tok = self.expect_next("literal")?;
        match tok.kind {
            TokenKind::Text(text) => Ok(Literal::Text(text)),
            TokenKind::Number(n) => Ok(Literal::Number(n)),
            _ => Err(unexpected(&tok, "literal")),
        }
    }

    fn literal_list(&mut self) -> Result<Vec<Literal>, ExpressionError> {
        let open = self.expect_next("(")?;
        if open.kind != TokenKind::LParen {
            return Err(unexpected(&open, "("));
        }
        let mut literals = vec![self.literal()?];
        loop {
            let tok = self.expect_next(", or )")?;
            match tok.kind {
                TokenKind::Comma => literals.push(self.literal()?),
                TokenKind::RParen => return Ok(literals),
                _ => return Err(unexpected(&tok, ", or )")),
            }
        }
    }
}

fn is_reserved(word: &str) -> bool {
    ["AND", "IN", "IS", "NOT", "NULL"]
        .iter()
        .any(|kw| word.eq_ignore_ascii_case(kw))
}

fn unexpected(tok: &Token, expected: &'static str) -> ExpressionError {
    ExpressionError::UnexpectedToken {
        offset: tok.offset,
        found: tok.describe(),
        expected,
    }
}
