//! Boolean query language.
//!
//! ```text
//! query    → or_expr
//! or_expr  → and_expr ("OR" and_expr)*
//! and_expr → unary (("AND")? unary)*
//! unary    → "NOT" unary | primary
//! primary  → TERM | PHRASE | FIELD ":" (TERM | PHRASE) | "(" or_expr ")"
//! ```
//!
//! Keywords are case-sensitive. Adjacent terms without an operator are
//! joined with AND, so `rust NOT python` reads as `rust AND NOT python`.
//! Only `title:` and `content:` act as field prefixes; any other `x:y` is
//! an ordinary word, so times and URLs search as text.

use crate::core::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Keywords offered by the prompt's completer
pub const KEYWORDS: [&str; 3] = ["AND", "OR", "NOT"];

/// Document field a term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryField {
    Title,
    Content,
}

impl QueryField {
    fn from_prefix(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "content" => Some(Self::Content),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Content => "content",
        }
    }
}

/// Parsed query tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    /// A bare word; may still analyze into several tokens
    Term {
        field: QueryField,
        text: String,
    },
    /// A quoted phrase
    Phrase {
        field: QueryField,
        text: String,
    },
    And(Vec<QueryExpr>),
    Or(Vec<QueryExpr>),
    Not(Box<QueryExpr>),
}

/// A query string together with its parsed form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    expr: QueryExpr,
}

impl Query {
    /// Parse a query string, failing with `Error::QuerySyntax` when malformed
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(Error::syntax(0, "empty query"));
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            end: text.len(),
        };
        let expr = parser.parse_or()?;

        if let Some(token) = parser.peek() {
            return Err(Error::syntax(
                token.offset,
                format!("unexpected {}", token.kind),
            ));
        }

        Ok(Self {
            text: text.to_string(),
            expr,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expr(&self) -> &QueryExpr {
        &self.expr
    }
}

impl FromStr for Query {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word(String),
    Phrase(String),
    Field(QueryField),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => write!(f, "'{}'", word),
            Self::Phrase(text) => write!(f, "\"{}\"", text),
            Self::Field(field) => write!(f, "'{}:'", field.name()),
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
            Self::Not => f.write_str("NOT"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// Byte offset into the query string
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token { kind: TokenKind::LParen, offset });
            }
            ')' => {
                chars.next();
                tokens.push(Token { kind: TokenKind::RParen, offset });
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(Error::syntax(offset, "unterminated quote"));
                }
                tokens.push(Token {
                    kind: TokenKind::Phrase(text),
                    offset,
                });
            }
            _ => {
                let mut word = String::new();
                let mut field = None;
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' || c == '"' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                    // A known `field:` splits off as its own token when more follows
                    if c == ':' {
                        let followed = chars
                            .peek()
                            .is_some_and(|&(_, next)| !next.is_whitespace() && next != ')');
                        field = QueryField::from_prefix(&word[..word.len() - 1])
                            .filter(|_| followed);
                        if field.is_some() {
                            break;
                        }
                    }
                }

                let kind = match (field, word.as_str()) {
                    (Some(field), _) => TokenKind::Field(field),
                    (None, "AND") => TokenKind::And,
                    (None, "OR") => TokenKind::Or,
                    (None, "NOT") => TokenKind::Not,
                    (None, _) => TokenKind::Word(word),
                };
                tokens.push(Token { kind, offset });
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Offset reported for errors at end of input
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<QueryExpr> {
        let mut items = vec![self.parse_and()?];
        while matches!(self.peek(), Some(Token { kind: TokenKind::Or, .. })) {
            self.advance();
            items.push(self.parse_and()?);
        }
        Ok(collapse(items, QueryExpr::Or))
    }

    fn parse_and(&mut self) -> Result<QueryExpr> {
        let mut items = vec![self.parse_unary()?];
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::And) => {
                    self.advance();
                    items.push(self.parse_unary()?);
                }
                Some(
                    TokenKind::Word(_)
                    | TokenKind::Phrase(_)
                    | TokenKind::Field(_)
                    | TokenKind::Not
                    | TokenKind::LParen,
                ) => items.push(self.parse_unary()?),
                _ => break,
            }
        }
        Ok(collapse(items, QueryExpr::And))
    }

    fn parse_unary(&mut self) -> Result<QueryExpr> {
        if matches!(self.peek(), Some(Token { kind: TokenKind::Not, .. })) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(QueryExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<QueryExpr> {
        let Some(token) = self.advance() else {
            return Err(Error::syntax(
                self.end,
                "unexpected end of query, expected a search term",
            ));
        };

        match token.kind {
            TokenKind::Word(text) => Ok(QueryExpr::Term {
                field: QueryField::Content,
                text,
            }),
            TokenKind::Phrase(text) => Ok(QueryExpr::Phrase {
                field: QueryField::Content,
                text,
            }),
            TokenKind::Field(field) => {
                let name = field.name();
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::Word(text),
                        ..
                    }) => Ok(QueryExpr::Term { field, text }),
                    Some(Token {
                        kind: TokenKind::Phrase(text),
                        ..
                    }) => Ok(QueryExpr::Phrase { field, text }),
                    Some(other) => Err(Error::syntax(
                        other.offset,
                        format!("expected a term after '{}:', found {}", name, other.kind),
                    )),
                    None => Err(Error::syntax(
                        self.end,
                        format!("expected a term after '{}:'", name),
                    )),
                }
            }
            TokenKind::LParen => {
                let expr = self.parse_or()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(expr),
                    _ => Err(Error::syntax(token.offset, "unclosed parenthesis")),
                }
            }
            kind @ (TokenKind::And | TokenKind::Or | TokenKind::Not | TokenKind::RParen) => {
                Err(Error::syntax(
                    token.offset,
                    format!("expected a search term, found {}", kind),
                ))
            }
        }
    }
}

fn collapse(mut items: Vec<QueryExpr>, combine: fn(Vec<QueryExpr>) -> QueryExpr) -> QueryExpr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        combine(items)
    }
}
