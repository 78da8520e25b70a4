//! Recursive-descent parser for TDQ.
//!
//! Precedence, loosest to tightest: `OR` > `AND` (implicit or explicit) >
//! `NOT` > primary. A bare space between expressions is an implicit `AND`.

use super::ast::{BoolOp, CompareOp, Expr, Query, SortClause, SortDirection, SpecialKind, Value};
use super::lexer::{lex, Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Functions the grammar recognizes as calls rather than bare identifiers
/// — the closed function set.
const FUNCTIONS: &[&str] = &[
    "has", "is", "any", "blocks", "blocked_by", "child_of", "descendant_of", "is_ready",
    "has_open_deps", "rework",
];

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.idx].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.idx + offset)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.tokens[self.idx].kind.clone();
        if self.idx + 1 < self.tokens.len() {
            self.idx += 1;
        }
        kind
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError {
                message: format!("expected {expected:?}, found {:?}", self.peek()),
            })
        }
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    /// True if the current token can begin a primary expression — used to
    /// detect an implicit AND between two adjacent terms.
    fn starts_term(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Ident(_)
                | TokenKind::String(_)
                | TokenKind::Not
                | TokenKind::LParen
                | TokenKind::At
        )
    }

    fn parse_query(&mut self) -> Result<Query, ParseError> {
        let sort = self.try_parse_leading_sort()?;
        if self.at_eof() {
            return Ok(Query { expr: None, sort });
        }
        let expr = self.parse_or()?;
        let trailing_sort = self.try_parse_leading_sort()?;
        if !self.at_eof() {
            return Err(ParseError {
                message: format!("unexpected trailing token {:?}", self.peek()),
            });
        }
        Ok(Query {
            expr: Some(expr),
            sort: sort.or(trailing_sort),
        })
    }

    /// `sort:` may appear anywhere at the top level (conventionally the
    /// end); consumed whenever `Ident("sort") Colon` is seen.
    fn try_parse_leading_sort(&mut self) -> Result<Option<SortClause>, ParseError> {
        if let TokenKind::Ident(name) = self.peek() {
            if name == "sort" && matches!(self.peek_at(1), TokenKind::Colon) {
                self.advance(); // "sort"
                self.advance(); // ":"
                let direction = if matches!(self.peek(), TokenKind::Minus) {
                    self.advance();
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                let field = match self.advance() {
                    TokenKind::Ident(f) => f,
                    other => {
                        return Err(ParseError {
                            message: format!("expected sort field, found {other:?}"),
                        })
                    }
                };
                return Ok(Some(SortClause { field, direction }));
            }
        }
        Ok(None)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        loop {
            if matches!(self.peek(), TokenKind::Or) {
                self.advance();
                let right = self.parse_and()?;
                left = Expr::BinaryExpr {
                    op: BoolOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        loop {
            if matches!(self.peek(), TokenKind::And) {
                self.advance();
                let right = self.parse_not()?;
                left = Expr::BinaryExpr {
                    op: BoolOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            } else if self.starts_term() {
                // implicit AND
                let right = self.parse_not()?;
                left = Expr::BinaryExpr {
                    op: BoolOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        // `NOT`, `!`, and a leading `-` (not absorbed into a number literal
        // by the lexer) are all spellings of logical negation.
        if matches!(self.peek(), TokenKind::Not | TokenKind::Minus) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::UnaryExpr { expr: Box::new(inner) });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_or()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::TextSearch(s))
            }
            TokenKind::Ident(name) => self.parse_ident_led(name),
            other => Err(ParseError {
                message: format!("unexpected token {other:?}"),
            }),
        }
    }

    /// Disambiguates a function call (`name(args...)`), a dotted field
    /// (`entity.field op value`), and a bare field (`field op value`).
    fn parse_ident_led(&mut self, name: String) -> Result<Expr, ParseError> {
        self.advance(); // consume the identifier

        if matches!(self.peek(), TokenKind::LParen) && FUNCTIONS.contains(&name.as_str()) {
            self.advance();
            let mut args = Vec::new();
            if !matches!(self.peek(), TokenKind::RParen) {
                loop {
                    args.push(self.parse_value()?);
                    if matches!(self.peek(), TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::FunctionCall { name, args });
        }

        let mut field = name;
        while matches!(self.peek(), TokenKind::Dot) {
            self.advance();
            match self.advance() {
                TokenKind::Ident(part) => {
                    field.push('.');
                    field.push_str(&part);
                }
                other => {
                    return Err(ParseError {
                        message: format!("expected field segment after '.', found {other:?}"),
                    })
                }
            }
        }

        let op = self.parse_compare_op()?;
        let value = self.parse_value()?;
        Ok(Expr::FieldExpr { field, op, value })
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, ParseError> {
        match self.advance() {
            TokenKind::Op("=") => Ok(CompareOp::Eq),
            TokenKind::Op("!=") => Ok(CompareOp::Ne),
            TokenKind::Op("<") => Ok(CompareOp::Lt),
            TokenKind::Op(">") => Ok(CompareOp::Gt),
            TokenKind::Op("<=") => Ok(CompareOp::Le),
            TokenKind::Op(">=") => Ok(CompareOp::Ge),
            TokenKind::Op("~") => Ok(CompareOp::Match),
            TokenKind::Op("!~") => Ok(CompareOp::NotMatch),
            other => Err(ParseError {
                message: format!("expected comparison operator, found {other:?}"),
            }),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match self.advance() {
            TokenKind::String(s) => Ok(Value::StringValue(s)),
            TokenKind::Number(n) => Ok(Value::NumberValue(n)),
            TokenKind::Date { raw, relative } => Ok(Value::DateValue { raw, relative }),
            TokenKind::Minus => match self.advance() {
                TokenKind::Number(n) => Ok(Value::NumberValue(-n)),
                other => Err(ParseError {
                    message: format!("expected number after '-', found {other:?}"),
                }),
            },
            TokenKind::At => match self.advance() {
                TokenKind::Ident(ref id) if id == "me" => {
                    Ok(Value::SpecialValue(SpecialKind::Me))
                }
                other => Err(ParseError {
                    message: format!("expected 'me' after '@', found {other:?}"),
                }),
            },
            TokenKind::Ident(id) => match id.as_str() {
                "EMPTY" => Ok(Value::SpecialValue(SpecialKind::Empty)),
                "NULL" => Ok(Value::SpecialValue(SpecialKind::Null)),
                _ => Ok(Value::Identifier(id)),
            },
            other => Err(ParseError {
                message: format!("unexpected value token {other:?}"),
            }),
        }
    }
}

/// Parse TDQ source text into a `Query`.
pub fn parse(input: &str) -> Result<Query, ParseError> {
    let tokens = lex(input).map_err(|e| ParseError {
        message: format!("{} at line {}, column {}", e.message, e.pos.line, e.pos.column),
    })?;
    let mut parser = Parser { tokens, idx: 0 };
    parser.parse_query()
}
