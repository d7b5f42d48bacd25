/// Parser for filter expressions
///
/// Converts a stream of tokens into an Abstract Syntax Tree (AST).
///
/// Grammar, lowest precedence first:
///
/// ```text
/// expr       := and_expr ( '|' and_expr )*
/// and_expr   := not_expr ( '&' not_expr )*
/// not_expr   := '~' not_expr | primary
/// primary    := '(' expr ')' | comparison
/// comparison := operand op operand
/// operand    := column | literal
/// ```
use super::ast::*;
use super::lexer::{Lexer, Spanned, Token};
use crate::error::{Error, Result};

/// Parsed, unresolved filter expression
pub type FilterExpr = Expr<ColumnRef>;

/// Deepest accepted nesting of parentheses and `~`
pub const MAX_NESTING: usize = 128;

/// Parse a filter expression in one call
pub fn parse_filter(input: &str) -> Result<FilterExpr> {
    Parser::new(input)?.parse()
}

/// Parser for filter expressions
pub struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
    depth: usize,
}

enum Operand {
    Column(ColumnRef),
    Literal(Literal, usize),
}

impl Parser {
    /// Create a new parser from expression text
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            depth: 0,
        })
    }

    /// Parse the whole input into an AST
    pub fn parse(&mut self) -> Result<FilterExpr> {
        if self.current_token() == &Token::Eof {
            return Err(Error::syntax(self.current_position(), "empty expression"));
        }

        let expr = self.parse_expression()?;

        match self.current_token() {
            Token::Eof => Ok(expr),
            Token::RightParen => Err(Error::syntax(
                self.current_position(),
                "unbalanced parentheses: unexpected ')'",
            )),
            token => Err(Error::syntax(
                self.current_position(),
                format!("unexpected trailing token '{}'", token),
            )),
        }
    }

    fn parse_expression(&mut self) -> Result<FilterExpr> {
        self.parse_or()
    }

    // Chains collect into one n-ary node so tree depth follows nesting only
    fn parse_or(&mut self) -> Result<FilterExpr> {
        let mut terms = vec![self.parse_and()?];

        while self.current_token() == &Token::Or {
            self.advance();
            terms.push(self.parse_and()?);
        }

        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> Result<FilterExpr> {
        let mut terms = vec![self.parse_not()?];

        while self.current_token() == &Token::And {
            self.advance();
            terms.push(self.parse_not()?);
        }

        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::And(terms)
        })
    }

    fn parse_not(&mut self) -> Result<FilterExpr> {
        if self.current_token() == &Token::Not {
            self.enter()?;
            self.advance();
            let expr = self.parse_not()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(expr)));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<FilterExpr> {
        if self.current_token() == &Token::LeftParen {
            self.enter()?;
            let open = self.current_position();
            self.advance();
            if self.current_token() == &Token::RightParen {
                return Err(Error::syntax(
                    self.current_position(),
                    "empty parentheses",
                ));
            }
            let expr = self.parse_expression()?;
            if self.current_token() != &Token::RightParen {
                return Err(Error::syntax(
                    open,
                    format!(
                        "unbalanced parentheses: '(' is never closed, found '{}'",
                        self.current_token()
                    ),
                ));
            }
            self.advance();
            self.depth -= 1;
            return Ok(expr);
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<FilterExpr> {
        let left = self.parse_operand("a column or value")?;

        let op = match self.current_token() {
            Token::Eq => CompareOp::Eq,
            Token::Ne => CompareOp::Ne,
            Token::Lt => CompareOp::Lt,
            Token::Le => CompareOp::Le,
            Token::Gt => CompareOp::Gt,
            Token::Ge => CompareOp::Ge,
            token => {
                return Err(Error::syntax(
                    self.current_position(),
                    format!("expected a comparison operator, found '{}'", token),
                ))
            }
        };
        self.advance();

        let right = self.parse_operand(&format!("a value after '{}'", op))?;

        match (left, right) {
            (Operand::Column(column), Operand::Literal(literal, _)) => Ok(Expr::Comparison {
                column,
                op,
                literal,
            }),
            (Operand::Literal(literal, _), Operand::Column(column)) => Ok(Expr::Comparison {
                column,
                op: op.mirrored(),
                literal,
            }),
            (Operand::Column(_), Operand::Column(right)) => Err(Error::syntax(
                right.position,
                "comparing two columns is not supported, compare a column with a value",
            )),
            (Operand::Literal(_, position), Operand::Literal(..)) => Err(Error::syntax(
                position,
                "comparison needs a column on one side",
            )),
        }
    }

    fn parse_operand(&mut self, expected: &str) -> Result<Operand> {
        let position = self.current_position();
        let operand = match self.current_token().clone() {
            Token::Column(parts) => Operand::Column(column_ref(parts, position)),
            Token::Integer(i) => Operand::Literal(Literal::Integer(i), position),
            Token::Float(f) => Operand::Literal(Literal::Float(f), position),
            Token::String(s) => Operand::Literal(Literal::String(s), position),
            Token::Boolean(b) => Operand::Literal(Literal::Boolean(b), position),
            Token::Null => Operand::Literal(Literal::Null, position),
            Token::Eof => {
                return Err(Error::syntax(
                    position,
                    format!("expected {}, found end of input", expected),
                ))
            }
            token => {
                return Err(Error::syntax(
                    position,
                    format!("expected {}, found '{}'", expected, token),
                ))
            }
        };
        self.advance();
        Ok(operand)
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(Error::syntax(
                self.current_position(),
                format!("expression nested deeper than {} levels", MAX_NESTING),
            ));
        }
        Ok(())
    }

    fn current_token(&self) -> &Token {
        &self.tokens[self.position].token
    }

    fn current_position(&self) -> usize {
        self.tokens[self.position].position
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }
}

fn column_ref(mut parts: Vec<String>, position: usize) -> ColumnRef {
    if parts.first().is_some_and(|p| p == "self") && parts.len() > 1 {
        parts.remove(0);
        if parts.len() == 1 {
            return ColumnRef {
                kind: ColumnRefKind::SelfQualified(parts.remove(0)),
                position,
            };
        }
    }

    let kind = match parts.pop() {
        Some(name) if parts.is_empty() => ColumnRefKind::Unqualified(name),
        Some(name) => ColumnRefKind::Qualified { path: parts, name },
        // The lexer never yields an empty path
        None => ColumnRefKind::Unqualified(String::new()),
    };
    ColumnRef { kind, position }
}
