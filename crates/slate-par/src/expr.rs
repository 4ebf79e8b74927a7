//! Expression parsing: the precedence ladder.

use slate_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

impl Parser {
    /// Parses a full expression (entry at the assignment level).
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    /// Assignment level.
    ///
    /// Dispatches on the shape of the leading tokens: `const`/`global`
    /// prefixes, `array` declarations, and `name =` / `name[i] =` forms
    /// are handled here; anything else falls through to the logical
    /// level.
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        match self.current_kind() {
            TokenKind::Name => self.parse_name(AssignScope::Var),
            TokenKind::Array => self.parse_array_decl(AssignScope::Var),
            TokenKind::Const => {
                self.advance();
                self.parse_scoped_target(AssignScope::Const)
            }
            TokenKind::Global => {
                self.advance();
                self.parse_scoped_target(AssignScope::Global)
            }
            _ => self.parse_logical(),
        }
    }

    /// The target of a `const`/`global` prefix: a plain assignment or an
    /// array declaration.
    fn parse_scoped_target(&mut self, scope: AssignScope) -> Result<Expr, ParseError> {
        match self.current_kind() {
            TokenKind::Name => self.parse_name(scope),
            TokenKind::Array => self.parse_array_decl(scope),
            _ => Err(self.unexpected("identifier or 'array'")),
        }
    }

    /// A leading `NAME`: assignment, indexed assignment, or a plain value
    /// expression starting with that name.
    fn parse_name(&mut self, scope: AssignScope) -> Result<Expr, ParseError> {
        match self.peek().kind {
            TokenKind::Assign => {
                let name = self.advance().lexeme;
                self.advance(); // '='
                let value = self.parse_logical()?;
                Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                    scope,
                })
            }
            TokenKind::LSqBrace => {
                // Consume the whole postfix chain first; only an index
                // read directly followed by `=` is the assigning form.
                // Everything else re-enters the ladder so the usual
                // binary levels apply to a leading `name[i]`.
                let target = Expr::Ident(self.advance().lexeme);
                let target = self.parse_postfix(target)?;
                match target {
                    Expr::Index {
                        object,
                        index,
                        value: None,
                    } if self.current_kind() == TokenKind::Assign => {
                        self.advance();
                        let rhs = self.parse_expr()?;
                        Ok(Expr::Index {
                            object,
                            index,
                            value: Some(Box::new(rhs)),
                        })
                    }
                    other => self.parse_binary_from(other),
                }
            }
            _ => self.parse_logical(),
        }
    }

    /// `array name[n]` with an optional `= [ … ]` initialiser.
    fn parse_array_decl(&mut self, scope: AssignScope) -> Result<Expr, ParseError> {
        self.expect(TokenKind::Array)?;
        let name = self.expect(TokenKind::Name)?.lexeme;
        self.expect(TokenKind::LSqBrace)?;
        let length_token = self.expect(TokenKind::Number)?;
        let length: usize =
            length_token
                .lexeme
                .parse()
                .map_err(|_| ParseError::InvalidNumber {
                    lexeme: length_token.lexeme.clone(),
                    span: length_token.span,
                })?;
        self.expect(TokenKind::RSqBrace)?;

        let init = if self.match_kind(TokenKind::Assign) {
            self.expect(TokenKind::LSqBrace)?;
            let elements = self.parse_expr_list(TokenKind::RSqBrace)?;
            self.expect(TokenKind::RSqBrace)?;
            Some(elements)
        } else {
            None
        };

        Ok(Expr::ArrayDecl {
            name,
            length,
            init,
            scope,
        })
    }

    /// Continues the binary ladder above an operand that was parsed out
    /// of line, climbing from the multiplicative level back up to the
    /// logical level.
    fn parse_binary_from(&mut self, operand: Expr) -> Result<Expr, ParseError> {
        let left = self.parse_multiplicative_with(operand)?;
        let left = self.parse_additive_with(left)?;
        let left = self.parse_comparison_with(left)?;
        self.parse_logical_with(left)
    }

    /// Logical level: `AND` / `OR`, left-associative.
    fn parse_logical(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_comparison()?;
        self.parse_logical_with(left)
    }

    fn parse_logical_with(&mut self, mut left: Expr) -> Result<Expr, ParseError> {
        loop {
            let op = if self.current().is_operation("AND") {
                BinOp::And
            } else if self.current().is_operation("OR") {
                BinOp::Or
            } else {
                return Ok(left);
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::binary(op, BinKind::Boolean, left, right);
        }
    }

    /// Comparison level: `== != > < >= <=`, left-associative.
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        self.parse_comparison_with(left)
    }

    fn parse_comparison_with(&mut self, mut left: Expr) -> Result<Expr, ParseError> {
        while self.current_kind() == TokenKind::Compare {
            let op = match self.advance().lexeme.as_str() {
                "==" => BinOp::Eq,
                "!=" => BinOp::Ne,
                "<" => BinOp::Lt,
                ">" => BinOp::Gt,
                "<=" => BinOp::Le,
                _ => BinOp::Ge,
            };
            let right = self.parse_additive()?;
            left = Expr::binary(op, BinKind::Numeric, left, right);
        }
        Ok(left)
    }

    /// Additive level: `+ -`, left-associative.
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_multiplicative()?;
        self.parse_additive_with(left)
    }

    fn parse_additive_with(&mut self, mut left: Expr) -> Result<Expr, ParseError> {
        loop {
            let op = if self.current().is_operation("+") {
                BinOp::Add
            } else if self.current().is_operation("-") {
                BinOp::Sub
            } else {
                return Ok(left);
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, BinKind::Numeric, left, right);
        }
    }

    /// Multiplicative level: `* / MOD DIV`, left-associative.
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_unary()?;
        self.parse_multiplicative_with(left)
    }

    fn parse_multiplicative_with(&mut self, mut left: Expr) -> Result<Expr, ParseError> {
        loop {
            let op = if self.current().is_operation("*") {
                BinOp::Mul
            } else if self.current().is_operation("/") {
                BinOp::Div
            } else if self.current().is_operation("MOD") {
                BinOp::Mod
            } else if self.current().is_operation("DIV") {
                BinOp::IntDiv
            } else {
                return Ok(left);
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(op, BinKind::Numeric, left, right);
        }
    }

    /// Unary level: `NOT expr`, and a leading `-` desugared to `0 - expr`.
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.current().is_operation("NOT") {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnOp::Not,
                operand: Box::new(operand),
            });
        }
        if self.current().is_operation("-") {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::binary(
                BinOp::Sub,
                BinKind::Numeric,
                Expr::Int(0),
                operand,
            ));
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    /// Postfix level: member access and read-only indexing.
    ///
    /// Both chain on any expression, so `grid[i][j]`, `xs[0].upper()` and
    /// `"abc".upper().length` all work.
    pub(crate) fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let member = self.expect(TokenKind::Name)?.lexeme;
                    let (args, is_attribute) = if self.match_kind(TokenKind::LParen) {
                        let args = self.parse_expr_list(TokenKind::RParen)?;
                        self.expect(TokenKind::RParen)?;
                        (args, false)
                    } else {
                        (Vec::new(), true)
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        member,
                        args,
                        is_attribute,
                    };
                }
                TokenKind::LSqBrace => {
                    self.advance();
                    let index = self.parse_logical()?;
                    self.expect(TokenKind::RSqBrace)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        value: None,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Primary level: literals, names, calls, parentheses, list literals.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.current_kind() {
            TokenKind::Name => {
                let name = self.advance().lexeme;
                if self.match_kind(TokenKind::LParen) {
                    let args = self.parse_expr_list(TokenKind::RParen)?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            TokenKind::Number => {
                let token = self.advance();
                if token.lexeme.contains('.') {
                    token
                        .lexeme
                        .parse::<f64>()
                        .map(Expr::Float)
                        .map_err(|_| ParseError::InvalidNumber {
                            lexeme: token.lexeme.clone(),
                            span: token.span,
                        })
                } else {
                    token
                        .lexeme
                        .parse::<i64>()
                        .map(Expr::Int)
                        .map_err(|_| ParseError::InvalidNumber {
                            lexeme: token.lexeme.clone(),
                            span: token.span,
                        })
                }
            }
            TokenKind::Str => Ok(Expr::Str(self.advance().lexeme)),
            TokenKind::None => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LSqBrace => {
                self.advance();
                let elements = self.parse_expr_list(TokenKind::RSqBrace)?;
                self.expect(TokenKind::RSqBrace)?;
                Ok(Expr::List(elements))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// A comma-separated expression list, stopping before `terminator`.
    ///
    /// The list may be empty and tolerates a trailing comma.
    pub(crate) fn parse_expr_list(
        &mut self,
        terminator: TokenKind,
    ) -> Result<Vec<Expr>, ParseError> {
        let mut elements = Vec::new();
        if self.current_kind() == terminator {
            return Ok(elements);
        }
        loop {
            elements.push(self.parse_expr()?);
            if self.current_kind() == terminator {
                return Ok(elements);
            }
            self.expect(TokenKind::Comma)?;
            if self.current_kind() == terminator {
                return Ok(elements);
            }
        }
    }
}
