//! Statement and block parsing.

use slate_lex::TokenKind;

use crate::ast::*;
use crate::{ParseError, Parser};

impl Parser {
    /// Parses one statement, dispatching on the current token kind.
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.current_kind() {
            TokenKind::If => Ok(Stmt::If(self.parse_if_block()?)),
            TokenKind::For => Ok(Stmt::For(self.parse_for_block()?)),
            TokenKind::While => Ok(Stmt::While(self.parse_while_block()?)),
            TokenKind::Function => Ok(Stmt::Func(self.parse_func_block(FuncKind::Function)?)),
            TokenKind::Procedure => Ok(Stmt::Func(self.parse_func_block(FuncKind::Procedure)?)),
            _ => {
                let expr = self.parse_expr()?;
                self.newline_or_eof()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Parses statements until one of `terminators` appears at the top of
    /// the block. Blank lines inside the block are skipped.
    ///
    /// The terminator token is left in place for the caller.
    fn parse_body(
        &mut self,
        terminators: &[TokenKind],
        context: &'static str,
    ) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        loop {
            let kind = self.current_kind();
            if terminators.contains(&kind) {
                return Ok(body);
            }
            match kind {
                TokenKind::Eof => {
                    return Err(ParseError::UnexpectedEof {
                        context: context.to_string(),
                    })
                }
                TokenKind::Newline => {
                    self.advance();
                }
                _ => body.push(self.parse_stmt()?),
            }
        }
    }

    /// `if … then NEWLINE body (elseif … then NEWLINE body)* (else NEWLINE
    /// body)? endif`
    fn parse_if_block(&mut self) -> Result<IfBlock, ParseError> {
        self.expect(TokenKind::If)?;
        let mut branches = vec![self.parse_if_branch()?];

        while self.match_kind(TokenKind::ElseIf) {
            branches.push(self.parse_if_branch()?);
        }

        if self.match_kind(TokenKind::Else) {
            self.expect(TokenKind::Newline)?;
            let body = self.parse_body(&[TokenKind::EndIf], "else branch body")?;
            branches.push(IfBranch {
                condition: None,
                body,
            });
        }

        self.expect(TokenKind::EndIf)?;
        self.newline_or_eof()?;
        Ok(IfBlock { branches })
    }

    /// One guarded branch: condition, `then`, newline, body.
    fn parse_if_branch(&mut self) -> Result<IfBranch, ParseError> {
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        self.expect(TokenKind::Newline)?;
        let body = self.parse_body(
            &[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf],
            "if branch body",
        )?;
        Ok(IfBranch {
            condition: Some(condition),
            body,
        })
    }

    /// `for name = expr to expr [step expr] NEWLINE body next name`
    ///
    /// The identifier after `next` is required but not checked against the
    /// loop variable.
    fn parse_for_block(&mut self) -> Result<ForBlock, ParseError> {
        self.expect(TokenKind::For)?;

        if self.current_kind() != TokenKind::Name {
            return Err(self.unexpected("loop variable name"));
        }
        let var = self.current().lexeme.clone();
        let init = self.parse_expr()?;
        if !matches!(
            init,
            Expr::Assign {
                scope: AssignScope::Var,
                ..
            }
        ) {
            return Err(self.unexpected("loop initialiser assignment"));
        }

        self.expect(TokenKind::To)?;
        let limit = self.parse_expr()?;

        let step = if self.match_kind(TokenKind::Step) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        self.expect(TokenKind::Newline)?;
        let body = self.parse_body(&[TokenKind::Next], "for body")?;
        self.expect(TokenKind::Next)?;
        self.expect(TokenKind::Name)?;
        self.newline_or_eof()?;

        Ok(ForBlock {
            var,
            init,
            limit,
            step,
            body,
        })
    }

    /// `while expr NEWLINE body endwhile`
    fn parse_while_block(&mut self) -> Result<WhileBlock, ParseError> {
        self.expect(TokenKind::While)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Newline)?;
        let body = self.parse_body(&[TokenKind::EndWhile], "while body")?;
        self.expect(TokenKind::EndWhile)?;
        self.newline_or_eof()?;
        Ok(WhileBlock { condition, body })
    }

    /// `function name(params) NEWLINE body [return expr NEWLINE]
    /// endfunction`, or the `procedure` form, which may not return.
    fn parse_func_block(&mut self, kind: FuncKind) -> Result<FuncBlock, ParseError> {
        let end_kind = match kind {
            FuncKind::Function => {
                self.expect(TokenKind::Function)?;
                TokenKind::EndFunction
            }
            FuncKind::Procedure => {
                self.expect(TokenKind::Procedure)?;
                TokenKind::EndProcedure
            }
        };

        let name = self.expect(TokenKind::Name)?.lexeme;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Newline)?;

        let body = self.parse_body(&[TokenKind::Return, end_kind], "subroutine body")?;

        let return_expr = if self.current_kind() == TokenKind::Return {
            if kind == FuncKind::Procedure {
                return Err(ParseError::ReturnInProcedure {
                    span: self.current().span,
                });
            }
            self.advance();
            let expr = self.parse_expr()?;
            self.skip_newlines();
            Some(expr)
        } else {
            None
        };

        self.expect(end_kind)?;
        self.newline_or_eof()?;

        Ok(FuncBlock {
            name,
            params,
            body,
            kind,
            return_expr,
        })
    }

    /// A comma-separated parameter name list, possibly empty.
    fn parse_params(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        if self.current_kind() == TokenKind::RParen {
            return Ok(params);
        }
        loop {
            params.push(self.expect(TokenKind::Name)?.lexeme);
            if self.current_kind() == TokenKind::RParen {
                return Ok(params);
            }
            self.expect(TokenKind::Comma)?;
            if self.current_kind() == TokenKind::RParen {
                return Ok(params);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_lex::tokenize;

    fn parse_source(source: &str) -> Result<Program, ParseError> {
        crate::parse(tokenize(source).unwrap())
    }

    fn single_stmt(source: &str) -> Stmt {
        let mut program = parse_source(source).unwrap();
        assert_eq!(program.body.len(), 1);
        program.body.remove(0)
    }

    #[test]
    fn test_if_else() {
        let stmt = single_stmt("if 1 < 2 then\nprint(\"a\")\nelse\nprint(\"b\")\nendif\n");
        let Stmt::If(block) = stmt else {
            panic!("expected if block");
        };
        assert_eq!(block.branches.len(), 2);
        assert!(block.branches[0].condition.is_some());
        assert!(block.branches[1].condition.is_none());
    }

    #[test]
    fn test_if_elseif_chain() {
        let source = "if a then\nx = 1\nelseif b then\nx = 2\nelseif c then\nx = 3\nelse\nx = 4\nendif\n";
        let Stmt::If(block) = single_stmt(source) else {
            panic!("expected if block");
        };
        assert_eq!(block.branches.len(), 4);
        assert!(block.branches[2].condition.is_some());
        assert!(block.branches[3].condition.is_none());
    }

    #[test]
    fn test_if_without_else() {
        let Stmt::If(block) = single_stmt("if x then\ny = 1\nendif\n") else {
            panic!("expected if block");
        };
        assert_eq!(block.branches.len(), 1);
    }

    #[test]
    fn test_missing_endif() {
        let err = parse_source("if x then\ny = 1\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_missing_then() {
        let err = parse_source("if x\ny = 1\nendif\n").unwrap_err();
        assert!(err.to_string().contains("'then'"));
    }

    #[test]
    fn test_for_block() {
        let Stmt::For(block) = single_stmt("for i = 0 to 3\nprint(i)\nnext i\n") else {
            panic!("expected for block");
        };
        assert_eq!(block.var, "i");
        assert_eq!(block.limit, Expr::Int(3));
        assert!(block.step.is_none());
        assert_eq!(block.body.len(), 1);
        assert!(matches!(
            block.init,
            Expr::Assign {
                scope: AssignScope::Var,
                ..
            }
        ));
    }

    #[test]
    fn test_for_with_step() {
        let Stmt::For(block) = single_stmt("for i = 10 to 0 step 0 - 2\ni\nnext i\n") else {
            panic!("expected for block");
        };
        assert!(block.step.is_some());
    }

    #[test]
    fn test_next_name_is_not_checked() {
        // The grammar requires a name after `next` but ignores which one.
        assert!(parse_source("for i = 0 to 2\ni\nnext j\n").is_ok());
    }

    #[test]
    fn test_next_requires_a_name() {
        assert!(parse_source("for i = 0 to 2\ni\nnext\n").is_err());
    }

    #[test]
    fn test_while_block() {
        let Stmt::While(block) = single_stmt("while x < 10\nx = x + 1\nendwhile\n") else {
            panic!("expected while block");
        };
        assert!(matches!(block.condition, Expr::Binary { .. }));
        assert_eq!(block.body.len(), 1);
    }

    #[test]
    fn test_function_with_return() {
        let Stmt::Func(func) = single_stmt("function sq(n)\nreturn n * n\nendfunction\n") else {
            panic!("expected function");
        };
        assert_eq!(func.name, "sq");
        assert_eq!(func.params, vec!["n".to_string()]);
        assert_eq!(func.kind, FuncKind::Function);
        assert!(func.body.is_empty());
        assert!(func.return_expr.is_some());
    }

    #[test]
    fn test_function_with_body_and_return() {
        let source = "function f(a, b)\nc = a + b\nreturn c\nendfunction\n";
        let Stmt::Func(func) = single_stmt(source) else {
            panic!("expected function");
        };
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.body.len(), 1);
        assert!(func.return_expr.is_some());
    }

    #[test]
    fn test_procedure() {
        let Stmt::Func(func) = single_stmt("procedure greet()\nprint(\"hi\")\nendprocedure\n")
        else {
            panic!("expected procedure");
        };
        assert_eq!(func.kind, FuncKind::Procedure);
        assert!(func.params.is_empty());
        assert!(func.return_expr.is_none());
    }

    #[test]
    fn test_procedure_cannot_return() {
        let err = parse_source("procedure p()\nreturn 1\nendprocedure\n").unwrap_err();
        assert!(matches!(err, ParseError::ReturnInProcedure { .. }));
    }

    #[test]
    fn test_nested_blocks() {
        let source = "while a\nif b then\nc = 1\nendif\nendwhile\n";
        let Stmt::While(block) = single_stmt(source) else {
            panic!("expected while block");
        };
        assert!(matches!(block.body[0], Stmt::If(_)));
    }

    #[test]
    fn test_blank_lines_inside_blocks() {
        let source = "while a\n\n\nb = 1\n\nendwhile\n";
        let Stmt::While(block) = single_stmt(source) else {
            panic!("expected while block");
        };
        assert_eq!(block.body.len(), 1);
    }

    #[test]
    fn test_block_terminator_at_eof() {
        // The final newline after a terminator is optional.
        assert!(parse_source("while a\nb = 1\nendwhile").is_ok());
        assert!(parse_source("if a then\nb = 1\nendif").is_ok());
    }
}
