// src/frontend/parse_stmt.rs
//! Statement and block parsing for function bodies.

use crate::errors::parse::ParseErrorKind;
use crate::frontend::ast::*;
use crate::frontend::parser::Parser;
use crate::frontend::TokenType;

impl Parser {
    pub(crate) fn parse_block(&mut self) -> Option<Block> {
        let start = self.current().span;
        if !self.consume(TokenType::LBrace, "{") {
            return None;
        }
        let saved = self.allow_composite;
        self.allow_composite = true;
        let mut stmts = Vec::new();
        self.skip_semis();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            match self.statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.recover_until(&[TokenType::RBrace]),
            }
            self.skip_semis();
        }
        self.consume(TokenType::RBrace, "}");
        self.allow_composite = saved;
        Some(Block {
            stmts,
            span: start.merge(self.previous().span),
        })
    }

    pub(crate) fn statement(&mut self) -> Option<Stmt> {
        match self.current().ty {
            TokenType::KwVar => self.declaration().map(|d| Stmt::Decl(Box::new(d))),
            TokenType::KwConst => self.declaration().map(|d| Stmt::Decl(Box::new(d))),
            TokenType::KwType => self.declaration().map(|d| Stmt::Decl(Box::new(d))),
            TokenType::KwGo => {
                self.advance();
                let call = self.parse_expr()?;
                Some(Stmt::Go(call))
            }
            TokenType::KwDefer => {
                self.advance();
                let call = self.parse_expr()?;
                Some(Stmt::Defer(call))
            }
            TokenType::KwReturn => {
                let start = self.current().span;
                self.advance();
                let mut values = Vec::new();
                if !self.check(TokenType::Semicolon)
                    && !self.check(TokenType::RBrace)
                    && !self.check(TokenType::Eof)
                {
                    values.push(self.parse_expr()?);
                    while self.match_token(TokenType::Comma) {
                        values.push(self.parse_expr()?);
                    }
                }
                let span = start.merge(self.previous().span);
                Some(Stmt::Return(values, span))
            }
            TokenType::KwBreak | TokenType::KwContinue | TokenType::KwGoto
            | TokenType::KwFallthrough => {
                let start = self.current().span;
                let kind = match self.current().ty {
                    TokenType::KwBreak => BranchKind::Break,
                    TokenType::KwContinue => BranchKind::Continue,
                    TokenType::KwGoto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                self.advance();
                let label = if self.check(TokenType::Ident) {
                    Some(self.expect_ident())
                } else {
                    None
                };
                Some(Stmt::Branch(kind, label, start))
            }
            TokenType::KwIf => self.if_stmt(),
            TokenType::KwFor => self.for_stmt(),
            TokenType::KwSwitch => self.switch_stmt(),
            TokenType::KwSelect => self.select_stmt(),
            TokenType::LBrace => self.parse_block().map(Stmt::Block),
            TokenType::Semicolon => Some(Stmt::Empty),
            TokenType::Ident if self.peek().ty == TokenType::Colon => {
                let label = self.expect_ident();
                self.advance(); // consume ':'
                self.skip_semis();
                if self.check(TokenType::RBrace) || self.check(TokenType::Eof) {
                    return Some(Stmt::Labeled(label, Box::new(Stmt::Empty)));
                }
                let inner = self.statement()?;
                Some(Stmt::Labeled(label, Box::new(inner)))
            }
            _ => self.simple_stmt(),
        }
    }

    /// Expression statement, send, inc/dec, assignment or short variable
    /// declaration.
    pub(crate) fn simple_stmt(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        let mut lhs = vec![self.parse_expr()?];
        while self.match_token(TokenType::Comma) {
            lhs.push(self.parse_expr()?);
        }

        match self.current().ty {
            TokenType::ColonEq | TokenType::Eq => {
                let define = self.check(TokenType::ColonEq);
                self.advance();
                if self.check(TokenType::KwRange) {
                    // Handled by for_stmt; a bare `x := range y` outside a
                    // for clause is invalid, skip the keyword for recovery.
                    self.advance();
                }
                let mut rhs = vec![self.parse_expr()?];
                while self.match_token(TokenType::Comma) {
                    rhs.push(self.parse_expr()?);
                }
                let span = start.merge(self.previous().span);
                Some(Stmt::Assign(AssignStmt {
                    lhs,
                    rhs,
                    define,
                    span,
                }))
            }
            TokenType::PlusEq
            | TokenType::MinusEq
            | TokenType::StarEq
            | TokenType::SlashEq
            | TokenType::PercentEq
            | TokenType::AmpEq
            | TokenType::PipeEq
            | TokenType::CaretEq
            | TokenType::ShlEq
            | TokenType::ShrEq
            | TokenType::AmpCaretEq => {
                self.advance();
                let rhs = vec![self.parse_expr()?];
                let span = start.merge(self.previous().span);
                Some(Stmt::Assign(AssignStmt {
                    lhs,
                    rhs,
                    define: false,
                    span,
                }))
            }
            TokenType::Arrow => {
                self.advance();
                let value = self.parse_expr()?;
                let ch = lhs.into_iter().next()?;
                Some(Stmt::Send(ch, value))
            }
            TokenType::PlusPlus => {
                self.advance();
                Some(Stmt::IncDec(lhs.into_iter().next()?, true))
            }
            TokenType::MinusMinus => {
                self.advance();
                Some(Stmt::IncDec(lhs.into_iter().next()?, false))
            }
            _ => {
                if lhs.len() > 1 {
                    self.error_here(ParseErrorKind::ExpectedToken {
                        expected: "assignment".into(),
                        found: self.current().ty.as_str().into(),
                    });
                }
                Some(Stmt::Expr(lhs.into_iter().next()?))
            }
        }
    }

    fn if_stmt(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'if'
        let saved = self.allow_composite;
        self.allow_composite = false;

        let mut init = None;
        let mut cond = self.simple_stmt()?;
        if self.match_token(TokenType::Semicolon) {
            init = Some(Box::new(cond));
            cond = self.simple_stmt()?;
        }
        self.allow_composite = saved;

        let cond = match cond {
            Stmt::Expr(expr) => expr,
            other => {
                // `if x := f(); x {` handled above; anything else here is
                // malformed — recover with a placeholder condition.
                self.error_here(ParseErrorKind::ExpectedExpression {
                    found: self.current().ty.as_str().into(),
                });
                init = Some(Box::new(other));
                let span = self.current().span;
                self.expr(ExprKind::Ident(Ident::new("", span)), span)
            }
        };

        let then = self.parse_block()?;
        let else_branch = if self.match_token(TokenType::KwElse) {
            if self.check(TokenType::KwIf) {
                Some(Box::new(self.if_stmt()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_block()?)))
            }
        } else {
            None
        };
        let span = start.merge(self.previous().span);
        Some(Stmt::If(IfStmt {
            init,
            cond,
            then,
            else_branch,
            span,
        }))
    }

    fn for_stmt(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'for'
        let saved = self.allow_composite;
        self.allow_composite = false;

        // `for {`
        if self.check(TokenType::LBrace) {
            self.allow_composite = saved;
            let body = self.parse_block()?;
            let span = start.merge(self.previous().span);
            return Some(Stmt::For(ForStmt {
                init: None,
                cond: None,
                post: None,
                body,
                span,
            }));
        }

        // `for range x {`
        if self.check(TokenType::KwRange) {
            self.advance();
            let expr = self.parse_expr()?;
            self.allow_composite = saved;
            let body = self.parse_block()?;
            let span = start.merge(self.previous().span);
            return Some(Stmt::Range(RangeStmt {
                key: None,
                value: None,
                define: false,
                expr,
                body,
                span,
            }));
        }

        // Detect `for k, v := range x` / `for k = range x`.
        let range_save = self.save();
        if let Some(range_stmt) = self.try_range_clause(start) {
            self.allow_composite = saved;
            return Some(range_stmt);
        }
        self.restore(range_save);

        // `for cond {` or `for init; cond; post {`
        let first = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.simple_stmt()?)
        };

        if self.match_token(TokenType::Semicolon) {
            let cond = if self.check(TokenType::Semicolon) {
                None
            } else {
                match self.simple_stmt()? {
                    Stmt::Expr(expr) => Some(expr),
                    _ => None,
                }
            };
            self.consume(TokenType::Semicolon, ";");
            let post = if self.check(TokenType::LBrace) {
                None
            } else {
                Some(Box::new(self.simple_stmt()?))
            };
            self.allow_composite = saved;
            let body = self.parse_block()?;
            let span = start.merge(self.previous().span);
            return Some(Stmt::For(ForStmt {
                init: first.map(Box::new),
                cond,
                post,
                body,
                span,
            }));
        }

        let cond = match first {
            Some(Stmt::Expr(expr)) => Some(expr),
            _ => None,
        };
        self.allow_composite = saved;
        let body = self.parse_block()?;
        let span = start.merge(self.previous().span);
        Some(Stmt::For(ForStmt {
            init: None,
            cond,
            post: None,
            body,
            span,
        }))
    }

    /// Attempt `k, v := range x {` / `k := range x {` / `k, v = range x {`.
    /// Returns `None` without reporting so the caller can backtrack.
    fn try_range_clause(&mut self, start: crate::frontend::Span) -> Option<Stmt> {
        let key = self.parse_expr()?;
        let value = if self.match_token(TokenType::Comma) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let define = if self.match_token(TokenType::ColonEq) {
            true
        } else if self.match_token(TokenType::Eq) {
            false
        } else {
            return None;
        };
        if !self.match_token(TokenType::KwRange) {
            return None;
        }
        let expr = self.parse_expr()?;
        let saved = self.allow_composite;
        self.allow_composite = true;
        let body = self.parse_block()?;
        self.allow_composite = saved;
        let span = start.merge(self.previous().span);
        Some(Stmt::Range(RangeStmt {
            key: Some(key),
            value,
            define,
            expr,
            body,
            span,
        }))
    }

    fn switch_stmt(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'switch'
        let saved = self.allow_composite;
        self.allow_composite = false;

        let mut init = None;
        let mut tag = None;
        let mut binding = None;
        let mut subject = None;

        if !self.check(TokenType::LBrace) {
            let first = self.simple_stmt()?;
            let first = if self.match_token(TokenType::Semicolon) {
                if self.check(TokenType::LBrace) {
                    init = Some(Box::new(first));
                    None
                } else {
                    init = Some(Box::new(first));
                    Some(self.simple_stmt()?)
                }
            } else {
                Some(first)
            };

            if let Some(stmt) = first {
                match stmt {
                    Stmt::Expr(expr) => {
                        if let ExprKind::TypeAssert(x, None) = &expr.kind {
                            subject = Some((**x).clone());
                        } else {
                            tag = Some(expr);
                        }
                    }
                    Stmt::Assign(assign)
                        if assign.define
                            && assign.lhs.len() == 1
                            && assign.rhs.len() == 1 =>
                    {
                        if let ExprKind::TypeAssert(x, None) = &assign.rhs[0].kind {
                            if let ExprKind::Ident(name) = &assign.lhs[0].kind {
                                binding = Some(name.clone());
                            }
                            subject = Some((**x).clone());
                        }
                    }
                    other => init = Some(Box::new(other)),
                }
            }
        }
        self.allow_composite = saved;

        if let Some(subject) = subject {
            let cases = self.type_switch_cases()?;
            let span = start.merge(self.previous().span);
            return Some(Stmt::TypeSwitch(TypeSwitchStmt {
                init,
                binding,
                subject,
                cases,
                span,
            }));
        }

        let cases = self.switch_cases()?;
        let span = start.merge(self.previous().span);
        Some(Stmt::Switch(SwitchStmt {
            init,
            tag,
            cases,
            span,
        }))
    }

    fn switch_cases(&mut self) -> Option<Vec<CaseClause>> {
        self.consume(TokenType::LBrace, "{");
        self.skip_semis();
        let mut cases = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            let start = self.current().span;
            let mut exprs = Vec::new();
            if self.match_token(TokenType::KwCase) {
                exprs.push(self.parse_expr_composite_ok()?);
                while self.match_token(TokenType::Comma) {
                    exprs.push(self.parse_expr_composite_ok()?);
                }
            } else if !self.match_token(TokenType::KwDefault) {
                self.error_here(ParseErrorKind::ExpectedToken {
                    expected: "case or default".into(),
                    found: self.current().ty.as_str().into(),
                });
                self.recover_until(&[TokenType::RBrace]);
                continue;
            }
            self.consume(TokenType::Colon, ":");
            let body = self.case_body();
            let span = start.merge(self.previous().span);
            cases.push(CaseClause { exprs, body, span });
        }
        self.consume(TokenType::RBrace, "}");
        Some(cases)
    }

    fn type_switch_cases(&mut self) -> Option<Vec<TypeCaseClause>> {
        self.consume(TokenType::LBrace, "{");
        self.skip_semis();
        let mut cases = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            let start = self.current().span;
            let mut types = Vec::new();
            if self.match_token(TokenType::KwCase) {
                types.push(self.parse_type()?);
                while self.match_token(TokenType::Comma) {
                    types.push(self.parse_type()?);
                }
            } else if !self.match_token(TokenType::KwDefault) {
                self.error_here(ParseErrorKind::ExpectedToken {
                    expected: "case or default".into(),
                    found: self.current().ty.as_str().into(),
                });
                self.recover_until(&[TokenType::RBrace]);
                continue;
            }
            self.consume(TokenType::Colon, ":");
            let body = self.case_body();
            let span = start.merge(self.previous().span);
            cases.push(TypeCaseClause { types, body, span });
        }
        self.consume(TokenType::RBrace, "}");
        Some(cases)
    }

    fn select_stmt(&mut self) -> Option<Stmt> {
        let start = self.current().span;
        self.advance(); // consume 'select'
        self.consume(TokenType::LBrace, "{");
        self.skip_semis();
        let mut cases = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            let case_start = self.current().span;
            let comm = if self.match_token(TokenType::KwCase) {
                self.simple_stmt().map(Box::new)
            } else if self.match_token(TokenType::KwDefault) {
                None
            } else {
                self.error_here(ParseErrorKind::ExpectedToken {
                    expected: "case or default".into(),
                    found: self.current().ty.as_str().into(),
                });
                self.recover_until(&[TokenType::RBrace]);
                continue;
            };
            self.consume(TokenType::Colon, ":");
            let body = self.case_body();
            let span = case_start.merge(self.previous().span);
            cases.push(CommClause { comm, body, span });
        }
        self.consume(TokenType::RBrace, "}");
        let span = start.merge(self.previous().span);
        Some(Stmt::Select(SelectStmt { cases, span }))
    }

    fn case_body(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        self.skip_semis();
        while !self.check(TokenType::KwCase)
            && !self.check(TokenType::KwDefault)
            && !self.check(TokenType::RBrace)
            && !self.check(TokenType::Eof)
        {
            match self.statement() {
                Some(stmt) => body.push(stmt),
                None => self.recover_until(&[
                    TokenType::RBrace,
                    TokenType::KwCase,
                    TokenType::KwDefault,
                ]),
            }
            self.skip_semis();
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;

    fn parse_body(source: &str) -> Block {
        let full = format!("package t\n\nfunc f() {}\n", source);
        let (file, errors) = Parser::parse_file(&full, "/tmp/t.go");
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected func");
        };
        func.body.clone().expect("body")
    }

    #[test]
    fn go_and_defer_statements() {
        let body = parse_body("{\n\tgo helper()\n\tdefer cleanup()\n}");
        assert!(matches!(body.stmts[0], Stmt::Go(_)));
        assert!(matches!(body.stmts[1], Stmt::Defer(_)));
    }

    #[test]
    fn if_with_init_and_else() {
        let body = parse_body(
            "{\n\tif err := run(); err != nil {\n\t\thandle(err)\n\t} else {\n\t\tok()\n\t}\n}",
        );
        let Stmt::If(if_stmt) = &body.stmts[0] else {
            panic!("expected if");
        };
        assert!(if_stmt.init.is_some());
        assert!(if_stmt.else_branch.is_some());
    }

    #[test]
    fn if_condition_blocks_composite_literal() {
        // `{` after the condition must open the block, not a literal.
        let body = parse_body("{\n\tif x == limit {\n\t\tstop()\n\t}\n}");
        let Stmt::If(if_stmt) = &body.stmts[0] else {
            panic!("expected if");
        };
        assert_eq!(if_stmt.then.stmts.len(), 1);
    }

    #[test]
    fn three_clause_for() {
        let body = parse_body("{\n\tfor i := 0; i < n; i++ {\n\t\tstep(i)\n\t}\n}");
        let Stmt::For(for_stmt) = &body.stmts[0] else {
            panic!("expected for");
        };
        assert!(for_stmt.init.is_some());
        assert!(for_stmt.cond.is_some());
        assert!(for_stmt.post.is_some());
    }

    #[test]
    fn range_over_map() {
        let body = parse_body("{\n\tfor k, v := range m {\n\t\tuse(k, v)\n\t}\n}");
        let Stmt::Range(range_stmt) = &body.stmts[0] else {
            panic!("expected range");
        };
        assert!(range_stmt.define);
        assert!(range_stmt.value.is_some());
    }

    #[test]
    fn type_switch() {
        let body = parse_body(
            "{\n\tswitch v := x.(type) {\n\tcase io.Reader:\n\t\tread(v)\n\tdefault:\n\t\tskip()\n\t}\n}",
        );
        let Stmt::TypeSwitch(sw) = &body.stmts[0] else {
            panic!("expected type switch");
        };
        assert_eq!(sw.binding.as_ref().unwrap().name, "v");
        assert_eq!(sw.cases.len(), 2);
    }

    #[test]
    fn select_with_send_and_receive() {
        let body = parse_body(
            "{\n\tselect {\n\tcase out <- v:\n\t\tsent()\n\tcase r := <-in:\n\t\tgot(r)\n\tdefault:\n\t}\n}",
        );
        let Stmt::Select(sel) = &body.stmts[0] else {
            panic!("expected select");
        };
        assert_eq!(sel.cases.len(), 3);
        assert!(sel.cases[2].comm.is_none());
    }

    #[test]
    fn short_var_decl_and_multi_assign() {
        let body = parse_body("{\n\ta, b := pair()\n\ta, b = b, a\n}");
        let Stmt::Assign(first) = &body.stmts[0] else {
            panic!("expected assign");
        };
        assert!(first.define);
        assert_eq!(first.lhs.len(), 2);
        let Stmt::Assign(second) = &body.stmts[1] else {
            panic!("expected assign");
        };
        assert!(!second.define);
    }

    #[test]
    fn labeled_loop_with_break() {
        let body = parse_body("{\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n}");
        assert!(matches!(body.stmts[0], Stmt::Labeled(..)));
    }
}
