// src/frontend/parse_expr.rs
//! Expression parsing: precedence climbing over Go's operator table,
//! with suffix handling for selectors, calls, indexing, slicing, type
//! assertions and composite literals.

use crate::errors::parse::ParseErrorKind;
use crate::frontend::ast::*;
use crate::frontend::parser::{string_value, Parser};
use crate::frontend::TokenType;

fn binary_op(ty: TokenType) -> Option<(BinaryOp, u8)> {
    use TokenType::*;
    Some(match ty {
        PipePipe => (BinaryOp::LogicalOr, 1),
        AmpAmp => (BinaryOp::LogicalAnd, 2),
        EqEq => (BinaryOp::Eq, 3),
        BangEq => (BinaryOp::NotEq, 3),
        Lt => (BinaryOp::Lt, 3),
        LtEq => (BinaryOp::LtEq, 3),
        Gt => (BinaryOp::Gt, 3),
        GtEq => (BinaryOp::GtEq, 3),
        Plus => (BinaryOp::Add, 4),
        Minus => (BinaryOp::Sub, 4),
        Pipe => (BinaryOp::Or, 4),
        Caret => (BinaryOp::Xor, 4),
        Star => (BinaryOp::Mul, 5),
        Slash => (BinaryOp::Div, 5),
        Percent => (BinaryOp::Rem, 5),
        Shl => (BinaryOp::Shl, 5),
        Shr => (BinaryOp::Shr, 5),
        Amp => (BinaryOp::And, 5),
        AmpCaret => (BinaryOp::AndNot, 5),
        _ => return None,
    })
}

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.binary_expr(0)
    }

    /// Parse an expression with composite literals permitted regardless
    /// of the surrounding control-clause restriction (inside parens and
    /// brackets the ambiguity disappears).
    pub(crate) fn parse_expr_composite_ok(&mut self) -> Option<Expr> {
        let saved = self.allow_composite;
        self.allow_composite = true;
        let result = self.parse_expr();
        self.allow_composite = saved;
        result
    }

    fn binary_expr(&mut self, min_prec: u8) -> Option<Expr> {
        let mut lhs = self.unary_expr()?;
        while let Some((op, prec)) = binary_op(self.current().ty) {
            if prec <= min_prec {
                break;
            }
            self.advance();
            let rhs = self.binary_expr(prec)?;
            let span = lhs.span.merge(rhs.span);
            lhs = self.expr(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
        Some(lhs)
    }

    fn unary_expr(&mut self) -> Option<Expr> {
        let start = self.current().span;
        let op = match self.current().ty {
            TokenType::Minus => Some(UnaryOp::Neg),
            TokenType::Plus => Some(UnaryOp::Pos),
            TokenType::Bang => Some(UnaryOp::Not),
            TokenType::Caret => Some(UnaryOp::BitNot),
            TokenType::Amp => Some(UnaryOp::Addr),
            TokenType::Arrow => {
                // `<-chan T` in expression position is a type.
                if self.peek().ty == TokenType::KwChan {
                    let ty = self.parse_type()?;
                    let span = ty.span;
                    return Some(self.expr(ExprKind::TypeAsExpr(Box::new(ty)), span));
                }
                Some(UnaryOp::Recv)
            }
            TokenType::Star => {
                self.advance();
                let inner = self.unary_expr()?;
                let span = start.merge(inner.span);
                return Some(self.expr(ExprKind::Star(Box::new(inner)), span));
            }
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let inner = self.unary_expr()?;
            let span = start.merge(inner.span);
            return Some(self.expr(ExprKind::Unary(op, Box::new(inner)), span));
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> Option<Expr> {
        let mut expr = self.operand()?;
        loop {
            match self.current().ty {
                TokenType::Dot => {
                    if self.peek().ty == TokenType::LParen {
                        // Type assertion: x.(T) or x.(type)
                        self.advance();
                        self.advance();
                        let ty = if self.check(TokenType::KwType) {
                            self.advance();
                            None
                        } else {
                            Some(Box::new(self.parse_type()?))
                        };
                        self.consume(TokenType::RParen, ")");
                        let span = expr.span.merge(self.previous().span);
                        expr = self.expr(ExprKind::TypeAssert(Box::new(expr), ty), span);
                    } else {
                        self.advance();
                        let sel = self.expect_ident();
                        let span = expr.span.merge(sel.span);
                        expr = self.expr(ExprKind::Selector(Box::new(expr), sel), span);
                    }
                }
                TokenType::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    let mut ellipsis = false;
                    while !self.check(TokenType::RParen) && !self.check(TokenType::Eof) {
                        let arg = self.call_arg()?;
                        args.push(arg);
                        if self.match_token(TokenType::Ellipsis) {
                            ellipsis = true;
                        }
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                        self.skip_semis();
                    }
                    self.consume(TokenType::RParen, ")");
                    let span = expr.span.merge(self.previous().span);
                    let call = CallExpr {
                        fun: Box::new(expr),
                        args,
                        ellipsis,
                        span,
                    };
                    expr = self.expr(ExprKind::Call(call), span);
                }
                TokenType::LBracket => {
                    self.advance();
                    expr = self.index_or_slice(expr)?;
                }
                TokenType::LBrace if self.allow_composite && can_start_composite(&expr) => {
                    let ty = expr_to_type(&expr);
                    match ty {
                        Some(ty) => {
                            let elems = self.composite_body()?;
                            let span = expr.span.merge(self.previous().span);
                            expr = self.expr(
                                ExprKind::CompositeLit(Some(Box::new(ty)), elems),
                                span,
                            );
                        }
                        None => break,
                    }
                }
                _ => break,
            }
        }
        Some(expr)
    }

    /// A call argument may be a type (`make([]int, 4)`, conversions).
    fn call_arg(&mut self) -> Option<Expr> {
        if matches!(
            self.current().ty,
            TokenType::LBracket
                | TokenType::KwMap
                | TokenType::KwChan
                | TokenType::KwStruct
                | TokenType::KwInterface
        ) {
            let saved = self.allow_composite;
            self.allow_composite = true;
            let result = self.type_led_operand();
            self.allow_composite = saved;
            return result;
        }
        self.parse_expr_composite_ok()
    }

    fn index_or_slice(&mut self, base: Expr) -> Option<Expr> {
        // Already past `[`.
        let mut lo = None;
        if !self.check(TokenType::Colon) {
            lo = Some(Box::new(self.index_arg()?));
        }
        if self.match_token(TokenType::Colon) {
            let mut hi = None;
            let mut max = None;
            if !self.check(TokenType::RBracket) && !self.check(TokenType::Colon) {
                hi = Some(Box::new(self.parse_expr_composite_ok()?));
            }
            if self.match_token(TokenType::Colon) && !self.check(TokenType::RBracket) {
                max = Some(Box::new(self.parse_expr_composite_ok()?));
            }
            self.consume(TokenType::RBracket, "]");
            let span = base.span.merge(self.previous().span);
            return Some(self.expr(ExprKind::Slice(Box::new(base), [lo, hi, max]), span));
        }

        // Plain index or generic instantiation list.
        let mut indices = vec![*lo?];
        while self.match_token(TokenType::Comma) {
            if self.check(TokenType::RBracket) {
                break;
            }
            indices.push(self.index_arg()?);
        }
        self.consume(TokenType::RBracket, "]");
        let span = base.span.merge(self.previous().span);
        Some(self.expr(ExprKind::Index(Box::new(base), indices), span))
    }

    /// Index arguments can be types (`f[int]`, `m[[]string{}]` is not a
    /// thing, but `Map[string, int]{}` is).
    fn index_arg(&mut self) -> Option<Expr> {
        if matches!(
            self.current().ty,
            TokenType::LBracket
                | TokenType::KwMap
                | TokenType::KwChan
                | TokenType::KwStruct
                | TokenType::KwInterface
                | TokenType::KwFunc
                | TokenType::Star
        ) {
            let save = self.save();
            if let Some(ty) = self.parse_type() {
                if self.check(TokenType::Comma) || self.check(TokenType::RBracket) {
                    let span = ty.span;
                    return Some(self.expr(ExprKind::TypeAsExpr(Box::new(ty)), span));
                }
            }
            self.restore(save);
        }
        self.parse_expr_composite_ok()
    }

    fn operand(&mut self) -> Option<Expr> {
        let start = self.current().span;
        match self.current().ty {
            TokenType::Ident => {
                let tok = self.advance_token();
                let ident = Ident::new(tok.lexeme, tok.span);
                let span = ident.span;
                Some(self.expr(ExprKind::Ident(ident), span))
            }
            TokenType::IntLit => {
                let tok = self.advance_token();
                Some(self.expr(ExprKind::IntLit(tok.lexeme), tok.span))
            }
            TokenType::FloatLit => {
                let tok = self.advance_token();
                Some(self.expr(ExprKind::FloatLit(tok.lexeme), tok.span))
            }
            TokenType::ImagLit => {
                let tok = self.advance_token();
                Some(self.expr(ExprKind::ImagLit(tok.lexeme), tok.span))
            }
            TokenType::RuneLit => {
                let tok = self.advance_token();
                Some(self.expr(ExprKind::RuneLit(tok.lexeme), tok.span))
            }
            TokenType::StringLit => {
                let tok = self.advance_token();
                let value = string_value(&tok.lexeme);
                Some(self.expr(ExprKind::StringLit(value), tok.span))
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expr_composite_ok()?;
                self.consume(TokenType::RParen, ")");
                let span = start.merge(self.previous().span);
                Some(self.expr(ExprKind::Paren(Box::new(inner)), span))
            }
            TokenType::KwFunc => {
                self.advance();
                let sig = self.func_sig()?;
                if self.check(TokenType::LBrace) {
                    let body = self.parse_block()?;
                    let span = start.merge(self.previous().span);
                    Some(self.expr(ExprKind::FuncLit(Box::new(sig), Box::new(body)), span))
                } else {
                    let span = start.merge(self.previous().span);
                    let ty = self.type_expr(TypeExprKind::Func(Box::new(sig)), span);
                    Some(self.expr(ExprKind::TypeAsExpr(Box::new(ty)), span))
                }
            }
            TokenType::LBracket
            | TokenType::KwMap
            | TokenType::KwChan
            | TokenType::KwStruct
            | TokenType::KwInterface => self.type_led_operand(),
            _ => {
                self.error_here(ParseErrorKind::ExpectedExpression {
                    found: self.current().ty.as_str().into(),
                });
                None
            }
        }
    }

    /// An operand that begins with a token that can only start a type:
    /// a conversion (`[]byte(s)`) or composite literal (`map[K]V{...}`).
    fn type_led_operand(&mut self) -> Option<Expr> {
        let ty = self.parse_type()?;
        let span = ty.span;
        Some(self.expr(ExprKind::TypeAsExpr(Box::new(ty)), span))
    }

    /// Composite literal body `{ elem, ... }`, already at `{`.
    fn composite_body(&mut self) -> Option<Vec<Expr>> {
        self.consume(TokenType::LBrace, "{");
        self.skip_semis();
        let mut elems = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            let elem = self.composite_elem()?;
            elems.push(elem);
            if !self.match_token(TokenType::Comma) {
                self.skip_semis();
                break;
            }
            self.skip_semis();
        }
        self.consume(TokenType::RBrace, "}");
        Some(elems)
    }

    fn composite_elem(&mut self) -> Option<Expr> {
        let start = self.current().span;
        let key_or_value = if self.check(TokenType::LBrace) {
            // Nested literal with elided type.
            let elems = self.composite_body()?;
            let span = start.merge(self.previous().span);
            self.expr(ExprKind::CompositeLit(None, elems), span)
        } else {
            self.parse_expr_composite_ok()?
        };
        if self.match_token(TokenType::Colon) {
            let value = if self.check(TokenType::LBrace) {
                let vstart = self.current().span;
                let elems = self.composite_body()?;
                let span = vstart.merge(self.previous().span);
                self.expr(ExprKind::CompositeLit(None, elems), span)
            } else {
                self.parse_expr_composite_ok()?
            };
            let span = key_or_value.span.merge(value.span);
            return Some(self.expr(
                ExprKind::KeyValue(Box::new(key_or_value), Box::new(value)),
                span,
            ));
        }
        Some(key_or_value)
    }
}

/// Whether an already-parsed primary can be the type of a composite
/// literal: `T{}`, `pkg.T{}`, `List[int]{}`, `[]T{}` and friends.
fn can_start_composite(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Ident(_) => true,
        ExprKind::Selector(base, _) => matches!(base.unparen().kind, ExprKind::Ident(_)),
        ExprKind::Index(base, _) => can_start_composite(base),
        ExprKind::TypeAsExpr(ty) => matches!(
            ty.unparen().kind,
            TypeExprKind::Slice(_)
                | TypeExprKind::Array(..)
                | TypeExprKind::Map(..)
                | TypeExprKind::Struct(_)
                | TypeExprKind::Name(_)
                | TypeExprKind::Qualified(..)
                | TypeExprKind::Instantiated(..)
        ),
        _ => false,
    }
}

/// Reinterpret an expression as the type of a composite literal.
fn expr_to_type(expr: &Expr) -> Option<TypeExpr> {
    match &expr.kind {
        ExprKind::Ident(ident) => Some(TypeExpr {
            id: expr.id,
            kind: TypeExprKind::Name(ident.clone()),
            span: expr.span,
        }),
        ExprKind::Selector(base, sel) => match &base.unparen().kind {
            ExprKind::Ident(pkg) => Some(TypeExpr {
                id: expr.id,
                kind: TypeExprKind::Qualified(pkg.clone(), sel.clone()),
                span: expr.span,
            }),
            _ => None,
        },
        ExprKind::Index(base, args) => {
            let base_ty = expr_to_type(base)?;
            let arg_types: Vec<TypeExpr> = args
                .iter()
                .filter_map(|arg| match &arg.kind {
                    ExprKind::TypeAsExpr(ty) => Some((**ty).clone()),
                    ExprKind::Ident(ident) => Some(TypeExpr {
                        id: arg.id,
                        kind: TypeExprKind::Name(ident.clone()),
                        span: arg.span,
                    }),
                    ExprKind::Selector(b, sel) => match &b.unparen().kind {
                        ExprKind::Ident(pkg) => Some(TypeExpr {
                            id: arg.id,
                            kind: TypeExprKind::Qualified(pkg.clone(), sel.clone()),
                            span: arg.span,
                        }),
                        _ => None,
                    },
                    _ => None,
                })
                .collect();
            Some(TypeExpr {
                id: expr.id,
                kind: TypeExprKind::Instantiated(Box::new(base_ty), arg_types),
                span: expr.span,
            })
        }
        ExprKind::TypeAsExpr(ty) => Some((**ty).clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;

    fn parse_expr_str(source: &str) -> Expr {
        let mut parser = Parser::new(source);
        parser.parse_expr().expect("expression should parse")
    }

    #[test]
    fn precedence_mul_over_add() {
        let expr = parse_expr_str("a + b*c");
        let ExprKind::Binary(BinaryOp::Add, _, rhs) = expr.kind else {
            panic!("expected add at the top");
        };
        assert!(matches!(rhs.kind, ExprKind::Binary(BinaryOp::Mul, ..)));
    }

    #[test]
    fn call_with_selector() {
        let expr = parse_expr_str("w.Flush()");
        let ExprKind::Call(call) = expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(call.fun.kind, ExprKind::Selector(..)));
    }

    #[test]
    fn composite_literal_with_keys() {
        let expr = parse_expr_str("Config{Name: \"x\", Count: 3}");
        let ExprKind::CompositeLit(Some(ty), elems) = expr.kind else {
            panic!("expected composite literal");
        };
        assert!(matches!(ty.kind, TypeExprKind::Name(_)));
        assert_eq!(elems.len(), 2);
    }

    #[test]
    fn slice_conversion_call() {
        let expr = parse_expr_str("[]byte(s)");
        let ExprKind::Call(call) = expr.kind else {
            panic!("expected conversion call shape");
        };
        assert!(matches!(call.fun.kind, ExprKind::TypeAsExpr(_)));
    }

    #[test]
    fn address_of_composite() {
        let expr = parse_expr_str("&Server{}");
        let ExprKind::Unary(UnaryOp::Addr, inner) = expr.kind else {
            panic!("expected address-of");
        };
        assert!(matches!(inner.kind, ExprKind::CompositeLit(..)));
    }

    #[test]
    fn func_literal() {
        let expr = parse_expr_str("func(x int) int { return x }");
        assert!(matches!(expr.kind, ExprKind::FuncLit(..)));
    }

    #[test]
    fn type_assertion() {
        let expr = parse_expr_str("v.(io.Reader)");
        let ExprKind::TypeAssert(_, Some(ty)) = expr.kind else {
            panic!("expected type assertion");
        };
        assert!(matches!(ty.kind, TypeExprKind::Qualified(..)));
    }

    #[test]
    fn generic_call() {
        let expr = parse_expr_str("Map[int](xs)");
        let ExprKind::Call(call) = expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(call.fun.kind, ExprKind::Index(..)));
    }

    #[test]
    fn channel_receive() {
        let expr = parse_expr_str("<-done");
        assert!(matches!(expr.kind, ExprKind::Unary(UnaryOp::Recv, _)));
    }
}
