// src/frontend/parse_type.rs
//! Type-expression parsing: named, qualified, pointer, array/slice, map,
//! channel, function, struct, interface, variadic, parenthesized and
//! instantiated forms.

use crate::errors::parse::ParseErrorKind;
use crate::frontend::ast::*;
use crate::frontend::parser::Parser;
use crate::frontend::TokenType;

impl Parser {
    /// Whether the current token can begin a type expression.
    pub(crate) fn starts_type(&self) -> bool {
        matches!(
            self.current().ty,
            TokenType::Ident
                | TokenType::Star
                | TokenType::LBracket
                | TokenType::LParen
                | TokenType::KwMap
                | TokenType::KwChan
                | TokenType::KwFunc
                | TokenType::KwStruct
                | TokenType::KwInterface
                | TokenType::Arrow
                | TokenType::Ellipsis
                | TokenType::Tilde
        )
    }

    pub(crate) fn parse_type(&mut self) -> Option<TypeExpr> {
        let start = self.current().span;
        match self.current().ty {
            TokenType::Ident => {
                let name = self.expect_ident();
                let mut ty = if self.check(TokenType::Dot) && self.peek().ty == TokenType::Ident {
                    self.advance();
                    let sel = self.expect_ident();
                    let span = start.merge(sel.span);
                    self.type_expr(TypeExprKind::Qualified(name, sel), span)
                } else {
                    let span = name.span;
                    self.type_expr(TypeExprKind::Name(name), span)
                };
                // Generic instantiation: List[T], pkg.Map[K, V]
                if self.check(TokenType::LBracket) {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(TokenType::RBracket) && !self.check(TokenType::Eof) {
                        args.push(self.parse_type()?);
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                    }
                    self.consume(TokenType::RBracket, "]");
                    let span = start.merge(self.previous().span);
                    ty = self.type_expr(TypeExprKind::Instantiated(Box::new(ty), args), span);
                }
                Some(ty)
            }
            TokenType::Star => {
                self.advance();
                let inner = self.parse_type()?;
                let span = start.merge(inner.span);
                Some(self.type_expr(TypeExprKind::Pointer(Box::new(inner)), span))
            }
            TokenType::LBracket => {
                self.advance();
                if self.match_token(TokenType::RBracket) {
                    let elem = self.parse_type()?;
                    let span = start.merge(elem.span);
                    Some(self.type_expr(TypeExprKind::Slice(Box::new(elem)), span))
                } else if self.match_token(TokenType::Ellipsis) {
                    // `[...]T` — length inferred from the literal.
                    self.consume(TokenType::RBracket, "]");
                    let elem = self.parse_type()?;
                    let span = start.merge(elem.span);
                    Some(self.type_expr(TypeExprKind::Slice(Box::new(elem)), span))
                } else {
                    let len = self.parse_expr()?;
                    self.consume(TokenType::RBracket, "]");
                    let elem = self.parse_type()?;
                    let span = start.merge(elem.span);
                    Some(self.type_expr(
                        TypeExprKind::Array(Box::new(len), Box::new(elem)),
                        span,
                    ))
                }
            }
            TokenType::KwMap => {
                self.advance();
                self.consume(TokenType::LBracket, "[");
                let key = self.parse_type()?;
                self.consume(TokenType::RBracket, "]");
                let value = self.parse_type()?;
                let span = start.merge(value.span);
                Some(self.type_expr(
                    TypeExprKind::Map(Box::new(key), Box::new(value)),
                    span,
                ))
            }
            TokenType::KwChan => {
                self.advance();
                let dir = if self.match_token(TokenType::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                let span = start.merge(elem.span);
                Some(self.type_expr(TypeExprKind::Chan(dir, Box::new(elem)), span))
            }
            TokenType::Arrow => {
                self.advance();
                if !self.consume(TokenType::KwChan, "chan") {
                    return None;
                }
                let elem = self.parse_type()?;
                let span = start.merge(elem.span);
                Some(self.type_expr(TypeExprKind::Chan(ChanDir::Recv, Box::new(elem)), span))
            }
            TokenType::KwFunc => {
                self.advance();
                let sig = self.func_sig()?;
                let span = start.merge(self.previous().span);
                Some(self.type_expr(TypeExprKind::Func(Box::new(sig)), span))
            }
            TokenType::KwStruct => {
                self.advance();
                let fields = self.struct_body()?;
                let span = start.merge(self.previous().span);
                Some(self.type_expr(TypeExprKind::Struct(fields), span))
            }
            TokenType::KwInterface => {
                self.advance();
                let elems = self.interface_body()?;
                let span = start.merge(self.previous().span);
                Some(self.type_expr(TypeExprKind::Interface(elems), span))
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_type()?;
                self.consume(TokenType::RParen, ")");
                let span = start.merge(self.previous().span);
                Some(self.type_expr(TypeExprKind::Paren(Box::new(inner)), span))
            }
            TokenType::Ellipsis => {
                self.advance();
                let inner = self.parse_type()?;
                let span = start.merge(inner.span);
                Some(self.type_expr(TypeExprKind::Variadic(Box::new(inner)), span))
            }
            TokenType::Tilde => {
                self.advance();
                let inner = self.parse_type()?;
                let span = start.merge(inner.span);
                Some(self.type_expr(TypeExprKind::Approx(Box::new(inner)), span))
            }
            _ => {
                self.error_here(ParseErrorKind::ExpectedType {
                    found: self.current().ty.as_str().into(),
                });
                None
            }
        }
    }

    /// Parse `(params) results` after the `func` keyword or a method name.
    pub(crate) fn func_sig(&mut self) -> Option<FuncSig> {
        let start = self.current().span;
        if !self.consume(TokenType::LParen, "(") {
            return None;
        }
        let params = self.param_list()?;
        self.consume(TokenType::RParen, ")");

        let results = if self.check(TokenType::LParen) {
            self.advance();
            let list = self.param_list()?;
            self.consume(TokenType::RParen, ")");
            list
        } else if self.starts_result_type() {
            let ty = self.parse_type()?;
            let span = ty.span;
            vec![Field {
                doc: String::new(),
                names: Vec::new(),
                ty,
                span,
            }]
        } else {
            Vec::new()
        };

        let span = start.merge(self.previous().span);
        Some(FuncSig {
            params,
            results,
            span,
        })
    }

    /// Like `starts_type`, but `(` opens a result list, not a paren type,
    /// and `...`/`~` never begin a result.
    fn starts_result_type(&self) -> bool {
        matches!(
            self.current().ty,
            TokenType::Ident
                | TokenType::Star
                | TokenType::LBracket
                | TokenType::KwMap
                | TokenType::KwChan
                | TokenType::KwFunc
                | TokenType::KwStruct
                | TokenType::KwInterface
                | TokenType::Arrow
        )
    }

    /// Parameter (or parenthesized result) list body. Go allows either
    /// all-named groups (`a, b int, c string`) or all-unnamed types
    /// (`int, string`); elements are parsed as types first and reread as
    /// names when a type follows them.
    fn param_list(&mut self) -> Option<Vec<Field>> {
        let mut fields: Vec<Field> = Vec::new();
        let mut pending: Vec<TypeExpr> = Vec::new();

        loop {
            if self.check(TokenType::RParen) || self.check(TokenType::Eof) {
                break;
            }
            let elem = self.parse_type()?;
            if self.check(TokenType::Comma) {
                self.advance();
                pending.push(elem);
                continue;
            }
            if self.check(TokenType::RParen) || self.check(TokenType::Eof) {
                pending.push(elem);
                break;
            }
            // A type follows: the pending elements and `elem` were names.
            let ty = self.parse_type()?;
            let mut names = Vec::new();
            for name_elem in pending.drain(..).chain(std::iter::once(elem)) {
                names.push(self.type_as_ident(name_elem));
            }
            let span = names
                .first()
                .map(|n| n.span.merge(ty.span))
                .unwrap_or(ty.span);
            fields.push(Field {
                doc: String::new(),
                names,
                ty,
                span,
            });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        for elem in pending {
            let span = elem.span;
            fields.push(Field {
                doc: String::new(),
                names: Vec::new(),
                ty: elem,
                span,
            });
        }
        Some(fields)
    }

    fn type_as_ident(&mut self, ty: TypeExpr) -> Ident {
        match ty.kind {
            TypeExprKind::Name(ident) => ident,
            _ => {
                self.error_here(ParseErrorKind::ExpectedIdentifier {
                    found: ty.kind_name().into(),
                });
                Ident::new("", ty.span)
            }
        }
    }

    /// `struct { ... }` body after the keyword.
    fn struct_body(&mut self) -> Option<Vec<Field>> {
        if !self.consume(TokenType::LBrace, "{") {
            return None;
        }
        self.skip_semis();
        let mut fields = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            let doc = self.doc_before(self.current().span.line);
            let start = self.current().span;

            // Try `name1, name2 Type`; fall back to an embedded field.
            let save = self.save();
            let mut names = Vec::new();
            let mut named = false;
            if self.check(TokenType::Ident) {
                names.push(self.expect_ident());
                while self.match_token(TokenType::Comma) {
                    if self.check(TokenType::Ident) {
                        names.push(self.expect_ident());
                    } else {
                        break;
                    }
                }
                named = self.starts_type() && !self.check(TokenType::Tilde);
            }

            let field = if named {
                let ty = self.parse_type()?;
                let span = start.merge(ty.span);
                Field {
                    doc,
                    names,
                    ty,
                    span,
                }
            } else {
                self.restore(save);
                let ty = if self.match_token(TokenType::Star) {
                    let inner = self.parse_type()?;
                    let span = start.merge(inner.span);
                    self.type_expr(TypeExprKind::Pointer(Box::new(inner)), span)
                } else {
                    self.parse_type()?
                };
                let span = start.merge(ty.span);
                Field {
                    doc,
                    names: Vec::new(),
                    ty,
                    span,
                }
            };
            fields.push(field);

            // Optional struct tag.
            if self.check(TokenType::StringLit) {
                self.advance();
            }
            self.expect_semi();
        }
        self.consume(TokenType::RBrace, "}");
        Some(fields)
    }

    /// `interface { ... }` body after the keyword. Elements are methods
    /// (`Name(params) results`) or embedded interfaces / constraint
    /// elements (no names).
    fn interface_body(&mut self) -> Option<Vec<Field>> {
        if !self.consume(TokenType::LBrace, "{") {
            return None;
        }
        self.skip_semis();
        let mut elems = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            let doc = self.doc_before(self.current().span.line);
            let start = self.current().span;

            if self.check(TokenType::Ident) && self.peek().ty == TokenType::LParen {
                // Method element.
                let name = self.expect_ident();
                let sig = self.func_sig()?;
                let span = start.merge(self.previous().span);
                let ty = self.type_expr(TypeExprKind::Func(Box::new(sig)), span);
                elems.push(Field {
                    doc,
                    names: vec![name],
                    ty,
                    span,
                });
            } else {
                // Embedded interface or constraint element; union terms
                // become separate embed entries.
                let first = self.parse_type()?;
                let span = start.merge(first.span);
                elems.push(Field {
                    doc,
                    names: Vec::new(),
                    ty: first,
                    span,
                });
                while self.match_token(TokenType::Pipe) {
                    let term = self.parse_type()?;
                    let span = term.span;
                    elems.push(Field {
                        doc: String::new(),
                        names: Vec::new(),
                        ty: term,
                        span,
                    });
                }
            }
            self.expect_semi();
        }
        self.consume(TokenType::RBrace, "}");
        Some(elems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;

    fn parse_type_str(source: &str) -> TypeExpr {
        let mut parser = Parser::new(source);
        parser.parse_type().expect("type should parse")
    }

    #[test]
    fn parses_basic_type_forms() {
        assert!(matches!(parse_type_str("int").kind, TypeExprKind::Name(_)));
        assert!(matches!(
            parse_type_str("io.Reader").kind,
            TypeExprKind::Qualified(..)
        ));
        assert!(matches!(
            parse_type_str("*Buffer").kind,
            TypeExprKind::Pointer(_)
        ));
        assert!(matches!(
            parse_type_str("[]string").kind,
            TypeExprKind::Slice(_)
        ));
        assert!(matches!(
            parse_type_str("[8]byte").kind,
            TypeExprKind::Array(..)
        ));
        assert!(matches!(
            parse_type_str("map[string]int").kind,
            TypeExprKind::Map(..)
        ));
    }

    #[test]
    fn parses_chan_directions() {
        let TypeExprKind::Chan(dir, _) = parse_type_str("chan int").kind else {
            panic!("expected chan");
        };
        assert_eq!(dir, ChanDir::Both);
        let TypeExprKind::Chan(dir, _) = parse_type_str("chan<- int").kind else {
            panic!("expected chan");
        };
        assert_eq!(dir, ChanDir::Send);
        let TypeExprKind::Chan(dir, _) = parse_type_str("<-chan int").kind else {
            panic!("expected chan");
        };
        assert_eq!(dir, ChanDir::Recv);
    }

    #[test]
    fn parses_func_type_with_results() {
        let ty = parse_type_str("func(a, b int, opts ...string) (int, error)");
        let TypeExprKind::Func(sig) = ty.kind else {
            panic!("expected func type");
        };
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.params[0].names.len(), 2);
        assert!(matches!(
            sig.params[1].ty.kind,
            TypeExprKind::Variadic(_)
        ));
        assert_eq!(sig.results.len(), 2);
    }

    #[test]
    fn unnamed_param_list() {
        let ty = parse_type_str("func(int, string) error");
        let TypeExprKind::Func(sig) = ty.kind else {
            panic!("expected func type");
        };
        assert_eq!(sig.params.len(), 2);
        assert!(sig.params.iter().all(|p| p.names.is_empty()));
        assert_eq!(sig.results.len(), 1);
    }

    #[test]
    fn struct_with_embedded_fields() {
        let ty = parse_type_str("struct {\n\tio.Reader\n\t*Buffer\n\tName string `json:\"name\"`\n}");
        let TypeExprKind::Struct(fields) = ty.kind else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 3);
        assert!(fields[0].names.is_empty());
        assert!(fields[1].names.is_empty());
        assert_eq!(fields[2].names[0].name, "Name");
    }

    #[test]
    fn interface_with_methods_and_embeds() {
        let ty = parse_type_str(
            "interface {\n\tio.Reader\n\t// Close shuts down.\n\tClose() error\n}",
        );
        let TypeExprKind::Interface(elems) = ty.kind else {
            panic!("expected interface");
        };
        assert_eq!(elems.len(), 2);
        assert!(elems[0].names.is_empty());
        assert_eq!(elems[1].names[0].name, "Close");
        assert_eq!(elems[1].doc, "Close shuts down.");
    }

    #[test]
    fn generic_instantiation_type() {
        let ty = parse_type_str("List[int]");
        assert!(matches!(ty.kind, TypeExprKind::Instantiated(..)));
    }
}
