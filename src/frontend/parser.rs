// src/frontend/parser.rs
//! Recursive-descent parser for the Go subset the analyses observe.
//!
//! The parser is tolerant: errors are collected and statements are
//! re-synchronized at the next semicolon or closing brace, so one bad
//! construct does not discard a file.

use crate::errors::parse::{ParseError, ParseErrorKind};
use crate::frontend::ast::*;
use crate::frontend::{Comment, Lexer, Span, Token, TokenType};
use std::path::PathBuf;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    comments: Vec<Comment>,
    errors: Vec<ParseError>,
    next_node: u32,
    /// Composite literals are not allowed at the top level of control
    /// clause expressions (`if x == T{}` would otherwise be ambiguous).
    pub(crate) allow_composite: bool,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.ty == TokenType::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        let mut comments = lexer.take_comments();
        comments.retain(|c| !c.trailing);
        let errors = lexer.take_errors();
        Self {
            tokens,
            pos: 0,
            comments,
            errors,
            next_node: 0,
            allow_composite: true,
        }
    }

    /// Parse one source file. Always returns a `File`; parse problems are
    /// reported through the error list.
    pub fn parse_file(source: &str, path: impl Into<PathBuf>) -> (File, Vec<ParseError>) {
        let path = path.into();
        let mut parser = Parser::new(source);
        let file = parser.file(path.clone());
        let errors = parser
            .errors
            .into_iter()
            .map(|e| e.with_file(path.clone()))
            .collect();
        (file, errors)
    }

    fn file(&mut self, path: PathBuf) -> File {
        self.skip_semis();
        let package_doc = self.doc_before(self.current().span.line);
        let mut package = Ident::new("", Span::default());
        if self.check(TokenType::KwPackage) {
            self.advance();
            package = self.expect_ident();
        } else {
            self.error_here(ParseErrorKind::MissingPackageClause);
        }
        self.expect_semi();

        let mut imports = Vec::new();
        while self.check(TokenType::KwImport) {
            self.advance();
            if self.match_token(TokenType::LParen) {
                self.skip_semis();
                while !self.check(TokenType::RParen) && !self.check(TokenType::Eof) {
                    match self.import_spec() {
                        Some(spec) => imports.push(spec),
                        None => self.recover_until(&[TokenType::RParen]),
                    }
                    self.expect_semi();
                }
                self.consume(TokenType::RParen, ")");
            } else if let Some(spec) = self.import_spec() {
                imports.push(spec);
            }
            self.expect_semi();
        }

        let mut decls = Vec::new();
        while !self.check(TokenType::Eof) {
            match self.declaration() {
                Some(decl) => decls.push(decl),
                None => self.recover_until(&[]),
            }
            self.skip_semis();
        }

        File {
            path,
            package,
            package_doc,
            imports,
            decls,
        }
    }

    fn import_spec(&mut self) -> Option<ImportSpec> {
        let start = self.current().span;
        let alias = if self.check(TokenType::Ident) {
            Some(self.expect_ident())
        } else if self.check(TokenType::Dot) {
            let span = self.current().span;
            self.advance();
            Some(Ident::new(".", span))
        } else {
            None
        };
        if !self.check(TokenType::StringLit) {
            self.error_here(ParseErrorKind::ExpectedToken {
                expected: "import path".into(),
                found: self.current().ty.as_str().into(),
            });
            return None;
        }
        let tok = self.advance_token();
        let path = string_value(&tok.lexeme);
        Some(ImportSpec {
            alias,
            path,
            span: start.merge(tok.span),
        })
    }

    pub(crate) fn declaration(&mut self) -> Option<Decl> {
        match self.current().ty {
            TokenType::KwType => self.type_decl().map(Decl::Type),
            TokenType::KwFunc => self.func_decl().map(Decl::Func),
            TokenType::KwVar => self.value_decl().map(Decl::Var),
            TokenType::KwConst => self.value_decl().map(Decl::Const),
            _ => {
                self.error_here(ParseErrorKind::ExpectedToken {
                    expected: "declaration".into(),
                    found: self.current().ty.as_str().into(),
                });
                None
            }
        }
    }

    fn type_decl(&mut self) -> Option<TypeDecl> {
        let start = self.current().span;
        self.advance(); // consume 'type'
        let mut specs = Vec::new();
        if self.match_token(TokenType::LParen) {
            self.skip_semis();
            while !self.check(TokenType::RParen) && !self.check(TokenType::Eof) {
                match self.type_spec() {
                    Some(spec) => specs.push(spec),
                    None => self.recover_until(&[TokenType::RParen]),
                }
                self.expect_semi();
            }
            self.consume(TokenType::RParen, ")");
        } else if let Some(spec) = self.type_spec() {
            specs.push(spec);
        }
        let span = start.merge(self.previous().span);
        Some(TypeDecl { specs, span })
    }

    fn type_spec(&mut self) -> Option<TypeSpec> {
        let doc = self.doc_before(self.current().span.line);
        let name = self.expect_ident();
        if name.name.is_empty() {
            return None;
        }
        let start = name.span;

        // `[` after the name is ambiguous: type parameters of a generic
        // type, or an array/slice type. Try type parameters first and
        // fall back on failure.
        let mut type_params = Vec::new();
        if self.check(TokenType::LBracket) {
            let save = self.save();
            if let Some(params) = self.try_type_params() {
                if self.starts_type() || self.check(TokenType::Eq) {
                    type_params = params;
                } else {
                    self.restore(save);
                }
            } else {
                self.restore(save);
            }
        }

        let is_alias = self.match_token(TokenType::Eq);
        let ty = self.parse_type()?;
        let span = start.merge(ty.span);
        Some(TypeSpec {
            doc,
            name,
            type_params,
            is_alias,
            ty,
            span,
        })
    }

    fn func_decl(&mut self) -> Option<FuncDecl> {
        let start = self.current().span;
        let doc = self.doc_before(start.line);
        self.advance(); // consume 'func'

        let recv = if self.check(TokenType::LParen) {
            self.receiver()
        } else {
            None
        };

        let name = self.expect_ident();

        let mut type_params = Vec::new();
        if self.check(TokenType::LBracket) {
            let save = self.save();
            match self.try_type_params() {
                Some(params) if self.check(TokenType::LParen) => type_params = params,
                _ => self.restore(save),
            }
        }

        let sig = self.func_sig()?;
        let body = if self.check(TokenType::LBrace) {
            self.parse_block()
        } else {
            None
        };
        let span = start.merge(self.previous().span);
        Some(FuncDecl {
            doc,
            recv,
            name,
            type_params,
            sig,
            body,
            span,
        })
    }

    /// Parse `(name *Base)` / `(Base)` receiver forms. Type parameters on
    /// the receiver base (`(r List[T])`) are consumed and dropped.
    fn receiver(&mut self) -> Option<Receiver> {
        let start = self.current().span;
        self.consume(TokenType::LParen, "(");
        let (name, is_pointer, base) = if self.match_token(TokenType::Star) {
            // `(*T)` — unnamed pointer receiver
            let base = self.expect_ident();
            (None, true, base)
        } else {
            let first = self.expect_ident();
            if self.check(TokenType::RParen) {
                // `(T)` — unnamed value receiver
                (None, false, first)
            } else if self.match_token(TokenType::Star) {
                let base = self.expect_ident();
                (Some(first), true, base)
            } else if self.check(TokenType::Ident) {
                let base = self.expect_ident();
                (Some(first), false, base)
            } else {
                (None, false, first)
            }
        };
        if self.match_token(TokenType::LBracket) {
            let mut depth = 1usize;
            while depth > 0 && !self.check(TokenType::Eof) {
                match self.current().ty {
                    TokenType::LBracket => depth += 1,
                    TokenType::RBracket => depth -= 1,
                    _ => {}
                }
                self.advance();
            }
        }
        self.consume(TokenType::RParen, ")");
        Some(Receiver {
            name,
            is_pointer,
            base,
            span: start.merge(self.previous().span),
        })
    }

    fn value_decl(&mut self) -> Option<ValueDecl> {
        let start = self.current().span;
        let doc = self.doc_before(start.line);
        let directives = self.directives_before(start.line);
        self.advance(); // consume 'var' / 'const'
        let mut specs = Vec::new();
        if self.match_token(TokenType::LParen) {
            self.skip_semis();
            while !self.check(TokenType::RParen) && !self.check(TokenType::Eof) {
                match self.value_spec() {
                    Some(spec) => specs.push(spec),
                    None => self.recover_until(&[TokenType::RParen]),
                }
                self.expect_semi();
            }
            self.consume(TokenType::RParen, ")");
        } else if let Some(spec) = self.value_spec() {
            specs.push(spec);
        }
        let span = start.merge(self.previous().span);
        Some(ValueDecl {
            doc,
            directives,
            specs,
            span,
        })
    }

    fn value_spec(&mut self) -> Option<ValueSpec> {
        let doc = self.doc_before(self.current().span.line);
        let start = self.current().span;
        let mut names = vec![self.expect_ident()];
        while self.match_token(TokenType::Comma) {
            names.push(self.expect_ident());
        }
        let ty = if !self.check(TokenType::Eq)
            && !self.check(TokenType::Semicolon)
            && !self.check(TokenType::RParen)
            && !self.check(TokenType::Eof)
        {
            self.parse_type()
        } else {
            None
        };
        let mut values = Vec::new();
        if self.match_token(TokenType::Eq) {
            values.push(self.parse_expr()?);
            while self.match_token(TokenType::Comma) {
                values.push(self.parse_expr()?);
            }
        }
        let span = start.merge(self.previous().span);
        Some(ValueSpec {
            doc,
            names,
            ty,
            values,
            span,
        })
    }

    /// Try to parse a type parameter list `[T any, U Constraint]`.
    /// Returns `None` (without reporting) when the bracket content does
    /// not look like parameters, so callers can backtrack.
    pub(crate) fn try_type_params(&mut self) -> Option<Vec<TypeParamDecl>> {
        if !self.match_token(TokenType::LBracket) {
            return None;
        }
        let mut params = Vec::new();
        while !self.check(TokenType::RBracket) && !self.check(TokenType::Eof) {
            let start = self.current().span;
            if !self.check(TokenType::Ident) {
                return None;
            }
            let mut names = vec![self.expect_ident()];
            while self.match_token(TokenType::Comma) {
                if !self.check(TokenType::Ident) {
                    return None;
                }
                names.push(self.expect_ident());
            }
            if !self.starts_type() {
                return None;
            }
            let constraint = self.parse_constraint()?;
            let span = start.merge(constraint.span);
            params.push(TypeParamDecl {
                names,
                constraint,
                span,
            });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        if !self.match_token(TokenType::RBracket) {
            return None;
        }
        if params.is_empty() {
            return None;
        }
        Some(params)
    }

    /// Constraint element: a type, `~T`, or a union `A | B`.
    fn parse_constraint(&mut self) -> Option<TypeExpr> {
        let first = self.constraint_term()?;
        // Unions collapse to their first element; constraint interfaces
        // never participate in satisfaction.
        while self.match_token(TokenType::Pipe) {
            self.constraint_term()?;
        }
        Some(first)
    }

    fn constraint_term(&mut self) -> Option<TypeExpr> {
        if self.match_token(TokenType::Tilde) {
            let inner = self.parse_type()?;
            let span = inner.span;
            return Some(self.type_expr(TypeExprKind::Approx(Box::new(inner)), span));
        }
        self.parse_type()
    }

    // --- token plumbing -------------------------------------------------

    pub(crate) fn node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub(crate) fn type_expr(&mut self, kind: TypeExprKind, span: Span) -> TypeExpr {
        TypeExpr {
            id: self.node_id(),
            kind,
            span,
        }
    }

    pub(crate) fn expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        Expr {
            id: self.node_id(),
            kind,
            span,
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    pub(crate) fn advance_token(&mut self) -> Token {
        let tok = self.current().clone();
        self.advance();
        tok
    }

    pub(crate) fn check(&self, ty: TokenType) -> bool {
        self.current().ty == ty
    }

    pub(crate) fn match_token(&mut self, ty: TokenType) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn consume(&mut self, ty: TokenType, expected: &str) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            self.error_here(ParseErrorKind::ExpectedToken {
                expected: expected.into(),
                found: self.current().ty.as_str().into(),
            });
            false
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Ident {
        if self.check(TokenType::Ident) {
            let tok = self.advance_token();
            Ident::new(tok.lexeme, tok.span)
        } else {
            self.error_here(ParseErrorKind::ExpectedIdentifier {
                found: self.current().ty.as_str().into(),
            });
            Ident::new("", self.current().span)
        }
    }

    pub(crate) fn skip_semis(&mut self) {
        while self.check(TokenType::Semicolon) {
            self.advance();
        }
    }

    /// Consume a statement/spec separator. A closing token or EOF counts
    /// as an implicit separator.
    pub(crate) fn expect_semi(&mut self) {
        if self.match_token(TokenType::Semicolon) {
            self.skip_semis();
            return;
        }
        if self.check(TokenType::RParen)
            || self.check(TokenType::RBrace)
            || self.check(TokenType::Eof)
        {
            return;
        }
        self.error_here(ParseErrorKind::ExpectedToken {
            expected: ";".into(),
            found: self.current().ty.as_str().into(),
        });
    }

    /// Skip forward to the next statement boundary after an error.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0i32;
        while !self.check(TokenType::Eof) {
            match self.current().ty {
                TokenType::Semicolon if depth <= 0 => {
                    self.advance();
                    return;
                }
                TokenType::LBrace | TokenType::LParen | TokenType::LBracket => depth += 1,
                TokenType::RBrace | TokenType::RParen | TokenType::RBracket => {
                    if depth <= 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Recover after an error: skip to a statement boundary, always
    /// making progress unless already at EOF or a stop token.
    pub(crate) fn recover_until(&mut self, stops: &[TokenType]) {
        let before = self.pos;
        self.synchronize();
        if self.pos == before
            && !self.check(TokenType::Eof)
            && !stops.iter().any(|&t| self.check(t))
        {
            self.advance();
        }
    }

    pub(crate) fn save(&self) -> (usize, usize, u32) {
        (self.pos, self.errors.len(), self.next_node)
    }

    pub(crate) fn restore(&mut self, save: (usize, usize, u32)) {
        self.pos = save.0;
        self.errors.truncate(save.1);
        self.next_node = save.2;
    }

    pub(crate) fn error_here(&mut self, kind: ParseErrorKind) {
        let span = self.current().span;
        self.errors.push(ParseError::new(kind, span));
    }

    /// The contiguous comment group ending on the line above `line`,
    /// rendered as doc text. Directive lines (`go:...`) are excluded.
    pub(crate) fn doc_before(&self, line: u32) -> String {
        let group = self.comment_group_before(line);
        let mut lines = Vec::new();
        for comment in group {
            for text_line in comment.text.lines() {
                let trimmed = text_line.strip_prefix(' ').unwrap_or(text_line);
                if trimmed.starts_with("go:") {
                    continue;
                }
                lines.push(trimmed.trim_end().to_string());
            }
            if comment.text.is_empty() {
                lines.push(String::new());
            }
        }
        lines.join("\n").trim().to_string()
    }

    /// Raw directive lines (`go:embed ...` and friends) from the comment
    /// group ending on the line above `line`.
    pub(crate) fn directives_before(&self, line: u32) -> Vec<String> {
        self.comment_group_before(line)
            .iter()
            .flat_map(|c| c.text.lines())
            .map(|l| l.trim())
            .filter(|l| l.starts_with("go:"))
            .map(|l| l.to_string())
            .collect()
    }

    fn comment_group_before(&self, line: u32) -> &[Comment] {
        if line < 2 {
            return &[];
        }
        let mut end = self.comments.len();
        while end > 0 && self.comments[end - 1].line >= line {
            end -= 1;
        }
        if end == 0 || self.comments[end - 1].end_line != line - 1 {
            return &[];
        }
        let mut start = end - 1;
        while start > 0 && self.comments[start - 1].end_line == self.comments[start].line - 1 {
            start -= 1;
        }
        &self.comments[start..end]
    }
}

/// Decode a string literal's lexeme to its value. Escapes beyond the
/// simple ones pass through unchanged; import paths never use them.
pub(crate) fn string_value(lexeme: &str) -> String {
    let inner = lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| lexeme.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(lexeme);
    if !inner.contains('\\') {
        return inner.to_string();
    }
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (File, Vec<ParseError>) {
        Parser::parse_file(source, "/tmp/test.go")
    }

    #[test]
    fn parses_package_and_imports() {
        let (file, errors) = parse(
            "package demo\n\nimport (\n\t\"fmt\"\n\tio2 \"io\"\n)\n\nimport \"strings\"\n",
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(file.package.name, "demo");
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[0].path, "fmt");
        assert_eq!(file.imports[1].alias.as_ref().unwrap().name, "io2");
        assert_eq!(file.imports[1].path, "io");
        assert_eq!(file.imports[2].path, "strings");
    }

    #[test]
    fn parses_grouped_type_decl() {
        let (file, errors) = parse(
            "package demo\n\ntype (\n\tA int\n\tB struct{ X int }\n)\n",
        );
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Type(decl) = &file.decls[0] else {
            panic!("expected type decl");
        };
        assert_eq!(decl.specs.len(), 2);
        assert_eq!(decl.specs[0].name.name, "A");
        assert_eq!(decl.specs[1].name.name, "B");
    }

    #[test]
    fn doc_comment_attaches_to_type() {
        let (file, _) = parse(
            "package demo\n\n// Reader reads bytes.\n// Second line.\ntype Reader interface{}\n",
        );
        let Decl::Type(decl) = &file.decls[0] else {
            panic!("expected type decl");
        };
        assert_eq!(decl.specs[0].doc, "Reader reads bytes.\nSecond line.");
    }

    #[test]
    fn blank_line_breaks_doc_attachment() {
        let (file, _) = parse(
            "package demo\n\n// Unrelated comment.\n\ntype T struct{}\n",
        );
        let Decl::Type(decl) = &file.decls[0] else {
            panic!("expected type decl");
        };
        assert_eq!(decl.specs[0].doc, "");
    }

    #[test]
    fn parses_method_receiver_forms() {
        let (file, errors) = parse(
            "package demo\n\nfunc (c Cfg) Load() {}\n\nfunc (p *Pool) Close() error { return nil }\n",
        );
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Func(value_method) = &file.decls[0] else {
            panic!("expected func");
        };
        let recv = value_method.recv.as_ref().unwrap();
        assert!(!recv.is_pointer);
        assert_eq!(recv.base.name, "Cfg");
        let Decl::Func(ptr_method) = &file.decls[1] else {
            panic!("expected func");
        };
        assert!(ptr_method.recv.as_ref().unwrap().is_pointer);
        assert_eq!(ptr_method.recv.as_ref().unwrap().base.name, "Pool");
    }

    #[test]
    fn generic_func_vs_array_type() {
        let (file, errors) = parse(
            "package demo\n\ntype Arr [4]int\n\nfunc Map[T any](xs []T) []T { return xs }\n",
        );
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Type(decl) = &file.decls[0] else {
            panic!("expected type decl");
        };
        assert!(matches!(decl.specs[0].ty.kind, TypeExprKind::Array(..)));
        let Decl::Func(func) = &file.decls[1] else {
            panic!("expected func");
        };
        assert_eq!(func.type_params.len(), 1);
        assert_eq!(func.type_params[0].names[0].name, "T");
    }

    #[test]
    fn var_with_embed_directive() {
        let (file, _) = parse(
            "package demo\n\n//go:embed static/*\nvar content string\n",
        );
        let Decl::Var(decl) = &file.decls[0] else {
            panic!("expected var decl");
        };
        // Directives never leak into doc text.
        assert_eq!(decl.doc, "");
        assert_eq!(decl.specs[0].names[0].name, "content");
    }

    #[test]
    fn recovers_after_bad_decl() {
        let (file, errors) = parse(
            "package demo\n\n???\n\ntype Good struct{}\n",
        );
        assert!(!errors.is_empty());
        assert!(file
            .decls
            .iter()
            .any(|d| matches!(d, Decl::Type(t) if t.specs[0].name.name == "Good")));
    }
}
