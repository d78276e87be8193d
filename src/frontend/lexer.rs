// src/frontend/lexer.rs
//! Lexer for Go source, including the automatic semicolon insertion rule
//! and comment capture for doc-comment attachment.

use crate::errors::parse::{ParseError, ParseErrorKind};
use crate::frontend::{Comment, Span, Token, TokenType};

pub struct Lexer<'src> {
    source: &'src str,
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    start: usize,
    current: usize,
    line: u32,
    column: u32,
    start_line: u32,
    start_column: u32,
    /// Type of the last emitted significant token, for semicolon insertion.
    prev: Option<TokenType>,
    /// Line of the last emitted significant token, for trailing-comment
    /// detection.
    last_tok_line: u32,
    comments: Vec<Comment>,
    errors: Vec<ParseError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            start: 0,
            current: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            prev: None,
            last_tok_line: 0,
            comments: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Take all collected comments, leaving the internal list empty.
    pub fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    /// Take all collected errors, leaving the internal list empty.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    pub fn next_token(&mut self) -> Token {
        if !self.skip_whitespace_and_comments() {
            // A newline (or line-ending comment) triggered insertion.
            let span = Span::new(self.current, self.current, self.line, self.column);
            self.prev = Some(TokenType::Semicolon);
            return Token::new(TokenType::Semicolon, "\n", span);
        }

        self.start = self.current;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some(c) = self.advance() else {
            if self.prev.map(TokenType::ends_statement).unwrap_or(false)
                && self.prev != Some(TokenType::Semicolon)
            {
                self.prev = Some(TokenType::Semicolon);
                let span = Span::new(self.current, self.current, self.line, self.column);
                return Token::new(TokenType::Semicolon, "\n", span);
            }
            return self.make_token(TokenType::Eof);
        };

        match c {
            '(' => self.make_token(TokenType::LParen),
            ')' => self.make_token(TokenType::RParen),
            '[' => self.make_token(TokenType::LBracket),
            ']' => self.make_token(TokenType::RBracket),
            '{' => self.make_token(TokenType::LBrace),
            '}' => self.make_token(TokenType::RBrace),
            ',' => self.make_token(TokenType::Comma),
            ';' => self.make_token(TokenType::Semicolon),
            '~' => self.make_token(TokenType::Tilde),
            ':' => {
                if self.match_char('=') {
                    self.make_token(TokenType::ColonEq)
                } else {
                    self.make_token(TokenType::Colon)
                }
            }
            '.' => {
                if self.peek_char() == Some('.') && self.peek_second() == Some('.') {
                    self.advance();
                    self.advance();
                    self.make_token(TokenType::Ellipsis)
                } else if self.peek_char().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    self.number(c)
                } else {
                    self.make_token(TokenType::Dot)
                }
            }
            '+' => {
                if self.match_char('+') {
                    self.make_token(TokenType::PlusPlus)
                } else if self.match_char('=') {
                    self.make_token(TokenType::PlusEq)
                } else {
                    self.make_token(TokenType::Plus)
                }
            }
            '-' => {
                if self.match_char('-') {
                    self.make_token(TokenType::MinusMinus)
                } else if self.match_char('=') {
                    self.make_token(TokenType::MinusEq)
                } else {
                    self.make_token(TokenType::Minus)
                }
            }
            '*' => {
                if self.match_char('=') {
                    self.make_token(TokenType::StarEq)
                } else {
                    self.make_token(TokenType::Star)
                }
            }
            '/' => {
                if self.match_char('=') {
                    self.make_token(TokenType::SlashEq)
                } else {
                    self.make_token(TokenType::Slash)
                }
            }
            '%' => {
                if self.match_char('=') {
                    self.make_token(TokenType::PercentEq)
                } else {
                    self.make_token(TokenType::Percent)
                }
            }
            '^' => {
                if self.match_char('=') {
                    self.make_token(TokenType::CaretEq)
                } else {
                    self.make_token(TokenType::Caret)
                }
            }
            '&' => {
                if self.match_char('&') {
                    self.make_token(TokenType::AmpAmp)
                } else if self.match_char('^') {
                    if self.match_char('=') {
                        self.make_token(TokenType::AmpCaretEq)
                    } else {
                        self.make_token(TokenType::AmpCaret)
                    }
                } else if self.match_char('=') {
                    self.make_token(TokenType::AmpEq)
                } else {
                    self.make_token(TokenType::Amp)
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.make_token(TokenType::PipePipe)
                } else if self.match_char('=') {
                    self.make_token(TokenType::PipeEq)
                } else {
                    self.make_token(TokenType::Pipe)
                }
            }
            '=' => {
                if self.match_char('=') {
                    self.make_token(TokenType::EqEq)
                } else {
                    self.make_token(TokenType::Eq)
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.make_token(TokenType::BangEq)
                } else {
                    self.make_token(TokenType::Bang)
                }
            }
            '<' => {
                if self.match_char('-') {
                    self.make_token(TokenType::Arrow)
                } else if self.match_char('<') {
                    if self.match_char('=') {
                        self.make_token(TokenType::ShlEq)
                    } else {
                        self.make_token(TokenType::Shl)
                    }
                } else if self.match_char('=') {
                    self.make_token(TokenType::LtEq)
                } else {
                    self.make_token(TokenType::Lt)
                }
            }
            '>' => {
                if self.match_char('>') {
                    if self.match_char('=') {
                        self.make_token(TokenType::ShrEq)
                    } else {
                        self.make_token(TokenType::Shr)
                    }
                } else if self.match_char('=') {
                    self.make_token(TokenType::GtEq)
                } else {
                    self.make_token(TokenType::Gt)
                }
            }
            '"' => self.interpreted_string(),
            '`' => self.raw_string(),
            '\'' => self.rune(),
            c if c.is_ascii_digit() => self.number(c),
            c if is_ident_start(c) => self.identifier(),
            c => {
                self.errors.push(ParseError::new(
                    ParseErrorKind::InvalidCharacter { ch: c },
                    self.token_span(),
                ));
                // Skip the character and try again.
                self.next_token()
            }
        }
    }

    /// Skip whitespace and comments. Returns `false` when a newline that
    /// requires semicolon insertion was crossed.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        loop {
            match self.peek_char() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('\n') => {
                    if self.prev.map(TokenType::ends_statement).unwrap_or(false) {
                        return false;
                    }
                    self.advance();
                }
                Some('/') => match self.peek_second() {
                    Some('/') => {
                        self.start = self.current;
                        self.start_line = self.line;
                        self.advance();
                        self.advance();
                        let text_start = self.current;
                        while let Some(c) = self.peek_char() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                        self.comments.push(Comment {
                            text: self.source[text_start..self.current].to_string(),
                            line: self.start_line,
                            end_line: self.line,
                            trailing: self.start_line == self.last_tok_line,
                        });
                        // The newline after the comment still participates
                        // in semicolon insertion.
                    }
                    Some('*') => {
                        self.start = self.current;
                        self.start_line = self.line;
                        self.advance();
                        self.advance();
                        let text_start = self.current;
                        let mut text_end = self.current;
                        let mut closed = false;
                        while let Some(c) = self.advance() {
                            if c == '*' && self.peek_char() == Some('/') {
                                text_end = self.current - 1;
                                self.advance();
                                closed = true;
                                break;
                            }
                        }
                        if !closed {
                            self.errors.push(ParseError::new(
                                ParseErrorKind::Unterminated { what: "comment" },
                                self.token_span(),
                            ));
                            text_end = self.current;
                        }
                        let end_line = self.line;
                        self.comments.push(Comment {
                            text: self.source[text_start..text_end].to_string(),
                            line: self.start_line,
                            end_line,
                            trailing: self.start_line == self.last_tok_line,
                        });
                        // A multi-line block comment acts like a newline.
                        if end_line > self.start_line
                            && self.prev.map(TokenType::ends_statement).unwrap_or(false)
                        {
                            return false;
                        }
                    }
                    _ => return true,
                },
                _ => return true,
            }
        }
    }

    fn identifier(&mut self) -> Token {
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let lexeme = &self.source[self.start..self.current];
        let ty = TokenType::keyword(lexeme).unwrap_or(TokenType::Ident);
        self.make_token(ty)
    }

    fn number(&mut self, first: char) -> Token {
        let mut is_float = first == '.';
        if first == '0'
            && matches!(
                self.peek_char(),
                Some('x') | Some('X') | Some('o') | Some('O') | Some('b') | Some('B')
            )
        {
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_hexdigit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
            return self.make_token(TokenType::IntLit);
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        if !is_float && self.peek_char() == Some('.') {
            // Don't swallow "1..." in a range-like context; Go has no such
            // token but `x[1..]` is invalid anyway. A dot followed by a
            // digit or exponent continues the number.
            if self
                .peek_second()
                .map(|c| c.is_ascii_digit() || c == 'e' || c == 'E')
                .unwrap_or(true)
            {
                is_float = true;
                self.advance();
                while let Some(c) = self.peek_char() {
                    if c.is_ascii_digit() || c == '_' {
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.advance();
            }
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() || c == '_' {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if self.peek_char() == Some('i') {
            self.advance();
            return self.make_token(TokenType::ImagLit);
        }
        if is_float {
            self.make_token(TokenType::FloatLit)
        } else {
            self.make_token(TokenType::IntLit)
        }
    }

    fn interpreted_string(&mut self) -> Token {
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    self.advance();
                }
                Some('\n') | None => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::Unterminated { what: "string literal" },
                        self.token_span(),
                    ));
                    break;
                }
                Some(_) => {}
            }
        }
        self.make_token(TokenType::StringLit)
    }

    fn raw_string(&mut self) -> Token {
        loop {
            match self.advance() {
                Some('`') => break,
                None => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::Unterminated { what: "raw string literal" },
                        self.token_span(),
                    ));
                    break;
                }
                Some(_) => {}
            }
        }
        self.make_token(TokenType::StringLit)
    }

    fn rune(&mut self) -> Token {
        loop {
            match self.advance() {
                Some('\'') => break,
                Some('\\') => {
                    self.advance();
                }
                Some('\n') | None => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::Unterminated { what: "rune literal" },
                        self.token_span(),
                    ));
                    break;
                }
                Some(_) => {}
            }
        }
        self.make_token(TokenType::RuneLit)
    }

    fn make_token(&mut self, ty: TokenType) -> Token {
        self.prev = Some(ty);
        self.last_tok_line = self.line;
        Token::new(ty, &self.source[self.start..self.current], self.token_span())
    }

    fn token_span(&self) -> Span {
        Span::new(self.start, self.current, self.start_line, self.start_column)
    }

    fn advance(&mut self) -> Option<char> {
        let (idx, c) = self.chars.next()?;
        self.current = idx + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, c)| c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_types(source: &str) -> Vec<TokenType> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.ty == TokenType::Eof;
            out.push(tok.ty);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_package_clause() {
        use TokenType::*;
        assert_eq!(
            token_types("package demo\n"),
            vec![KwPackage, Ident, Semicolon, Eof]
        );
    }

    #[test]
    fn inserts_semicolon_after_rbrace() {
        use TokenType::*;
        let tys = token_types("type T interface{}\n");
        assert_eq!(tys, vec![KwType, Ident, KwInterface, LBrace, RBrace, Semicolon, Eof]);
    }

    #[test]
    fn no_semicolon_after_binary_operator() {
        use TokenType::*;
        let tys = token_types("x = a +\nb\n");
        assert_eq!(tys, vec![Ident, Eq, Ident, Plus, Ident, Semicolon, Eof]);
    }

    #[test]
    fn lexes_channel_arrows() {
        use TokenType::*;
        assert_eq!(
            token_types("ch <- <-in"),
            vec![Ident, Arrow, Arrow, Ident, Semicolon, Eof]
        );
    }

    #[test]
    fn collects_line_comments() {
        let mut lexer = Lexer::new("// Reader reads.\ntype Reader interface{}\n");
        while lexer.next_token().ty != TokenType::Eof {}
        let comments = lexer.take_comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, " Reader reads.");
        assert_eq!(comments[0].line, 1);
    }

    #[test]
    fn raw_strings_span_lines() {
        let mut lexer = Lexer::new("x := `a\nb`\n");
        let mut strings = 0;
        loop {
            let tok = lexer.next_token();
            if tok.ty == TokenType::StringLit {
                strings += 1;
                assert!(tok.lexeme.contains('\n'));
            }
            if tok.ty == TokenType::Eof {
                break;
            }
        }
        assert_eq!(strings, 1);
    }

    #[test]
    fn numeric_literal_forms() {
        use TokenType::*;
        assert_eq!(token_types("0x1F")[0], IntLit);
        assert_eq!(token_types("1_000")[0], IntLit);
        assert_eq!(token_types("3.14")[0], FloatLit);
        assert_eq!(token_types("1e9")[0], FloatLit);
        assert_eq!(token_types("2i")[0], ImagLit);
    }

    #[test]
    fn ellipsis_and_dots() {
        use TokenType::*;
        assert_eq!(
            token_types("f(xs...)"),
            vec![Ident, LParen, Ident, Ellipsis, RParen, Semicolon, Eof]
        );
    }
}
