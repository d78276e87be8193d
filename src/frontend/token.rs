// src/frontend/token.rs

/// All token types in the Go subject language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Literals
    Ident,
    IntLit,
    FloatLit,
    ImagLit,
    RuneLit,
    StringLit,

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators and delimiters
    Plus,        // +
    Minus,       // -
    Star,        // *
    Slash,       // /
    Percent,     // %
    Amp,         // &
    Pipe,        // |
    Caret,       // ^
    Shl,         // <<
    Shr,         // >>
    AmpCaret,    // &^
    PlusEq,      // +=
    MinusEq,     // -=
    StarEq,      // *=
    SlashEq,     // /=
    PercentEq,   // %=
    AmpEq,       // &=
    PipeEq,      // |=
    CaretEq,     // ^=
    ShlEq,       // <<=
    ShrEq,       // >>=
    AmpCaretEq,  // &^=
    AmpAmp,      // &&
    PipePipe,    // ||
    Arrow,       // <-
    PlusPlus,    // ++
    MinusMinus,  // --
    EqEq,        // ==
    Lt,          // <
    Gt,          // >
    Eq,          // =
    Bang,        // !
    Tilde,       // ~
    BangEq,      // !=
    LtEq,        // <=
    GtEq,        // >=
    ColonEq,     // :=
    Ellipsis,    // ...
    LParen,      // (
    LBracket,    // [
    LBrace,      // {
    Comma,       // ,
    Dot,         // .
    RParen,      // )
    RBracket,    // ]
    RBrace,      // }
    Semicolon,   // ; (explicit or inserted)
    Colon,       // :

    Eof,
}

impl TokenType {
    /// Human-readable name for diagnostics.
    pub fn as_str(self) -> &'static str {
        use TokenType::*;
        match self {
            Ident => "identifier",
            IntLit => "integer literal",
            FloatLit => "float literal",
            ImagLit => "imaginary literal",
            RuneLit => "rune literal",
            StringLit => "string literal",
            KwBreak => "break",
            KwCase => "case",
            KwChan => "chan",
            KwConst => "const",
            KwContinue => "continue",
            KwDefault => "default",
            KwDefer => "defer",
            KwElse => "else",
            KwFallthrough => "fallthrough",
            KwFor => "for",
            KwFunc => "func",
            KwGo => "go",
            KwGoto => "goto",
            KwIf => "if",
            KwImport => "import",
            KwInterface => "interface",
            KwMap => "map",
            KwPackage => "package",
            KwRange => "range",
            KwReturn => "return",
            KwSelect => "select",
            KwStruct => "struct",
            KwSwitch => "switch",
            KwType => "type",
            KwVar => "var",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Amp => "&",
            Pipe => "|",
            Caret => "^",
            Shl => "<<",
            Shr => ">>",
            AmpCaret => "&^",
            PlusEq => "+=",
            MinusEq => "-=",
            StarEq => "*=",
            SlashEq => "/=",
            PercentEq => "%=",
            AmpEq => "&=",
            PipeEq => "|=",
            CaretEq => "^=",
            ShlEq => "<<=",
            ShrEq => ">>=",
            AmpCaretEq => "&^=",
            AmpAmp => "&&",
            PipePipe => "||",
            Arrow => "<-",
            PlusPlus => "++",
            MinusMinus => "--",
            EqEq => "==",
            Lt => "<",
            Gt => ">",
            Eq => "=",
            Bang => "!",
            Tilde => "~",
            BangEq => "!=",
            LtEq => "<=",
            GtEq => ">=",
            ColonEq => ":=",
            Ellipsis => "...",
            LParen => "(",
            LBracket => "[",
            LBrace => "{",
            Comma => ",",
            Dot => ".",
            RParen => ")",
            RBracket => "]",
            RBrace => "}",
            Semicolon => ";",
            Colon => ":",
            Eof => "end of file",
        }
    }

    /// Whether a newline after this token triggers automatic semicolon
    /// insertion, per the Go scanning rules.
    pub fn ends_statement(self) -> bool {
        use TokenType::*;
        matches!(
            self,
            Ident
                | IntLit
                | FloatLit
                | ImagLit
                | RuneLit
                | StringLit
                | KwBreak
                | KwContinue
                | KwFallthrough
                | KwReturn
                | PlusPlus
                | MinusMinus
                | RParen
                | RBracket
                | RBrace
        )
    }

    pub fn keyword(ident: &str) -> Option<TokenType> {
        use TokenType::*;
        Some(match ident {
            "break" => KwBreak,
            "case" => KwCase,
            "chan" => KwChan,
            "const" => KwConst,
            "continue" => KwContinue,
            "default" => KwDefault,
            "defer" => KwDefer,
            "else" => KwElse,
            "fallthrough" => KwFallthrough,
            "for" => KwFor,
            "func" => KwFunc,
            "go" => KwGo,
            "goto" => KwGoto,
            "if" => KwIf,
            "import" => KwImport,
            "interface" => KwInterface,
            "map" => KwMap,
            "package" => KwPackage,
            "range" => KwRange,
            "return" => KwReturn,
            "select" => KwSelect,
            "struct" => KwStruct,
            "switch" => KwSwitch,
            "type" => KwType,
            "var" => KwVar,
            _ => return None,
        })
    }
}

/// Source span of a token or syntax node. Byte offsets index the file's
/// source text; line and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Merge two spans, keeping the start position of `self`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub ty: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(ty: TokenType, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            ty,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// A comment, retained for doc-comment attachment. `text` excludes the
/// comment markers; directives such as `//go:embed` keep their full text.
/// A trailing comment shares its line with preceding code and never
/// becomes documentation.
#[derive(Debug, Clone)]
pub struct Comment {
    pub text: String,
    pub line: u32,
    pub end_line: u32,
    pub trailing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_lookup() {
        assert_eq!(TokenType::keyword("func"), Some(TokenType::KwFunc));
        assert_eq!(TokenType::keyword("interface"), Some(TokenType::KwInterface));
        assert_eq!(TokenType::keyword("funk"), None);
    }

    #[test]
    fn statement_enders() {
        assert!(TokenType::Ident.ends_statement());
        assert!(TokenType::RParen.ends_statement());
        assert!(TokenType::KwReturn.ends_statement());
        assert!(!TokenType::Comma.ends_statement());
        assert!(!TokenType::KwFunc.ends_statement());
    }

    #[test]
    fn span_merge_extends_end() {
        let a = Span::new(0, 4, 1, 1);
        let b = Span::new(10, 14, 2, 3);
        let merged = a.merge(b);
        assert_eq!(merged.start, 0);
        assert_eq!(merged.end, 14);
        assert_eq!(merged.line, 1);
    }
}
